use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Runtime settings for one client process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host name or address of the server.
    pub server_host: String,
    /// TCP port of the server's control channel.
    pub server_port: u16,
    /// Local UDP port for direct transfers.  `0` picks a free port.
    pub udp_port: u16,
    /// Where datafiles are generated and received files are written.
    pub work_dir: PathBuf,
}

impl ClientConfig {
    /// The local address the datagram endpoint binds to.
    pub fn udp_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.udp_port)
    }

    /// `host:port` of the server, for connecting and for messages.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
