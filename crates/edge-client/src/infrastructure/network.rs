//! Control-channel connection to the server.

use edge_core::MessageStream;
use tokio::net::TcpStream;
use tracing::info;

use crate::error::ClientError;
use crate::infrastructure::config::ClientConfig;

/// Connects to the server named in `config`.
///
/// # Errors
///
/// Returns [`ClientError::Connect`] if the host cannot be resolved or the
/// connection is refused.
pub async fn connect(config: &ClientConfig) -> Result<MessageStream<TcpStream>, ClientError> {
    let addr = config.server_addr();
    let stream = TcpStream::connect((config.server_host.as_str(), config.server_port))
        .await
        .map_err(|source| ClientError::Connect {
            addr: addr.clone(),
            source,
        })?;
    stream.set_nodelay(true).ok();
    info!("control channel connected to {addr}");
    Ok(MessageStream::new(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::net::TcpListener;

    fn config(port: u16) -> ClientConfig {
        ClientConfig {
            server_host: "127.0.0.1".to_string(),
            server_port: port,
            udp_port: 0,
            work_dir: PathBuf::from("."),
        }
    }

    #[tokio::test]
    async fn test_connect_to_listening_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let channel = connect(&config(port)).await.unwrap();
        let (_, peer) = listener.accept().await.unwrap();

        assert_eq!(channel.get_ref().local_addr().unwrap(), peer);
    }

    #[tokio::test]
    async fn test_connect_refused_names_the_address() {
        // Bind then drop to find a port nobody is listening on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = connect(&config(port)).await.unwrap_err();
        assert!(matches!(err, ClientError::Connect { .. }));
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    }
}
