//! Infrastructure layer for the server.
//!
//! Contains the OS-facing adapters: the TCP accept loop and per-connection
//! supervisor, and file-system storage for credentials, logs, datafiles,
//! and configuration.

pub mod network;
pub mod storage;
