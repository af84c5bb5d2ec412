//! edge-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does edge-client do? (for beginners)
//!
//! The client is an *edge device*: a small program that logs in to the
//! Edge Link server, keeps datafiles of integers in its working directory,
//! and asks the server to store them and compute over them.  It can also
//! send any local file straight to another logged-in device over UDP
//! without going through the server.
//!
//! The client application:
//!
//! 1. Binds its UDP endpoint and starts the standing receiver task.
//! 2. Connects to the server over TCP and answers the login prompts.
//! 3. Reads commands from the console, validates them locally, and turns
//!    the valid ones into requests on the control channel.
//! 4. For `UVF`, looks the peer up in the active-device listing and streams
//!    the file to it frame by frame.

/// Application layer: command parsing, login, and command execution.
pub mod application;

/// Errors that end the client session.
pub mod error;

/// Infrastructure layer: console, control connection, and datagram transfer.
pub mod infrastructure;

pub use error::ClientError;
