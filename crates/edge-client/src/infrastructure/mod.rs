//! Infrastructure layer for the client application.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `edge_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`config`** – Runtime settings assembled from the command line.
//! - **`console`** – [`Console`](crate::application::console::Console) on
//!   stdin/stdout.
//! - **`network`** – Opens the TCP control channel to the server.
//! - **`transfer`** – The UDP endpoint: the standing receiver task and the
//!   stop-and-wait sender.

pub mod config;
pub mod console;
pub mod network;
pub mod transfer;
