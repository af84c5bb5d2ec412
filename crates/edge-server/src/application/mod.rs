//! Application layer use cases for the server.
//!
//! These modules implement the control-channel protocol against a
//! [`MessageStream`](edge_core::MessageStream) and the shared
//! [`ServerState`](crate::ServerState).  They open no sockets themselves, so
//! every use case runs over an in-memory pipe in tests.
//!
//! # Sub-modules
//!
//! - **`session`** – Per-connection identity and failed-attempt counter,
//!   plus the error type that ends a session.
//!
//! - **`lockout`** – The process-wide registry of temporarily blocked
//!   usernames and the guard that keeps an entry alive while its timer runs.
//!
//! - **`login`** – The username/password challenge, attempt counting, and
//!   the hand-off that registers the device's UDP port.
//!
//! - **`dispatch`** – Routes post-login commands (`UED`, `SCS`, `DTE`,
//!   `AED`, `OUT`) to storage and builds the replies.

pub mod dispatch;
pub mod lockout;
pub mod login;
pub mod session;
