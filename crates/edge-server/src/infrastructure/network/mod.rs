//! Network infrastructure for the server.
//!
//! # Sub-modules
//!
//! - **`server`** – Accepts control connections and spawns one supervisor
//!   task per connection.
//!
//! - **`supervisor`** – Owns one connection end-to-end: login, the command
//!   loop, socket close, the post-close lockout hold, and device-log cleanup.

pub mod server;
pub mod supervisor;
