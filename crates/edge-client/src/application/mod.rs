//! Application layer use cases for the client application.
//!
//! # What use cases does the client have?
//!
//! - **`commands`** – Turns a console line into a [`commands::UserCommand`]
//!   or a usage error.  Nothing invalid ever reaches the server.
//!
//! - **`login`** – Answers the server's username/password prompts and
//!   reports the UDP port once the server accepts.
//!
//! - **`executor`** – Runs each command: local datafile generation, the
//!   request/reply round trip for server commands, and peer lookup before a
//!   direct transfer.  Transfers themselves go through the
//!   [`executor::FileSender`] port, implemented by the infrastructure layer.
//!
//! - **`generate`**, **`peers`** – Small pure helpers used by the executor.
//!
//! - **`console`** – The [`console::Console`] port for user interaction.

pub mod commands;
pub mod console;
pub mod executor;
pub mod generate;
pub mod login;
pub mod peers;
