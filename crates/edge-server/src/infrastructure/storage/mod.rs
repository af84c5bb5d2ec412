//! Storage infrastructure.
//!
//! - **`config`** – Optional TOML settings file with serde defaults.
//! - **`credentials`** – The flat `credentials.txt` lookup.
//! - **`datafiles`** – Per-user datafile directories.
//! - **`logs`** – The device, upload, and deletion logs, one lock per file.

pub mod config;
pub mod credentials;
pub mod datafiles;
pub mod logs;
