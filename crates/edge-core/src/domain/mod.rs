//! Domain layer: pure business rules shared by server and client.
//!
//! # Sub-modules
//!
//! - **`datafile`** – Positive file identifiers and the
//!   `{username}-{fileID}.txt` naming rule.
//! - **`compute`** – The four server-side reductions (SUM, MIN, MAX, AVERAGE).
//! - **`device`** – One row of the active-device registry, rendered by the
//!   server for `AED` and parsed back by the client for peer discovery.

pub mod compute;
pub mod datafile;
pub mod device;
