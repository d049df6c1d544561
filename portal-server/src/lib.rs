//! Incident Portal MCP endpoint service.
//!
//! See [`endpoint`] for the HTTP surface; the binary in `main.rs` wires it
//! to the environment and a listener.

pub mod endpoint;

pub use endpoint::{router, AppState};
