//! Data models for the file vault client
//!
//! Snapshots of backend-owned records plus the client-side filter state.
//! Each sub-module represents a specific feature area.

mod admin;
mod envelope;
mod file;
mod filter;
mod stats;
mod user;

// Re-export all models for convenient imports
pub use admin::*;
pub use envelope::*;
pub use file::*;
pub use filter::*;
pub use stats::*;
pub use user::*;
