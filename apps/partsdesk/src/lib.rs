//! # PartsDesk Library
//!
//! Exposes the server, CLI and configuration modules for the binary and the
//! integration tests.

pub mod api;
pub mod cli;
pub mod config;

// Re-export partsdesk_core for convenience
pub use partsdesk_core;
