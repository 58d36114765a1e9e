//! This crate contains the logging setup shared by the checkout binaries and
//! test suites. Domain crates only emit `tracing` events; installing the
//! subscriber that formats and filters them happens here.
pub mod config;
pub mod tracing;

pub use config::Config;
