//! Flowdeck CLI library
//!
//! Exposes the command-line surface and configuration loading so the
//! integration tests can drive them without spawning the binary.

pub mod cli;
pub mod config;

pub use crate::config::AppConfig;
