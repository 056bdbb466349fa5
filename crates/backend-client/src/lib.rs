//! Automation backend REST client
//!
//! Thin client over the remote automation API: per-node action execution
//! (`/api/actions/{type}`), server-side flow export, and import analysis.
//! Transport and HTTP failures are classified into the executor's
//! retryable/non-retryable split.

pub mod client;
pub mod config;
pub mod errors;
pub mod types;

pub use client::BackendClient;
pub use config::BackendConfig;
pub use errors::ClientError;
pub use types::{ExportCodeResponse, ImportAnalysis};
