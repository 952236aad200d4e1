//! S3 mini test suite
//!
//! A small harness that runs self-registered test units against an
//! S3-compatible object storage endpoint, once per configured scenario, and
//! reduces the outcomes to a verdict and exit code.

pub mod cli;
pub mod commands;
pub mod common;
pub mod connector;
pub mod testing;
pub mod units;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use connector::{Connector, MemoryConnector};
pub use testing::{Reporter, ScenarioFile, Tally, Verdict};
