//! Common utilities shared by the runner, the connector and the test units

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::{ConfigOverrides, ResolvedConfiguration};
pub use error::{Error, Result};
