pub mod config;
pub mod error;
pub mod fastalert;
pub mod mcp;
pub mod tools;
pub mod utils;

pub use config::Config;
pub use error::{McpError, McpResult};
pub use fastalert::{ApiError, FastalertClient};
