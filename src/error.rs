use thiserror::Error;

use crate::fastalert::ApiError;

#[derive(Error, Debug)]
pub enum McpError {
    /// Upstream failures render with the normalized message only
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

pub type McpResult<T> = std::result::Result<T, McpError>;
