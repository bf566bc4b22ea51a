//! Error types for vsacrate

use thiserror::Error;

/// Main error type for vsacrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Host mesh error: {0}")]
    Host(String),
}

/// Result type alias for vsacrate operations
pub type Result<T> = std::result::Result<T, Error>;
