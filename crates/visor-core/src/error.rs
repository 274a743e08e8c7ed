//! Error types for Visor Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Engine configuration errors
    #[error("streaming engine not configured: no engine id was given and none could be auto-selected")]
    EngineNotConfigured,

    #[error("streaming engine not available: {0}")]
    EngineNotAvailable(String),

    #[error("streaming engine not found: {0}")]
    EngineNotFound(String),

    #[error("streaming engine not supported: {0}")]
    EngineNotSupported(String),

    // Stream parameter errors
    #[error("streaming parameters not set: an address is required to build a request URL")]
    MissingAddress,

    // Lifecycle errors
    #[error("player destroyed")]
    Destroyed,

    // Engine runtime errors
    #[error("engine error: {0}")]
    Engine(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    // Internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true for configuration errors, which are raised
    /// synchronously from `setup()`/`play()` and re-raised to the caller
    /// after forcing the error state.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::EngineNotConfigured
                | Error::EngineNotAvailable(_)
                | Error::EngineNotFound(_)
                | Error::EngineNotSupported(_)
                | Error::MissingAddress
                | Error::Destroyed
        )
    }

    /// Returns the error code for host-side logging
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::EngineNotConfigured => "ENGINE_NOT_CONFIGURED",
            Error::EngineNotAvailable(_) => "ENGINE_NOT_AVAILABLE",
            Error::EngineNotFound(_) => "ENGINE_NOT_FOUND",
            Error::EngineNotSupported(_) => "ENGINE_NOT_SUPPORTED",
            Error::MissingAddress => "MISSING_ADDRESS",
            Error::Destroyed => "DESTROYED",
            Error::Engine(_) => "ENGINE",
            Error::Network(_) => "NETWORK",
            Error::Internal(_) => "INTERNAL",
        }
    }
}
