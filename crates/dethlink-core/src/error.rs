//! Error types for the DETH protocol model

use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Protocol and model error types
#[derive(Error, Debug)]
pub enum Error {
    /// Serial number text did not parse or exceeds the 6-hex-digit range
    #[error("invalid serial number: {0}")]
    InvalidSerialNumber(String),

    /// Status line carried an unknown 3-character module type code
    #[error("unknown module type code: {0}")]
    UnknownModuleType(String),

    /// Module type has no model class registered
    #[error("unsupported module type: {0}")]
    UnsupportedModuleType(crate::types::ModuleType),

    /// Status line too short or positionally malformed
    #[error("malformed status line: {0}")]
    MalformedStatus(String),

    /// Unknown 1-character data type code
    #[error("unknown data type code: {0}")]
    UnknownDataType(char),

    /// Action requires a numeric value but none was supplied
    #[error("missing value for action message: {0:?}")]
    MissingValue(crate::action::ActionType),

    /// Builder was asked to format a message without an action
    #[error("no action set on message builder")]
    ActionNotSet,
}
