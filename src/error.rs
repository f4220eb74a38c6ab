use crate::expr::ExprError;
use crate::style::SetupField;
use thiserror::Error;

/// Errors surfaced by the command surface and configuration loading.
///
/// A reference to an entity that does not exist is deliberately not an error:
/// commands aimed at it are silent no-ops.
#[derive(Debug, Error)]
pub enum CalloutError {
    #[error("unknown sub-command: {0}")]
    UnknownCommand(String),

    #[error("unknown setup field: {0}")]
    UnknownSetupField(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid numeric value {value:?} for {field}: {source}")]
    InvalidNumber {
        field: SetupField,
        value: String,
        #[source]
        source: ExprError,
    },

    #[error("failed to read config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CalloutError>;
