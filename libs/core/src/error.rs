use std::fmt::Display;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Error getting service address for {resource} ({port_type}): {reason}")]
    Resolve {
        resource: String,
        port_type: String,
        reason: String,
    },

    #[error("Client already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Input data must be a struct, got {0}")]
    InvalidInputKind(&'static str),

    #[error("Unsupported value for query field '{field}': {kind}")]
    UnsupportedValue { field: String, kind: &'static str },

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    pub fn resolve(resource: &str, port_type: &str, reason: impl Display) -> Self {
        Self::Resolve {
            resource: resource.to_string(),
            port_type: port_type.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
