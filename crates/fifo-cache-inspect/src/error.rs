//! Error types for the cache inspector

use std::fmt;

#[derive(Debug)]
pub enum InspectError {
    Json(serde_json::Error),
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectError::Json(err) => write!(f, "JSON error: {}", err),
            InspectError::Io(err) => write!(f, "IO error: {}", err),
            InspectError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for InspectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InspectError::Json(err) => Some(err),
            InspectError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for InspectError {
    fn from(err: serde_json::Error) -> Self {
        InspectError::Json(err)
    }
}

impl From<std::io::Error> for InspectError {
    fn from(err: std::io::Error) -> Self {
        InspectError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for InspectError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        InspectError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, InspectError>;
