// Typed errors with thiserror. Surface meaningful messages to JS.
// Gesture misses and absent DOM targets are outcomes, not errors.

use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid tab list: {0}")]
    InvalidTabs(String),

    #[error("No browser window available")]
    NoWindow,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::InvalidConfig("missing field".to_string());
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn serde_error_converts() {
        let parse: Result<u32, _> = serde_json::from_str("not json");
        let err: EngineError = parse.unwrap_err().into();
        assert!(matches!(err, EngineError::Serialization(_)));
    }
}
