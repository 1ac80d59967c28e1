//! Core error taxonomy
//!
//! Every variant carries enough context for the presentation layer to show
//! a specific message rather than a blanket failure.

use thiserror::Error;

use crate::store::StorageError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{what} '{key}' not found")]
    NotFound { what: &'static str, key: String },

    #[error("{0}")]
    Forbidden(String),

    #[error("maximum edit limit (3) reached for checklist {0}")]
    EditLimitReached(i64),

    #[error("checklist {0} was revised concurrently; reload and retry")]
    EditConflict(i64),

    #[error("trial plan allows only 1 machine; upgrade to add more")]
    TrialLimitReached,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CoreError {
    pub fn not_found(what: &'static str, key: impl ToString) -> Self {
        CoreError::NotFound {
            what,
            key: key.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        CoreError::Forbidden(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_specific() {
        let err = CoreError::not_found("machine", 7);
        assert_eq!(err.to_string(), "machine '7' not found");

        let err = CoreError::EditLimitReached(3);
        assert!(err.to_string().contains("edit limit (3)"));

        let err = CoreError::TrialLimitReached;
        assert!(err.to_string().contains("trial plan"));
    }
}
