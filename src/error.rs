// Error types shared by the store, the services and the HTTP layer

use thiserror::Error;

/// Everything that can go wrong while serving a ledger operation
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Missing or invalid request field (empty name, amount <= 0, bad date...)
    #[error("{0}")]
    Validation(String),

    #[error("CPF already registered")]
    DuplicateCredential,

    #[error("CPF required: send it in the 'cpf' header or as a Bearer token")]
    MissingCredential,

    #[error("customer not found")]
    UnknownCredential,

    #[error("customer not found")]
    NotFound,

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: f64, requested: f64 },

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    /// Client errors are the caller's fault; everything else is ours
    pub fn is_client_error(&self) -> bool {
        !matches!(self, LedgerError::Storage(_) | LedgerError::LockPoisoned)
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message_carries_amounts() {
        let err = LedgerError::InsufficientFunds {
            balance: 100.0,
            requested: 150.0,
        };

        assert_eq!(err.to_string(), "insufficient funds: balance 100, requested 150");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_storage_errors_are_not_client_errors() {
        let err = LedgerError::from(rusqlite::Error::InvalidQuery);
        assert!(!err.is_client_error());
        assert!(!LedgerError::LockPoisoned.is_client_error());
        assert!(LedgerError::validation("bad").is_client_error());
    }
}
