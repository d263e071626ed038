use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanLedgerError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid term: {term} is not a positive whole number of months")]
    InvalidTerm { term: String },

    #[error("Month {month} is out of range for a {term}-month schedule")]
    OutOfRangeMonth { month: i64, term: usize },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Schedule could not be persisted, loan creation rolled back: {reason}")]
    PartialPersistence { reason: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: i64 },

    #[error("Email already registered: {0}")]
    EmailAlreadyRegistered(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied to loan {loan_id}")]
    AccessDenied { loan_id: i64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LoanLedgerError {
    fn from(e: serde_json::Error) -> Self {
        LoanLedgerError::SerializationError(e.to_string())
    }
}

#[cfg(feature = "ledger")]
impl From<rusqlite::Error> for LoanLedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LoanLedgerError::Storage(e.to_string())
    }
}
