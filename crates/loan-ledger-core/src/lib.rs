pub mod error;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "ledger")]
pub mod ledger;

pub use error::LoanLedgerError;
pub use types::*;

/// Standard result type for all loan-ledger operations
pub type LoanLedgerResult<T> = Result<T, LoanLedgerError>;
