use serde::{Deserialize, Serialize};

use super::records::{Loan, User};
use crate::error::LoanLedgerError;
use crate::LoanLedgerResult;

/// How a user is entitled to see a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanAccess {
    Owner,
    Member,
}

/// A loan is visible to its owner and to users it has been shared with.
pub fn authorize_view(loan: &Loan, user: &User, is_member: bool) -> LoanLedgerResult<LoanAccess> {
    if loan.owner_id == user.id {
        Ok(LoanAccess::Owner)
    } else if is_member {
        Ok(LoanAccess::Member)
    } else {
        Err(LoanLedgerError::AccessDenied { loan_id: loan.id })
    }
}

/// Only the owner may share a loan.
pub fn authorize_share(loan: &Loan, user: &User) -> LoanLedgerResult<()> {
    if loan.owner_id == user.id {
        Ok(())
    } else {
        Err(LoanLedgerError::AccessDenied { loan_id: loan.id })
    }
}
