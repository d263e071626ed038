use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

const DEFAULT_PAGE_LIMIT: u32 = 100;

/// A registered account. Credentials never leave the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
}

/// Loan-specific payload carried by an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDetails {
    pub amount: Money,
    /// Nominal annual rate in percent.
    pub annual_interest_rate: Decimal,
    pub loan_term_in_months: u32,
}

/// What an item is. Plain items carry only title and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemKind {
    Plain,
    Loan(LoanDetails),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: i64,
    #[serde(flatten)]
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCreate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to create a loan. The term arrives as a decimal and must be a
/// positive whole number of months.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanCreate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: Money,
    pub annual_interest_rate: Decimal,
    pub loan_term_in_months: Decimal,
}

/// An item known to be a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner_id: i64,
    #[serde(flatten)]
    pub details: LoanDetails,
}

/// Offset pagination for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Page {
    pub fn new(skip: u32, limit: u32) -> Self {
        Page { skip, limit }
    }

    pub fn clamped(self, max_limit: u32) -> Self {
        Page {
            skip: self.skip,
            limit: self.limit.min(max_limit),
        }
    }
}
