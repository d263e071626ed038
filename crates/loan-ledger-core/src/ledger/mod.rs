//! Servicing records around the amortization core: users, items, loans with
//! their persisted schedules, bearer tokens and loan sharing.

pub mod access;
pub mod auth;
pub mod config;
pub mod records;
pub mod service;
pub mod store;

pub use config::LedgerConfig;
pub use records::{Item, ItemCreate, ItemKind, Loan, LoanCreate, LoanDetails, Page, User, UserCreate};
pub use service::Ledger;
pub use store::LedgerStore;
