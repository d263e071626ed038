pub mod accounts;
pub mod amortization;
pub mod loans;

use std::path::PathBuf;

use loan_ledger_core::ledger::Ledger;

use crate::config;

/// Global options shared by every command that touches the ledger database.
pub struct Context {
    pub db: PathBuf,
    pub token: Option<String>,
    pub config: Option<PathBuf>,
}

impl Context {
    pub fn open_ledger(&self) -> Result<Ledger, Box<dyn std::error::Error>> {
        let settings = config::load(self.config.as_deref())?;
        Ok(Ledger::open(&self.db, settings)?)
    }

    pub fn token(&self) -> Result<&str, Box<dyn std::error::Error>> {
        self.token
            .as_deref()
            .ok_or_else(|| "--token is required (or set LOANCTL_TOKEN; see `loanctl login`)".into())
    }
}
