use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, info, warn};

use super::access::{authorize_share, authorize_view, LoanAccess};
use super::auth::{self, IssuedToken};
use super::config::LedgerConfig;
use super::records::{Item, ItemCreate, Loan, LoanCreate, LoanDetails, Page, User, UserCreate};
use super::store::LedgerStore;
use crate::amortization::{summarize, LoanTerms, ScheduleRow, SummaryResult};
use crate::error::LoanLedgerError;
use crate::LoanLedgerResult;

/// Entry point for everything outside the pure amortization core.
///
/// Gated operations take the caller's bearer token and resolve it to a user
/// before touching any loan.
pub struct Ledger {
    store: LedgerStore,
    config: LedgerConfig,
}

impl Ledger {
    pub fn new(store: LedgerStore, config: LedgerConfig) -> Self {
        Ledger { store, config }
    }

    pub fn open(path: &Path, config: LedgerConfig) -> LoanLedgerResult<Self> {
        config.validate()?;
        Ok(Self::new(LedgerStore::open(path)?, config))
    }

    pub fn in_memory(config: LedgerConfig) -> LoanLedgerResult<Self> {
        config.validate()?;
        Ok(Self::new(LedgerStore::open_in_memory()?, config))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Users and tokens
    // -----------------------------------------------------------------------

    pub fn register_user(&mut self, input: &UserCreate) -> LoanLedgerResult<User> {
        let email = input.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(LoanLedgerError::InvalidInput {
                field: "email".into(),
                reason: "Email address must contain '@'".into(),
            });
        }
        if input.password.is_empty() {
            return Err(LoanLedgerError::InvalidInput {
                field: "password".into(),
                reason: "Password cannot be empty".into(),
            });
        }

        let salt = auth::new_salt();
        let hashed = auth::hash_password(&input.password, &salt);
        let user = self.store.insert_user(&email, &hashed, &salt)?;
        info!(user_id = user.id, "registered user");
        Ok(user)
    }

    pub fn login(&mut self, email: &str, password: &str) -> LoanLedgerResult<IssuedToken> {
        self.login_at(email, password, Utc::now())
    }

    pub fn login_at(
        &mut self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> LoanLedgerResult<IssuedToken> {
        let rejected = || LoanLedgerError::Unauthorized("invalid email or password".into());
        let creds = self
            .store
            .credentials_by_email(&email.trim().to_lowercase())?
            .ok_or_else(rejected)?;

        if !creds.user.is_active || !auth::verify_password(password, &creds.salt, &creds.hashed_password)
        {
            warn!(user_id = creds.user.id, "rejected login");
            return Err(rejected());
        }

        let purged = self.store.purge_expired_tokens(now)?;
        if purged > 0 {
            debug!(purged, "purged expired tokens");
        }

        let issued = auth::issue_token(creds.user.id, now, self.config.token_ttl_hours)?;
        self.store.insert_token(
            &auth::token_digest(&issued.token),
            issued.user_id,
            now,
            issued.expires_at,
        )?;
        info!(user_id = issued.user_id, expires_at = %issued.expires_at, "issued token");
        Ok(issued)
    }

    /// Resolve a bearer token (with or without the `Bearer ` prefix) to its user.
    pub fn authenticate(&self, token: &str) -> LoanLedgerResult<User> {
        self.authenticate_at(token, Utc::now())
    }

    pub fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> LoanLedgerResult<User> {
        let digest = auth::token_digest(auth::strip_bearer(token));
        let (user_id, expires_at) = self.store.token_owner(&digest)?.ok_or_else(|| {
            warn!("unknown bearer token");
            LoanLedgerError::Unauthorized("unknown token".into())
        })?;

        if expires_at <= now {
            warn!(user_id, "expired bearer token");
            return Err(LoanLedgerError::Unauthorized("token expired".into()));
        }

        match self.store.user_by_id(user_id)? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(LoanLedgerError::Unauthorized("inactive user".into())),
        }
    }

    pub fn get_user(&self, user_id: i64) -> LoanLedgerResult<User> {
        self.store
            .user_by_id(user_id)?
            .ok_or_else(|| not_found("User", user_id))
    }

    pub fn list_users(&self, page: Page) -> LoanLedgerResult<Vec<User>> {
        self.store
            .list_users(page.clamped(self.config.max_page_size))
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    pub fn create_item(&mut self, token: &str, input: &ItemCreate) -> LoanLedgerResult<Item> {
        let user = self.authenticate(token)?;
        require_title(&input.title)?;
        let item = self.store.insert_item(user.id, input)?;
        info!(user_id = user.id, item_id = item.id, "created item");
        Ok(item)
    }

    pub fn list_items(&self, token: &str, page: Page) -> LoanLedgerResult<Vec<Item>> {
        let user = self.authenticate(token)?;
        self.store
            .list_items_for_owner(user.id, page.clamped(self.config.max_page_size))
    }

    // -----------------------------------------------------------------------
    // Loans
    // -----------------------------------------------------------------------

    /// Validate the terms, derive the schedule and persist both atomically.
    pub fn create_loan(&mut self, token: &str, input: &LoanCreate) -> LoanLedgerResult<Loan> {
        let user = self.authenticate(token)?;
        require_title(&input.title)?;

        let terms = LoanTerms::from_annual(
            input.amount,
            input.annual_interest_rate,
            input.loan_term_in_months,
        )?;
        let schedule = terms.schedule()?;
        let details = LoanDetails {
            amount: input.amount,
            annual_interest_rate: input.annual_interest_rate,
            loan_term_in_months: terms.term_months,
        };

        let loan = self
            .store
            .insert_loan_with_schedule(user.id, input, details, &schedule.rows)?;
        info!(
            user_id = user.id,
            loan_id = loan.id,
            term_months = terms.term_months,
            payment = %schedule.payment,
            "created loan"
        );
        Ok(loan)
    }

    pub fn get_loan(&self, token: &str, loan_id: i64) -> LoanLedgerResult<Loan> {
        let user = self.authenticate(token)?;
        let (loan, _) = self.visible_loan(&user, loan_id)?;
        Ok(loan)
    }

    pub fn list_loans(&self, token: &str, page: Page) -> LoanLedgerResult<Vec<Loan>> {
        let user = self.authenticate(token)?;
        self.store
            .list_loans_visible_to(user.id, page.clamped(self.config.max_page_size))
    }

    pub fn loan_schedule(&self, token: &str, loan_id: i64) -> LoanLedgerResult<Vec<ScheduleRow>> {
        let user = self.authenticate(token)?;
        let (_, access) = self.visible_loan(&user, loan_id)?;
        let rows = self.store.schedule_for_loan(loan_id)?;
        debug!(loan_id, ?access, rows = rows.len(), "read schedule");
        Ok(rows)
    }

    /// Balance at `month` plus principal and interest paid before it.
    pub fn loan_summary(
        &self,
        token: &str,
        loan_id: i64,
        month: i64,
    ) -> LoanLedgerResult<SummaryResult> {
        let user = self.authenticate(token)?;
        let (loan, _) = self.visible_loan(&user, loan_id)?;
        let rows = self.store.schedule_for_loan(loan_id)?;
        let summary = summarize(&rows, loan.details.annual_interest_rate, month)?;
        debug!(loan_id, month, "summarized loan");
        Ok(summary)
    }

    /// Let another registered user view a loan. Owner only.
    pub fn share_loan(
        &mut self,
        token: &str,
        loan_id: i64,
        member_email: &str,
    ) -> LoanLedgerResult<User> {
        let user = self.authenticate(token)?;
        let loan = self
            .store
            .loan_by_id(loan_id)?
            .ok_or_else(|| not_found("Loan", loan_id))?;
        authorize_share(&loan, &user)?;

        let member = self
            .store
            .user_by_email(&member_email.trim().to_lowercase())?
            .ok_or_else(|| LoanLedgerError::InvalidInput {
                field: "email".into(),
                reason: format!("No user registered as {member_email}"),
            })?;
        if member.id != user.id && self.store.insert_member(loan_id, member.id)? {
            info!(loan_id, member_id = member.id, "shared loan");
        }
        Ok(member)
    }

    fn visible_loan(&self, user: &User, loan_id: i64) -> LoanLedgerResult<(Loan, LoanAccess)> {
        let loan = self
            .store
            .loan_by_id(loan_id)?
            .ok_or_else(|| not_found("Loan", loan_id))?;
        let is_member = loan.owner_id != user.id && self.store.is_member(loan_id, user.id)?;
        let access = authorize_view(&loan, user, is_member).inspect_err(|_| {
            warn!(loan_id, user_id = user.id, "denied loan access");
        })?;
        Ok((loan, access))
    }
}

fn require_title(title: &str) -> LoanLedgerResult<()> {
    if title.trim().is_empty() {
        return Err(LoanLedgerError::InvalidInput {
            field: "title".into(),
            reason: "Title cannot be empty".into(),
        });
    }
    Ok(())
}

fn not_found(entity: &str, id: i64) -> LoanLedgerError {
    LoanLedgerError::NotFound {
        entity: entity.into(),
        id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ledger_with_user(email: &str) -> (Ledger, String) {
        let mut ledger = Ledger::in_memory(LedgerConfig::default()).unwrap();
        let token = register_and_login(&mut ledger, email);
        (ledger, token)
    }

    fn register_and_login(ledger: &mut Ledger, email: &str) -> String {
        ledger
            .register_user(&UserCreate {
                email: email.into(),
                password: "secret".into(),
            })
            .unwrap();
        ledger.login(email, "secret").unwrap().token
    }

    fn loan_create(term: Decimal) -> LoanCreate {
        LoanCreate {
            title: "Car".into(),
            description: None,
            amount: dec!(10000),
            annual_interest_rate: dec!(6),
            loan_term_in_months: term,
        }
    }

    #[test]
    fn test_create_loan_persists_schedule() {
        let (mut ledger, token) = ledger_with_user("a@example.com");
        let loan = ledger.create_loan(&token, &loan_create(dec!(12))).unwrap();
        let rows = ledger.loan_schedule(&token, loan.id).unwrap();
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[1].remaining_balance, dec!(9189.3357));
    }

    #[test]
    fn test_invalid_term_creates_nothing() {
        let (mut ledger, token) = ledger_with_user("a@example.com");
        let err = ledger.create_loan(&token, &loan_create(dec!(12.5))).unwrap_err();
        assert!(matches!(err, LoanLedgerError::InvalidTerm { .. }));
        assert!(ledger.list_loans(&token, Page::default()).unwrap().is_empty());
    }

    #[test]
    fn test_summary_uses_stored_rate() {
        let (mut ledger, token) = ledger_with_user("a@example.com");
        let loan = ledger.create_loan(&token, &loan_create(dec!(12))).unwrap();
        let s = ledger.loan_summary(&token, loan.id, 1).unwrap();
        assert_eq!(s.aggregate_interest, dec!(50));
        assert!(matches!(
            ledger.loan_summary(&token, loan.id, 12),
            Err(LoanLedgerError::OutOfRangeMonth { .. })
        ));
    }

    #[test]
    fn test_bad_token_rejected() {
        let (ledger, _) = ledger_with_user("a@example.com");
        assert!(matches!(
            ledger.authenticate("nope"),
            Err(LoanLedgerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_bearer_prefix_accepted() {
        let (ledger, token) = ledger_with_user("a@example.com");
        let user = ledger.authenticate(&format!("Bearer {token}")).unwrap();
        assert_eq!(user.email, "a@example.com");
    }

    #[test]
    fn test_expired_token_rejected() {
        let (ledger, token) = ledger_with_user("a@example.com");
        let later = Utc::now() + chrono::Duration::hours(25);
        assert!(matches!(
            ledger.authenticate_at(&token, later),
            Err(LoanLedgerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let (mut ledger, _) = ledger_with_user("a@example.com");
        assert!(matches!(
            ledger.login("a@example.com", "wrong"),
            Err(LoanLedgerError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_missing_loan_is_not_found() {
        let (ledger, token) = ledger_with_user("a@example.com");
        assert!(matches!(
            ledger.get_loan(&token, 99),
            Err(LoanLedgerError::NotFound { id: 99, .. })
        ));
    }

    #[test]
    fn test_plain_item_is_not_a_loan() {
        let (mut ledger, token) = ledger_with_user("a@example.com");
        let item = ledger
            .create_item(
                &token,
                &ItemCreate {
                    title: "Bike".into(),
                    description: None,
                },
            )
            .unwrap();
        assert!(matches!(
            ledger.get_loan(&token, item.id),
            Err(LoanLedgerError::NotFound { .. })
        ));
    }
}
