//! SQLite persistence for users, items, loans, schedules, members and tokens.
//!
//! Monetary columns are TEXT holding the exact decimal representation.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use super::records::{Item, ItemCreate, ItemKind, Loan, LoanCreate, LoanDetails, Page, User};
use crate::amortization::ScheduleRow;
use crate::error::LoanLedgerError;
use crate::LoanLedgerResult;

pub const SQLITE_SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      email TEXT NOT NULL UNIQUE,
      hashed_password TEXT NOT NULL,
      salt TEXT NOT NULL,
      is_active INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS items (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      title TEXT NOT NULL,
      description TEXT,
      owner_id INTEGER NOT NULL REFERENCES users(id),
      kind TEXT NOT NULL CHECK (kind IN ('plain', 'loan'))
    );
    CREATE INDEX IF NOT EXISTS items_owner ON items(owner_id);
    CREATE TABLE IF NOT EXISTS loans (
      item_id INTEGER PRIMARY KEY REFERENCES items(id) ON DELETE CASCADE,
      amount TEXT NOT NULL,
      annual_interest_rate TEXT NOT NULL,
      loan_term_in_months INTEGER NOT NULL CHECK (loan_term_in_months > 0)
    );
    CREATE TABLE IF NOT EXISTS schedules (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      loan_id INTEGER NOT NULL REFERENCES loans(item_id) ON DELETE CASCADE,
      month INTEGER NOT NULL CHECK (month >= 0),
      remaining_balance TEXT NOT NULL,
      monthly_payment TEXT NOT NULL,
      UNIQUE (loan_id, month)
    );
    CREATE TABLE IF NOT EXISTS loan_members (
      loan_id INTEGER NOT NULL REFERENCES loans(item_id) ON DELETE CASCADE,
      user_id INTEGER NOT NULL REFERENCES users(id),
      PRIMARY KEY (loan_id, user_id)
    );
    CREATE TABLE IF NOT EXISTS tokens (
      token_hash TEXT PRIMARY KEY,
      user_id INTEGER NOT NULL REFERENCES users(id),
      issued_at TEXT NOT NULL,
      expires_at TEXT NOT NULL
    );
";

const LOAN_COLUMNS: &str = "i.id, i.title, i.description, i.owner_id, \
     l.amount, l.annual_interest_rate, l.loan_term_in_months";

/// Stored credentials for a user.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub hashed_password: String,
    pub salt: String,
}

pub struct LedgerStore {
    conn: Connection,
}

impl LedgerStore {
    pub fn open(path: &Path) -> LoanLedgerResult<Self> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened ledger database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> LoanLedgerResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> LoanLedgerResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let store = LedgerStore { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> LoanLedgerResult<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version >= SQLITE_SCHEMA_VERSION {
            return Ok(());
        }
        self.conn.execute_batch(SCHEMA)?;
        self.conn
            .execute_batch(&format!("PRAGMA user_version={SQLITE_SCHEMA_VERSION};"))?;
        debug!(from = version, to = SQLITE_SCHEMA_VERSION, "migrated ledger schema");
        Ok(())
    }

    pub fn schema_version(&self) -> LoanLedgerResult<i64> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn insert_user(
        &self,
        email: &str,
        hashed_password: &str,
        salt: &str,
    ) -> LoanLedgerResult<User> {
        self.conn
            .execute(
                "INSERT INTO users (email, hashed_password, salt) VALUES (?1, ?2, ?3)",
                params![email, hashed_password, salt],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    LoanLedgerError::EmailAlreadyRegistered(email.to_string())
                } else {
                    e.into()
                }
            })?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            email: email.to_string(),
            is_active: true,
        })
    }

    pub fn user_by_id(&self, id: i64) -> LoanLedgerResult<Option<User>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, is_active FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()?)
    }

    pub fn user_by_email(&self, email: &str) -> LoanLedgerResult<Option<User>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, is_active FROM users WHERE email = ?1",
                params![email],
                user_from_row,
            )
            .optional()?)
    }

    pub fn credentials_by_email(&self, email: &str) -> LoanLedgerResult<Option<Credentials>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, is_active, hashed_password, salt FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(Credentials {
                        user: user_from_row(row)?,
                        hashed_password: row.get(3)?,
                        salt: row.get(4)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn list_users(&self, page: Page) -> LoanLedgerResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, email, is_active FROM users ORDER BY id LIMIT ?1 OFFSET ?2")?;
        let users = stmt
            .query_map(params![page.limit, page.skip], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    pub fn insert_item(&self, owner_id: i64, item: &ItemCreate) -> LoanLedgerResult<Item> {
        self.conn.execute(
            "INSERT INTO items (title, description, owner_id, kind) VALUES (?1, ?2, ?3, 'plain')",
            params![item.title, item.description, owner_id],
        )?;
        Ok(Item {
            id: self.conn.last_insert_rowid(),
            title: item.title.clone(),
            description: item.description.clone(),
            owner_id,
            kind: ItemKind::Plain,
        })
    }

    pub fn list_items_for_owner(&self, owner_id: i64, page: Page) -> LoanLedgerResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id, i.title, i.description, i.owner_id,
                    l.amount, l.annual_interest_rate, l.loan_term_in_months
             FROM items i LEFT JOIN loans l ON l.item_id = i.id
             WHERE i.owner_id = ?1
             ORDER BY i.id LIMIT ?2 OFFSET ?3",
        )?;
        let items = stmt
            .query_map(params![owner_id, page.limit, page.skip], |row| {
                let amount: Option<String> = row.get(4)?;
                let kind = match amount {
                    Some(_) => ItemKind::Loan(loan_details_from_row(row, 4)?),
                    None => ItemKind::Plain,
                };
                Ok(Item {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    owner_id: row.get(3)?,
                    kind,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    // -----------------------------------------------------------------------
    // Loans and schedules
    // -----------------------------------------------------------------------

    /// Insert the loan item, its terms and every schedule row in one
    /// transaction. Nothing is visible to readers unless all rows land and
    /// they cover months `0..term` exactly.
    pub fn insert_loan_with_schedule(
        &mut self,
        owner_id: i64,
        loan: &LoanCreate,
        details: LoanDetails,
        rows: &[ScheduleRow],
    ) -> LoanLedgerResult<Loan> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO items (title, description, owner_id, kind) VALUES (?1, ?2, ?3, 'loan')",
            params![loan.title, loan.description, owner_id],
        )?;
        let loan_id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO loans (item_id, amount, annual_interest_rate, loan_term_in_months)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                loan_id,
                details.amount.to_string(),
                details.annual_interest_rate.to_string(),
                details.loan_term_in_months
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO schedules (loan_id, month, remaining_balance, monthly_payment)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for row in rows {
                stmt.execute(params![
                    loan_id,
                    row.month,
                    row.remaining_balance.to_string(),
                    row.monthly_payment.to_string()
                ])
                .map_err(|e| LoanLedgerError::PartialPersistence {
                    reason: format!("month {}: {e}", row.month),
                })?;
            }
        }

        let (count, max_month): (u32, Option<u32>) = tx.query_row(
            "SELECT COUNT(*), MAX(month) FROM schedules WHERE loan_id = ?1",
            params![loan_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let term = details.loan_term_in_months;
        if count != term || max_month != term.checked_sub(1) {
            return Err(LoanLedgerError::PartialPersistence {
                reason: format!("stored {count} schedule rows for a {term}-month loan"),
            });
        }

        tx.commit().map_err(|e| LoanLedgerError::PartialPersistence {
            reason: e.to_string(),
        })?;

        Ok(Loan {
            id: loan_id,
            title: loan.title.clone(),
            description: loan.description.clone(),
            owner_id,
            details,
        })
    }

    pub fn loan_by_id(&self, loan_id: i64) -> LoanLedgerResult<Option<Loan>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {LOAN_COLUMNS} FROM items i JOIN loans l ON l.item_id = i.id
                     WHERE i.id = ?1"
                ),
                params![loan_id],
                loan_from_row,
            )
            .optional()?)
    }

    /// Loans the user owns or has been made a member of.
    pub fn list_loans_visible_to(&self, user_id: i64, page: Page) -> LoanLedgerResult<Vec<Loan>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOAN_COLUMNS} FROM items i JOIN loans l ON l.item_id = i.id
             WHERE i.owner_id = ?1
                OR EXISTS (SELECT 1 FROM loan_members m WHERE m.loan_id = i.id AND m.user_id = ?1)
             ORDER BY i.id LIMIT ?2 OFFSET ?3"
        ))?;
        let loans = stmt
            .query_map(params![user_id, page.limit, page.skip], loan_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(loans)
    }

    /// Schedule rows for a loan, always in month order.
    pub fn schedule_for_loan(&self, loan_id: i64) -> LoanLedgerResult<Vec<ScheduleRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT month, remaining_balance, monthly_payment FROM schedules
             WHERE loan_id = ?1 ORDER BY month ASC",
        )?;
        let rows = stmt
            .query_map(params![loan_id], |row| {
                Ok(ScheduleRow {
                    month: row.get(0)?,
                    remaining_balance: decimal_column(row, 1)?,
                    monthly_payment: decimal_column(row, 2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// Share a loan with a user. Sharing twice is a no-op.
    pub fn insert_member(&self, loan_id: i64, user_id: i64) -> LoanLedgerResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO loan_members (loan_id, user_id) VALUES (?1, ?2)",
            params![loan_id, user_id],
        )?;
        Ok(inserted > 0)
    }

    pub fn is_member(&self, loan_id: i64, user_id: i64) -> LoanLedgerResult<bool> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM loan_members WHERE loan_id = ?1 AND user_id = ?2",
                params![loan_id, user_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    pub fn insert_token(
        &self,
        token_hash: &str,
        user_id: i64,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> LoanLedgerResult<()> {
        self.conn.execute(
            "INSERT INTO tokens (token_hash, user_id, issued_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![token_hash, user_id, issued_at, expires_at],
        )?;
        Ok(())
    }

    /// Owner and expiry of a stored token digest.
    pub fn token_owner(&self, token_hash: &str) -> LoanLedgerResult<Option<(i64, DateTime<Utc>)>> {
        Ok(self
            .conn
            .query_row(
                "SELECT user_id, expires_at FROM tokens WHERE token_hash = ?1",
                params![token_hash],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?)
    }

    pub fn purge_expired_tokens(&self, now: DateTime<Utc>) -> LoanLedgerResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM tokens WHERE expires_at <= ?1", params![now])?)
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        is_active: row.get(2)?,
    })
}

/// Loan terms starting at column `first`.
fn loan_details_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<LoanDetails> {
    Ok(LoanDetails {
        amount: decimal_column(row, first)?,
        annual_interest_rate: decimal_column(row, first + 1)?,
        loan_term_in_months: row.get(first + 2)?,
    })
}

fn loan_from_row(row: &Row<'_>) -> rusqlite::Result<Loan> {
    Ok(Loan {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
        details: loan_details_from_row(row, 4)?,
    })
}
