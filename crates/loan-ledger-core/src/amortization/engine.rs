//! Fixed-payment amortization with monthly compounding.
//!
//! One convention only: a constant payment `A` derived from the annuity
//! formula, interest accrued monthly on the outstanding balance, and the
//! payment capped at whatever is owed so a balance never goes negative.
//! Every amount is kept at [`MONEY_SCALE`](crate::types::MONEY_SCALE)
//! fractional digits.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LoanLedgerError;
use crate::types::{monthly_rate, round_money, with_metadata, ComputationOutput, Money, Rate};
use crate::LoanLedgerResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Terms beyond 50 years are accepted but flagged.
const LONG_TERM_WARNING_MONTHS: u32 = 600;
/// Residual balance (after the final payment) worth reporting.
const RESIDUAL_WARNING_THRESHOLD: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Validated inputs to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Periodic rate per month (0.005 = 0.5%).
    pub monthly_rate: Rate,
    pub term_months: u32,
}

/// One month of a persisted schedule.
///
/// Month 0 holds the starting balance and restates the fixed payment; every
/// later row holds the balance after that month's payment was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub month: u32,
    pub remaining_balance: Money,
    pub monthly_payment: Money,
}

/// Engine output: the fixed payment, `term_months` rows and the balance left
/// once the last scheduled payment is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub payment: Money,
    pub rows: Vec<ScheduleRow>,
    pub final_balance: Money,
}

/// Input for the envelope-style [`amortize`] entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub principal: Money,
    /// Nominal annual rate in percent (6 = 6%).
    pub annual_rate_percent: Decimal,
    /// Term in months; must be a positive whole number.
    pub term_months: Decimal,
}

/// Output of [`amortize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub monthly_rate: Rate,
    pub monthly_payment: Money,
    /// Interest accrued over all `term_months` payments.
    pub total_interest: Money,
    pub final_balance: Money,
    pub schedule: Vec<ScheduleRow>,
}

impl LoanTerms {
    /// Build terms from a nominal annual percentage, validating every field.
    pub fn from_annual(
        principal: Money,
        annual_rate_percent: Decimal,
        term_months: Decimal,
    ) -> LoanLedgerResult<Self> {
        if principal <= Decimal::ZERO {
            return Err(LoanLedgerError::InvalidInput {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
        if annual_rate_percent < Decimal::ZERO {
            return Err(LoanLedgerError::InvalidInput {
                field: "annual_interest_rate".into(),
                reason: "Interest rate cannot be negative".into(),
            });
        }
        Ok(LoanTerms {
            principal,
            monthly_rate: monthly_rate(annual_rate_percent),
            term_months: term_from_decimal(term_months)?,
        })
    }

    pub fn schedule(&self) -> LoanLedgerResult<AmortizationSchedule> {
        generate_schedule(self.principal, self.monthly_rate, self.term_months)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert a term supplied as a decimal (e.g. `12` or `12.0`) into whole months.
pub fn term_from_decimal(term: Decimal) -> LoanLedgerResult<u32> {
    let invalid = || LoanLedgerError::InvalidTerm {
        term: term.normalize().to_string(),
    };
    if term <= Decimal::ZERO || !term.fract().is_zero() {
        return Err(invalid());
    }
    term.to_u32().ok_or_else(invalid)
}

/// Interest accrued over one month on `balance`.
///
/// Shared by schedule generation and summary aggregation.
pub fn monthly_interest(balance: Money, rate: Rate) -> LoanLedgerResult<Money> {
    balance
        .checked_mul(rate)
        .map(round_money)
        .ok_or_else(|| overflow("monthly interest"))
}

/// Fixed periodic payment for principal `P`, periodic rate `r` and `n` periods.
///
/// `A = P·r·(1+r)^n / ((1+r)^n − 1)`, or `P / n` when `r` is zero. The
/// factor ratio is taken first so large `(1+r)^n` never meets `P·r` alone.
pub fn compute_payment(principal: Money, rate: Rate, term_months: u32) -> LoanLedgerResult<Money> {
    if term_months == 0 {
        return Err(LoanLedgerError::InvalidTerm { term: "0".into() });
    }

    if rate.is_zero() {
        return Ok(round_money(principal / Decimal::from(term_months)));
    }

    let factor = (Decimal::ONE + rate)
        .checked_powu(u64::from(term_months))
        .ok_or_else(|| LoanLedgerError::InvalidInput {
            field: "monthly_rate".into(),
            reason: format!("Compounding factor overflows over {term_months} periods"),
        })?;
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(LoanLedgerError::DivisionByZero {
            context: "annuity payment factor".into(),
        });
    }

    factor
        .checked_div(denominator)
        .and_then(|ratio| principal.checked_mul(rate)?.checked_mul(ratio))
        .map(round_money)
        .ok_or_else(|| overflow("monthly payment"))
}

/// Derive the month-by-month schedule for a loan.
///
/// Produces exactly `term_months` rows, months `0..term_months`, ascending.
pub fn generate_schedule(
    principal: Money,
    rate: Rate,
    term_months: u32,
) -> LoanLedgerResult<AmortizationSchedule> {
    let payment = compute_payment(principal, rate, term_months)?;

    let mut rows = Vec::new();
    let mut balance = round_money(principal);
    let mut applied = payment;
    for month in 0..term_months {
        rows.push(ScheduleRow {
            month,
            remaining_balance: balance,
            monthly_payment: applied,
        });
        (applied, balance) = apply_payment(balance, rate, payment)?;
    }

    Ok(AmortizationSchedule {
        payment,
        rows,
        final_balance: balance,
    })
}

/// Compute a full schedule wrapped in the standard output envelope.
pub fn amortize(
    input: &AmortizationInput,
) -> LoanLedgerResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let terms = LoanTerms::from_annual(
        input.principal,
        input.annual_rate_percent,
        input.term_months,
    )?;

    if terms.monthly_rate.is_zero() {
        warnings.push("Zero interest rate: straight-line repayment of principal / term".into());
    }
    if terms.term_months > LONG_TERM_WARNING_MONTHS {
        warnings.push(format!(
            "Term of {} months exceeds {} months; verify the input is in months",
            terms.term_months, LONG_TERM_WARNING_MONTHS
        ));
    }

    let schedule = terms.schedule()?;

    if schedule.final_balance.abs() > RESIDUAL_WARNING_THRESHOLD {
        warnings.push(format!(
            "Balance of {} remains after the final payment",
            schedule.final_balance
        ));
    }

    let total_interest = schedule.rows.iter().try_fold(Decimal::ZERO, |total, row| {
        let interest = monthly_interest(row.remaining_balance, terms.monthly_rate)?;
        total
            .checked_add(interest)
            .ok_or_else(|| overflow("total interest"))
    })?;

    let output = AmortizationOutput {
        monthly_rate: terms.monthly_rate,
        monthly_payment: schedule.payment,
        total_interest,
        final_balance: schedule.final_balance,
        schedule: schedule.rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-payment amortization, monthly compounding",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Accrue one month of interest and apply the payment, capped at the amount owed.
/// Returns `(payment applied, remaining balance)`.
fn apply_payment(balance: Money, rate: Rate, payment: Money) -> LoanLedgerResult<(Money, Money)> {
    let owed = balance
        .checked_add(monthly_interest(balance, rate)?)
        .ok_or_else(|| overflow("amount owed"))?;
    let applied = payment.min(owed);
    Ok((applied, owed - applied))
}

pub(crate) fn overflow(quantity: &str) -> LoanLedgerError {
    LoanLedgerError::InvalidInput {
        field: "loan_terms".into(),
        reason: format!("{quantity} exceeds the decimal range"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
