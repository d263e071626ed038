use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::engine::{monthly_interest, overflow, ScheduleRow};
use crate::error::LoanLedgerError;
use crate::types::{monthly_rate, with_metadata, ComputationOutput, Money};
use crate::LoanLedgerResult;

/// Point-in-time view of a loan at a given schedule month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub month: u32,
    pub current_principal_balance: Money,
    /// Principal repaid in all months strictly before `month`.
    pub aggregate_principal: Money,
    /// Interest paid in all months strictly before `month`.
    pub aggregate_interest: Money,
}

/// Input for the envelope-style [`summarize_loan`] entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryInput {
    /// Month-ordered schedule as produced by the engine.
    pub schedule: Vec<ScheduleRow>,
    /// Nominal annual rate in percent, as stored on the loan.
    pub annual_rate_percent: Decimal,
    pub month: i64,
}

/// Summarize a stored schedule at `target_month`.
///
/// The balance is read straight from the row; interest for every earlier
/// month is recovered from that month's balance at the loan's monthly rate,
/// and the rest of that month's payment counts as principal.
pub fn summarize(
    rows: &[ScheduleRow],
    annual_rate_percent: Decimal,
    target_month: i64,
) -> LoanLedgerResult<SummaryResult> {
    let index = usize::try_from(target_month)
        .ok()
        .filter(|&i| i < rows.len())
        .ok_or(LoanLedgerError::OutOfRangeMonth {
            month: target_month,
            term: rows.len(),
        })?;

    let rate = monthly_rate(annual_rate_percent);
    let (aggregate_interest, aggregate_principal) = rows[..index].iter().try_fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(interest, principal), row| {
            let month_interest = monthly_interest(row.remaining_balance, rate)?;
            let month_principal = row
                .monthly_payment
                .checked_sub(month_interest)
                .ok_or_else(|| overflow("principal repaid"))?;
            Ok::<_, LoanLedgerError>((
                interest
                    .checked_add(month_interest)
                    .ok_or_else(|| overflow("aggregate interest"))?,
                principal
                    .checked_add(month_principal)
                    .ok_or_else(|| overflow("aggregate principal"))?,
            ))
        },
    )?;

    let target = &rows[index];
    Ok(SummaryResult {
        month: target.month,
        current_principal_balance: target.remaining_balance,
        aggregate_principal,
        aggregate_interest,
    })
}

/// Summarize a schedule wrapped in the standard output envelope.
pub fn summarize_loan(input: &SummaryInput) -> LoanLedgerResult<ComputationOutput<SummaryResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let out_of_order = input
        .schedule
        .iter()
        .enumerate()
        .any(|(i, row)| row.month as usize != i);
    if out_of_order {
        warnings.push("Schedule months are not dense and ascending from 0".into());
    }

    let result = summarize(&input.schedule, input.annual_rate_percent, input.month)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Schedule-derived principal/interest summary",
        &serde_json::json!({
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "month": input.month,
            "term_months": input.schedule.len(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::engine::generate_schedule;
    use rust_decimal_macros::dec;

    fn six_percent_year() -> Vec<ScheduleRow> {
        generate_schedule(dec!(10000), dec!(0.005), 12).unwrap().rows
    }

    #[test]
    fn test_month_zero_has_no_history() {
        let rows = six_percent_year();
        let s = summarize(&rows, dec!(6), 0).unwrap();
        assert_eq!(s.month, 0);
        assert_eq!(s.current_principal_balance, dec!(10000));
        assert!(s.aggregate_principal.is_zero());
        assert!(s.aggregate_interest.is_zero());
    }

    #[test]
    fn test_month_one_splits_first_payment() {
        let rows = six_percent_year();
        let s = summarize(&rows, dec!(6), 1).unwrap();
        assert_eq!(s.aggregate_interest, dec!(50));
        assert_eq!(s.aggregate_principal, dec!(810.6643));
        assert_eq!(s.current_principal_balance, dec!(9189.3357));
    }

    #[test]
    fn test_principal_reconciles_with_balance() {
        let rows = six_percent_year();
        for month in 0..12 {
            let s = summarize(&rows, dec!(6), month).unwrap();
            assert_eq!(
                s.aggregate_principal + s.current_principal_balance,
                dec!(10000),
                "month {month}"
            );
        }
    }

    #[test]
    fn test_out_of_range_months() {
        let rows = six_percent_year();
        for month in [12, -1, i64::MAX, i64::MIN] {
            let err = summarize(&rows, dec!(6), month).unwrap_err();
            assert!(matches!(
                err,
                LoanLedgerError::OutOfRangeMonth { term: 12, .. }
            ));
        }
    }

    #[test]
    fn test_empty_schedule_is_out_of_range() {
        assert!(matches!(
            summarize(&[], dec!(6), 0),
            Err(LoanLedgerError::OutOfRangeMonth { term: 0, .. })
        ));
    }

    #[test]
    fn test_summary_is_idempotent() {
        let rows = six_percent_year();
        let first = summarize(&rows, dec!(6), 7).unwrap();
        let second = summarize(&rows, dec!(6), 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_rate_summary() {
        let rows = generate_schedule(dec!(1200), Decimal::ZERO, 12).unwrap().rows;
        let s = summarize(&rows, Decimal::ZERO, 5).unwrap();
        assert_eq!(s.current_principal_balance, dec!(700));
        assert_eq!(s.aggregate_principal, dec!(500));
        assert!(s.aggregate_interest.is_zero());
    }

    #[test]
    fn test_summarize_loan_flags_unordered_schedule() {
        let mut rows = six_percent_year();
        rows.swap(2, 3);
        let input = SummaryInput {
            schedule: rows,
            annual_rate_percent: dec!(6),
            month: 1,
        };
        let out = summarize_loan(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_oversized_supplied_schedule_is_an_error() {
        let rows = [
            ScheduleRow {
                month: 0,
                remaining_balance: Decimal::MAX,
                monthly_payment: Decimal::ONE,
            },
            ScheduleRow {
                month: 1,
                remaining_balance: Decimal::MAX,
                monthly_payment: Decimal::ONE,
            },
        ];
        // 2400% a year is 200% a month, so the first month's interest overflows
        assert!(matches!(
            summarize(&rows, dec!(2400), 1),
            Err(LoanLedgerError::InvalidInput { .. })
        ));
    }
}
