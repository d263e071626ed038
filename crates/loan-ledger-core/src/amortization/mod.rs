//! Amortization engine and schedule-derived summaries.
//!
//! The engine runs once per loan and produces the month-indexed schedule that
//! gets persisted; the summary aggregator reads that schedule back and
//! recovers the principal/interest split of every payment made before a
//! given month.

pub mod engine;
pub mod summary;

pub use engine::{
    amortize, compute_payment, generate_schedule, monthly_interest, term_from_decimal,
    AmortizationInput, AmortizationOutput, AmortizationSchedule, LoanTerms, ScheduleRow,
};
pub use summary::{summarize, summarize_loan, SummaryInput, SummaryResult};
