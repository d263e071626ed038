use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use loan_ledger_core::amortization::{
    self, compute_payment, AmortizationInput, LoanTerms, SummaryInput,
};
use loan_ledger_core::format_currency;

use crate::input;

/// Loan terms shared by the pure amortization commands
#[derive(Args)]
pub struct TermsArgs {
    /// Principal amount borrowed
    #[arg(long, alias = "amount", allow_hyphen_values = true)]
    pub principal: Option<Decimal>,

    /// Nominal annual interest rate in percent (e.g. 6 for 6%)
    #[arg(long, alias = "rate", allow_hyphen_values = true)]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "months", allow_hyphen_values = true)]
    pub term: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the fixed payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    #[command(flatten)]
    pub terms: TermsArgs,
}

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub terms: TermsArgs,

    /// Render amounts as currency strings ($1234.56)
    #[arg(long)]
    pub formatted: bool,
}

/// Arguments for the schedule summary
#[derive(Args)]
pub struct SummaryArgs {
    /// Path to JSON file holding {schedule, annual_rate_percent, month}
    #[arg(long)]
    pub input: Option<String>,

    /// Principal, when generating the schedule from terms
    #[arg(long, alias = "amount", allow_hyphen_values = true)]
    pub principal: Option<Decimal>,

    /// Nominal annual interest rate in percent
    #[arg(long, alias = "rate", allow_hyphen_values = true)]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "months", allow_hyphen_values = true)]
    pub term: Option<Decimal>,

    /// Month index to summarize (0-based)
    #[arg(long, allow_hyphen_values = true)]
    pub month: Option<i64>,
}

fn amortization_input(args: &TermsArgs) -> Result<AmortizationInput, Box<dyn std::error::Error>> {
    input::resolve(args.input.as_deref(), || {
        Ok(AmortizationInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            term_months: args.term.ok_or("--term is required (or provide --input)")?,
        })
    })
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = amortization_input(&args.terms)?;
    let terms = LoanTerms::from_annual(input.principal, input.annual_rate_percent, input.term_months)?;
    let payment = compute_payment(terms.principal, terms.monthly_rate, terms.term_months)?;

    Ok(json!({
        "principal": terms.principal.to_string(),
        "monthly_rate": terms.monthly_rate.to_string(),
        "term_months": terms.term_months,
        "monthly_payment": payment.to_string(),
        "monthly_payment_display": format_currency(payment),
    }))
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = amortization_input(&args.terms)?;
    let result = amortization::amortize(&input)?;
    let mut value = serde_json::to_value(&result)?;

    if args.formatted {
        let rows: Vec<Value> = result.result.schedule.iter().map(display_row).collect();
        value["result"]["schedule"] = Value::Array(rows);
        value["result"]["monthly_payment"] = json!(format_currency(result.result.monthly_payment));
    }

    Ok(value)
}

pub fn run_summary(args: SummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let summary_input: SummaryInput = input::resolve(args.input.as_deref(), || {
        let annual_rate = args
            .annual_rate
            .ok_or("--annual-rate is required (or provide --input)")?;
        let terms = LoanTerms::from_annual(
            args.principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate,
            args.term.ok_or("--term is required (or provide --input)")?,
        )?;
        Ok(SummaryInput {
            schedule: terms.schedule()?.rows,
            annual_rate_percent: annual_rate,
            month: args.month.ok_or("--month is required")?,
        })
    })?;

    let result = amortization::summarize_loan(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}

/// A schedule row with amounts rendered for display.
pub fn display_row(row: &amortization::ScheduleRow) -> Value {
    json!({
        "month": row.month,
        "remaining_balance": format_currency(row.remaining_balance),
        "monthly_payment": format_currency(row.monthly_payment),
    })
}
