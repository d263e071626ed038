use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use loan_ledger_core::amortization::{self, AmortizationInput, LoanTerms, SummaryInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Deserialize)]
struct PaymentInput {
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: Decimal,
}

// ---------------------------------------------------------------------------
// Amortization
// ---------------------------------------------------------------------------

/// Fixed monthly payment, returned as a decimal string.
#[napi]
pub fn compute_payment(input_json: String) -> NapiResult<String> {
    let input: PaymentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let terms = LoanTerms::from_annual(input.principal, input.annual_rate_percent, input.term_months)
        .map_err(to_napi_error)?;
    let payment = amortization::compute_payment(terms.principal, terms.monthly_rate, terms.term_months)
        .map_err(to_napi_error)?;
    serde_json::to_string(&payment).map_err(to_napi_error)
}

#[napi]
pub fn amortize(input_json: String) -> NapiResult<String> {
    let input: AmortizationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::amortize(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_loan(input_json: String) -> NapiResult<String> {
    let input: SummaryInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortization::summarize_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
