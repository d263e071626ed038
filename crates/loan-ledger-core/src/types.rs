use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.005 = 0.5% per month). Never as percentages.
pub type Rate = Decimal;

/// Fractional digits kept on every persisted monetary amount.
pub const MONEY_SCALE: u32 = 4;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Periodic (monthly) rate for a nominal annual rate given in percent.
///
/// Loan creation and summary aggregation both go through this function so the
/// interest recovered from a stored schedule matches the interest that built it.
pub fn monthly_rate(annual_rate_percent: Decimal) -> Rate {
    annual_rate_percent / (PERCENT * MONTHS_PER_YEAR)
}

/// Round a monetary amount to the ledger scale (banker's rounding).
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Render an amount for display, e.g. `$9189.34` or `-$12.50`.
pub fn format_currency(amount: Money) -> String {
    let cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if cents.is_sign_negative() && !cents.is_zero() {
        format!("-${:.2}", cents.abs())
    } else {
        format!("${:.2}", cents.abs())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: format!("rust_decimal_128bit_scale_{MONEY_SCALE}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_rate_six_percent() {
        assert_eq!(monthly_rate(dec!(6)), dec!(0.005));
    }

    #[test]
    fn test_monthly_rate_zero() {
        assert!(monthly_rate(Decimal::ZERO).is_zero());
    }

    #[test]
    fn test_round_money_keeps_four_places() {
        assert_eq!(round_money(dec!(860.66429761)), dec!(860.6643));
        assert_eq!(round_money(dec!(0.00005)), dec!(0.0000));
        assert_eq!(round_money(dec!(0.00015)), dec!(0.0002));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(9189.3357)), "$9189.34");
        assert_eq!(format_currency(dec!(100)), "$100.00");
        assert_eq!(format_currency(dec!(-12.5)), "-$12.50");
        assert_eq!(format_currency(dec!(-0.001)), "$0.00");
    }
}
