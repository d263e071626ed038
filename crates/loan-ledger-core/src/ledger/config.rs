use serde::{Deserialize, Serialize};

use crate::error::LoanLedgerError;
use crate::LoanLedgerResult;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_MAX_PAGE_SIZE: u32 = 100;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 366;

/// Runtime settings for a [`Ledger`](super::Ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Lifetime of an issued bearer token.
    pub token_ttl_hours: i64,
    /// Upper bound applied to every list `limit`.
    pub max_page_size: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl LedgerConfig {
    /// Reject settings that would issue already-expired or unbounded tokens,
    /// or make every page empty.
    pub fn validate(&self) -> LoanLedgerResult<()> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(LoanLedgerError::InvalidInput {
                field: "token_ttl_hours".into(),
                reason: format!(
                    "Must be between 1 and {MAX_TOKEN_TTL_HOURS}, got {}",
                    self.token_ttl_hours
                ),
            });
        }
        if self.max_page_size == 0 {
            return Err(LoanLedgerError::InvalidInput {
                field: "max_page_size".into(),
                reason: "Must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds_token_ttl() {
        assert!(LedgerConfig::default().validate().is_ok());
        for ttl in [0, -5, MAX_TOKEN_TTL_HOURS + 1, 10_000_000_000_000] {
            let cfg = LedgerConfig {
                token_ttl_hours: ttl,
                ..LedgerConfig::default()
            };
            assert!(matches!(
                cfg.validate(),
                Err(LoanLedgerError::InvalidInput { ref field, .. }) if field == "token_ttl_hours"
            ));
        }
    }

    #[test]
    fn test_validate_rejects_empty_pages() {
        let cfg = LedgerConfig {
            max_page_size: 0,
            ..LedgerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let cfg: LedgerConfig = serde_json::from_str(r#"{"token_ttl_hours": 2}"#).unwrap();
        assert_eq!(cfg.token_ttl_hours, 2);
        assert_eq!(cfg.max_page_size, 100);
    }
}
