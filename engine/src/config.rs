//! Engine configuration loaded from environment variables with defaults.

use atelier_core::money::Money;
use serde::{Deserialize, Serialize};
use std::env;

/// Penalty thresholds and amounts.
///
/// The decision table itself lives in [`crate::penalty`]; this struct
/// only carries the tunable numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyConfig {
    /// Fee charged to a customer canceling less than 24h before start.
    pub customer_lt24h_fee: Money,
    /// Fee charged to a customer canceling less than 48h before start.
    pub customer_lt48h_fee: Money,
    /// Fraction of the quotation value charged to an artist canceling
    /// less than 2h before start.
    pub artist_lt2h_pct: f64,
    /// Fraction of the quotation value charged to an artist canceling
    /// less than 24h before start.
    pub artist_lt24h_pct: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            customer_lt24h_fee: Money::from_cents(2_500),
            customer_lt48h_fee: Money::from_cents(1_000),
            artist_lt2h_pct: 0.20,
            artist_lt24h_pct: 0.10,
        }
    }
}

/// Bounds for slot suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// How many days forward the suggestion scan looks.
    pub horizon_days: u32,
    /// Step between candidate slot starts, in minutes.
    pub slot_step_minutes: u32,
    /// Maximum number of suggested slots returned.
    pub max_suggestions: usize,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            horizon_days: 28,
            slot_step_minutes: 30,
            max_suggestions: 20,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Penalty thresholds and amounts.
    pub penalty: PenaltyConfig,
    /// Slot suggestion bounds.
    pub scheduling: SchedulingConfig,
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            penalty: PenaltyConfig {
                customer_lt24h_fee: money_var(
                    "PENALTY_CUSTOMER_LT24H_FEE",
                    defaults.penalty.customer_lt24h_fee,
                ),
                customer_lt48h_fee: money_var(
                    "PENALTY_CUSTOMER_LT48H_FEE",
                    defaults.penalty.customer_lt48h_fee,
                ),
                artist_lt2h_pct: env::var("PENALTY_ARTIST_LT2H_PCT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.penalty.artist_lt2h_pct),
                artist_lt24h_pct: env::var("PENALTY_ARTIST_LT24H_PCT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.penalty.artist_lt24h_pct),
            },
            scheduling: SchedulingConfig {
                horizon_days: env::var("SCHEDULING_HORIZON_DAYS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.scheduling.horizon_days),
                slot_step_minutes: env::var("SCHEDULING_SLOT_STEP_MINUTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.scheduling.slot_step_minutes),
                max_suggestions: env::var("SCHEDULING_MAX_SUGGESTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.scheduling.max_suggestions),
            },
        }
    }
}

/// Reads a monetary env var given in currency units ("25.00").
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn money_var(key: &str, default: Money) -> Money {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map_or(default, |v| Money::from_cents((v * 100.0).round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_decision_table() {
        let config = PenaltyConfig::default();
        assert_eq!(config.customer_lt24h_fee, Money::from_cents(2_500));
        assert_eq!(config.customer_lt48h_fee, Money::from_cents(1_000));
        assert!((config.artist_lt2h_pct - 0.20).abs() < f64::EPSILON);
        assert!((config.artist_lt24h_pct - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn scheduling_defaults() {
        let config = SchedulingConfig::default();
        assert_eq!(config.horizon_days, 28);
        assert_eq!(config.slot_step_minutes, 30);
        assert_eq!(config.max_suggestions, 20);
    }
}
