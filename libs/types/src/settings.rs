//! Engine configuration snapshot
//!
//! Loaded once per matching cycle and passed explicitly; never read as a
//! live global. Mutated only by the administrative control plane.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Process-wide matching configuration, read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Master switch for the matching cycle
    pub auto_matching_enabled: bool,
    /// Emergency halt; wins over everything else
    pub circuit_breaker_active: bool,
    /// Maker fee, as a percentage of total trade value (e.g. 0.05 = 0.05%)
    pub maker_fee_percent: Decimal,
    /// Taker fee, as a percentage of total trade value
    pub taker_fee_percent: Decimal,
}

impl EngineSettings {
    /// Whether the matching cycle may run at all
    pub fn matching_allowed(&self) -> bool {
        self.auto_matching_enabled && !self.circuit_breaker_active
    }

    /// Maker fee for a given trade value
    pub fn maker_fee(&self, total_value: Decimal) -> Decimal {
        total_value * self.maker_fee_percent / Decimal::from(100)
    }

    /// Taker fee for a given trade value
    pub fn taker_fee(&self, total_value: Decimal) -> Decimal {
        total_value * self.taker_fee_percent / Decimal::from(100)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            auto_matching_enabled: true,
            circuit_breaker_active: false,
            maker_fee_percent: Decimal::new(5, 2),  // 0.05%
            taker_fee_percent: Decimal::new(10, 2), // 0.10%
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_allow_matching() {
        let settings = EngineSettings::default();
        assert!(settings.matching_allowed());
    }

    #[test]
    fn test_circuit_breaker_gates() {
        let settings = EngineSettings {
            circuit_breaker_active: true,
            ..EngineSettings::default()
        };
        assert!(!settings.matching_allowed());
    }

    #[test]
    fn test_disabled_matching_gates() {
        let settings = EngineSettings {
            auto_matching_enabled: false,
            ..EngineSettings::default()
        };
        assert!(!settings.matching_allowed());
    }

    #[test]
    fn test_fee_percentages() {
        let settings = EngineSettings::default();
        // total_value = 50: taker 0.1% = 0.05, maker 0.05% = 0.025
        assert_eq!(settings.taker_fee(Decimal::from(50)), Decimal::new(5, 2));
        assert_eq!(settings.maker_fee(Decimal::from(50)), Decimal::new(25, 3));
    }
}
