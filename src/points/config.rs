use serde::{Deserialize, Serialize};

use super::styles::Style;
use crate::config::ConfigError;

/// Number of placements paid from the top-10 curve
pub const TOP_PLACES: usize = 10;

/// Ceiling applied once a route holds at least `min_records` records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierStep {
    pub min_records: i64,
    pub ceiling: f64,
}

/// Fraction of the ceiling paid once a player beats `min_percentile` of the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupStep {
    pub min_percentile: f64,
    pub fraction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleMultiplier {
    pub style: u16,
    pub multiplier: f64,
}

/// Constants of the points algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub enabled: bool,
    /// Participation reward paid for every scored completion
    pub baseline: f64,
    /// Completions per route that keep paying without an improvement, 0 disables the cap
    pub max_completions: u32,
    pub style_points_enabled: bool,
    pub style_multipliers: Vec<StyleMultiplier>,
    /// Ascending by `min_records`
    pub tiers: Vec<TierStep>,
    /// Fractions of the tier ceiling for ranks 1 through 10
    pub top10_fractions: Vec<f64>,
    /// Descending by `min_percentile`; the first step reached pays
    pub groups: Vec<GroupStep>,
    /// Accounts below this total are left out of the points ranking
    pub min_points_for_rank: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            baseline: 25.0,
            max_completions: 10,
            style_points_enabled: true,
            style_multipliers: Vec::new(),
            tiers: [
                (0, 100.0),
                (10, 200.0),
                (25, 350.0),
                (50, 500.0),
                (100, 750.0),
                (250, 1000.0),
            ]
            .into_iter()
            .map(|(min_records, ceiling)| TierStep {
                min_records,
                ceiling,
            })
            .collect(),
            top10_fractions: vec![1.0, 0.8, 0.75, 0.7, 0.65, 0.6, 0.55, 0.5, 0.45, 0.4],
            groups: [
                (0.96875, 0.3),
                (0.9375, 0.25),
                (0.875, 0.2),
                (0.75, 0.15),
                (0.5, 0.1),
            ]
            .into_iter()
            .map(|(min_percentile, fraction)| GroupStep {
                min_percentile,
                fraction,
            })
            .collect(),
            min_points_for_rank: 0,
        }
    }
}

impl ScoringConfig {
    pub fn completion_cap(&self) -> Option<i64> {
        (self.max_completions > 0).then(|| i64::from(self.max_completions))
    }

    /// Configured multiplier for `style`, falling back to the built-in table, then 1.
    pub fn style_multiplier(&self, style: u16) -> f64 {
        self.style_multipliers
            .iter()
            .find(|m| m.style == style)
            .map(|m| m.multiplier)
            .or_else(|| Style::from_id(style).map(Style::default_multiplier))
            .unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(msg: impl Into<String>) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid(msg.into()))
        }

        if !(self.baseline >= 0.0) {
            return invalid("scoring.baseline must be non-negative");
        }
        if self.tiers.is_empty() {
            return invalid("scoring.tiers must not be empty");
        }
        if self.tiers.iter().any(|t| t.min_records < 0 || !(t.ceiling >= 0.0)) {
            return invalid("scoring.tiers must have non-negative bounds and ceilings");
        }
        if self
            .tiers
            .windows(2)
            .any(|w| w[0].min_records >= w[1].min_records)
        {
            return invalid("scoring.tiers must be strictly ascending by min_records");
        }
        if self.top10_fractions.len() != TOP_PLACES {
            return invalid(format!(
                "scoring.top10_fractions must hold {} values",
                TOP_PLACES
            ));
        }
        if self.top10_fractions.iter().any(|f| !(*f >= 0.0)) {
            return invalid("scoring.top10_fractions must be non-negative");
        }
        if self.top10_fractions.windows(2).any(|w| w[1] > w[0]) {
            return invalid("scoring.top10_fractions must not increase with rank");
        }
        if self
            .groups
            .iter()
            .any(|g| !(0.0..=1.0).contains(&g.min_percentile) || !(g.fraction >= 0.0))
        {
            return invalid("scoring.groups percentiles must lie in [0, 1] with non-negative fractions");
        }
        if self
            .groups
            .windows(2)
            .any(|w| w[0].min_percentile <= w[1].min_percentile)
        {
            return invalid("scoring.groups must be strictly descending by min_percentile");
        }
        if self.style_multipliers.iter().any(|m| !(m.multiplier >= 0.0)) {
            return invalid("scoring.style_multipliers must be non-negative");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        ScoringConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_increasing_top10() {
        let mut config = ScoringConfig::default();
        config.top10_fractions[3] = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_wrong_top10_length() {
        let mut config = ScoringConfig::default();
        config.top10_fractions.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unsorted_tiers() {
        let mut config = ScoringConfig::default();
        config.tiers.swap(1, 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_baseline() {
        let config = ScoringConfig {
            baseline: -1.0,
            ..ScoringConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_style_multiplier_override_and_fallback() {
        let config = ScoringConfig {
            style_multipliers: vec![StyleMultiplier {
                style: 2,
                multiplier: 2.0,
            }],
            ..ScoringConfig::default()
        };

        assert_eq!(config.style_multiplier(2), 2.0);
        assert_eq!(config.style_multiplier(4), 1.5);
        assert_eq!(config.style_multiplier(99), 1.0);
    }

    #[test]
    fn test_zero_cap_disables_guard() {
        let config = ScoringConfig {
            max_completions: 0,
            ..ScoringConfig::default()
        };
        assert_eq!(config.completion_cap(), None);
        assert_eq!(ScoringConfig::default().completion_cap(), Some(10));
    }
}
