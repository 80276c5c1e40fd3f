//! Reward curves used for placements on standard routes.

use super::config::{GroupStep, TierStep};

/// Ceiling for a route holding `record_count` records: the last step reached.
pub fn tier_value(tiers: &[TierStep], record_count: i64) -> f64 {
    tiers
        .iter()
        .take_while(|step| step.min_records <= record_count)
        .last()
        .map(|step| step.ceiling)
        .unwrap_or(0.0)
}

/// Reward for ranks 1 through 10, zero outside that range.
pub fn top10_curve(ceiling: f64, rank: i64, fractions: &[f64]) -> f64 {
    if rank < 1 {
        return 0.0;
    }
    fractions
        .get((rank - 1) as usize)
        .map(|fraction| ceiling * fraction)
        .unwrap_or(0.0)
}

/// Reward for a player who beat `percentile` of the other records.
pub fn group_curve(ceiling: f64, percentile: f64, groups: &[GroupStep]) -> f64 {
    groups
        .iter()
        .find(|group| percentile >= group.min_percentile)
        .map(|group| ceiling * group.fraction)
        .unwrap_or(0.0)
}
