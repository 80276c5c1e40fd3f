use super::super::curves::{group_curve, tier_value, top10_curve};
use super::super::config::TOP_PLACES;
use super::super::{rule_priority, PointsRule, ScoringAttempt, ScoringContext};

/// Rewards placement on standard routes.
///
/// The route's record count picks a tier ceiling. Ranks inside the top 10 are paid from
/// the top-10 curve, everyone else from the percentile groups.
pub struct PlacementRule;

impl PlacementRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlacementRule {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsRule for PlacementRule {
    fn apply(&self, attempt: &ScoringAttempt, context: &ScoringContext) -> f64 {
        let placement = match attempt.placement {
            Some(placement) if attempt.route.is_standard() => placement,
            _ => return context.current,
        };
        let config = context.config;
        let ceiling = tier_value(&config.tiers, placement.record_count);

        let reward = if placement.rank <= TOP_PLACES as i64 {
            top10_curve(ceiling, placement.rank, &config.top10_fractions)
        } else {
            group_curve(ceiling, placement.percentile, &config.groups)
        };

        context.current + reward
    }

    fn priority(&self) -> u32 {
        rule_priority::PLACEMENT
    }

    fn name(&self) -> &'static str {
        "placement"
    }
}
