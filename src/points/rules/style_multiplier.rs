use super::super::{rule_priority, PointsRule, ScoringAttempt, ScoringContext};

/// Scales main-route completions ridden with a non-default style.
pub struct StyleMultiplierRule;

impl StyleMultiplierRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StyleMultiplierRule {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsRule for StyleMultiplierRule {
    fn apply(&self, attempt: &ScoringAttempt, context: &ScoringContext) -> f64 {
        let route = attempt.route;
        if route.is_default_style() || route.is_bonus() || !context.config.style_points_enabled {
            return context.current;
        }

        context.current * context.config.style_multiplier(route.style)
    }

    fn priority(&self) -> u32 {
        rule_priority::STYLE_MULTIPLIER
    }

    fn name(&self) -> &'static str {
        "style_multiplier"
    }
}
