use super::super::{rule_priority, PointsRule, ScoringAttempt, ScoringContext};

/// Bonus routes ridden with a non-default style earn nothing.
pub struct BonusStyleGuard;

impl BonusStyleGuard {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BonusStyleGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsRule for BonusStyleGuard {
    fn apply(&self, attempt: &ScoringAttempt, context: &ScoringContext) -> f64 {
        if attempt.route.is_bonus() && !attempt.route.is_default_style() {
            0.0
        } else {
            context.current
        }
    }

    fn priority(&self) -> u32 {
        rule_priority::ROUTE_KIND
    }

    fn name(&self) -> &'static str {
        "bonus_style_guard"
    }
}
