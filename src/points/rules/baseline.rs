use super::super::{rule_priority, PointsRule, ScoringAttempt, ScoringContext};

/// Pays the configured participation reward for every scored completion.
pub struct BaselineRule;

impl BaselineRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BaselineRule {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsRule for BaselineRule {
    fn apply(&self, _attempt: &ScoringAttempt, context: &ScoringContext) -> f64 {
        context.current + context.config.baseline
    }

    fn priority(&self) -> u32 {
        rule_priority::BASELINE
    }

    fn name(&self) -> &'static str {
        "baseline"
    }
}
