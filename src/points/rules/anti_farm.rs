use super::super::{rule_priority, PointsRule, ScoringAttempt, ScoringContext};

/// Stops paying for repeat completions once the cap is passed, unless the run is a
/// personal best.
pub struct AntiFarmGuard;

impl AntiFarmGuard {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AntiFarmGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl PointsRule for AntiFarmGuard {
    fn apply(&self, attempt: &ScoringAttempt, context: &ScoringContext) -> f64 {
        match context.config.completion_cap() {
            Some(cap) if attempt.completion_count > cap && !attempt.is_improvement => 0.0,
            _ => context.current,
        }
    }

    fn priority(&self) -> u32 {
        rule_priority::ANTI_FARM
    }

    fn name(&self) -> &'static str {
        "anti_farm_guard"
    }
}
