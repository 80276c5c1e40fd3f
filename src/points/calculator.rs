use std::sync::Arc;
use tracing::trace;

use super::rules::{
    AntiFarmGuard, BaselineRule, BonusStyleGuard, PlacementRule, StyleMultiplierRule,
};
use super::{PointsRule, ScoringAttempt, ScoringConfig, ScoringContext};

/// Turns a completion and its leaderboard context into a point award.
///
/// Pure: the calculator reads nothing but its inputs and configuration.
pub struct PointsCalculator {
    config: ScoringConfig,
    rules: Vec<Arc<dyn PointsRule>>,
}

impl PointsCalculator {
    pub fn builder(config: ScoringConfig) -> PointsCalculatorBuilder {
        PointsCalculatorBuilder::new(config)
    }

    /// Calculator with the standard rule chain
    pub fn new(config: ScoringConfig) -> Self {
        Self::builder(config).with_default_rules().build()
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn calculate(&self, attempt: &ScoringAttempt) -> u32 {
        let mut current = 0.0;

        for rule in &self.rules {
            let context = ScoringContext::new(&self.config, current);
            current = rule.apply(attempt, &context);
            trace!(rule = rule.name(), value = current, "Points rule applied");
        }

        if current.is_finite() {
            current.round().max(0.0) as u32
        } else {
            0
        }
    }
}

pub struct PointsCalculatorBuilder {
    config: ScoringConfig,
    rules: Vec<Arc<dyn PointsRule>>,
}

impl PointsCalculatorBuilder {
    fn new(config: ScoringConfig) -> Self {
        Self {
            config,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Arc<dyn PointsRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_default_rules(self) -> Self {
        self.with_rule(Arc::new(BaselineRule::new()))
            .with_rule(Arc::new(PlacementRule::new()))
            .with_rule(Arc::new(StyleMultiplierRule::new()))
            .with_rule(Arc::new(BonusStyleGuard::new()))
            .with_rule(Arc::new(AntiFarmGuard::new()))
    }

    pub fn build(mut self) -> PointsCalculator {
        self.rules.sort_by_key(|rule| rule.priority());

        PointsCalculator {
            config: self.config,
            rules: self.rules,
        }
    }
}
