pub mod calculator;
pub mod config;
pub mod curves;
pub mod rules;
pub mod styles;

pub use calculator::{PointsCalculator, PointsCalculatorBuilder};
pub use config::{GroupStep, ScoringConfig, StyleMultiplier, TierStep};
pub use styles::Style;

use crate::leaderboard::Placement;
use crate::records::Route;

/// Priority constants for points rules.
/// Lower values run first. Later rules see the running total of earlier ones.
pub mod rule_priority {
    /// Participation reward
    pub const BASELINE: u32 = 100;
    /// Tier, top-10 and group rewards on standard routes
    pub const PLACEMENT: u32 = 200;
    /// Style multiplier on main routes
    pub const STYLE_MULTIPLIER: u32 = 300;
    /// Zeroes bonus routes ridden with a non-default style
    pub const ROUTE_KIND: u32 = 400;
    /// Zeroes repeat completions past the cap
    pub const ANTI_FARM: u32 = 500;
}

/// One completion as seen by the points rules
#[derive(Debug, Clone, Copy)]
pub struct ScoringAttempt<'a> {
    pub route: &'a Route,
    pub ticks: i64,
    pub is_improvement: bool,
    /// Completions stored for the player on the route after this one, 0 when replaying
    /// history
    pub completion_count: i64,
    /// Leaderboard context captured before the write
    pub placement: Option<&'a Placement>,
}

pub struct ScoringContext<'a> {
    pub config: &'a ScoringConfig,
    /// Total produced by the rules that already ran
    pub current: f64,
}

impl<'a> ScoringContext<'a> {
    pub fn new(config: &'a ScoringConfig, current: f64) -> Self {
        Self { config, current }
    }
}

pub trait PointsRule: Send + Sync {
    /// Returns the new running total.
    fn apply(&self, attempt: &ScoringAttempt, context: &ScoringContext) -> f64;

    fn priority(&self) -> u32;

    fn name(&self) -> &'static str;
}
