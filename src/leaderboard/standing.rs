use serde::{Deserialize, Serialize};

use crate::records::RouteStanding;

/// Where a time lands on a route, captured before the time is written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Records stored for the route, the player's own included
    pub record_count: i64,
    /// 1 + records strictly faster; equal times share a rank
    pub rank: i64,
    /// Share of other players' records strictly slower, 1.0 with no other records
    pub percentile: f64,
    pub route_best: Option<i64>,
}

impl Placement {
    /// True when the time would take the #1 spot outright, or the route is empty.
    pub fn beats_route_record(&self, ticks: i64) -> bool {
        self.route_best.map_or(true, |best| ticks < best)
    }
}

impl From<RouteStanding> for Placement {
    fn from(standing: RouteStanding) -> Self {
        Self {
            record_count: standing.total,
            rank: standing.faster + 1,
            percentile: percentile(standing.slower_others, standing.others),
            route_best: standing.route_best,
        }
    }
}

pub fn percentile(slower_others: i64, others: i64) -> f64 {
    if others <= 0 {
        1.0
    } else {
        slower_others as f64 / others as f64
    }
}

/// Standing of a stored record within its route's ascending list of best times.
///
/// `sorted_ticks` must contain the record itself, so it is counted in the total and
/// excluded from the others.
pub fn standing_within(sorted_ticks: &[i64], ticks: i64) -> RouteStanding {
    let total = sorted_ticks.len() as i64;
    let faster = sorted_ticks.partition_point(|t| *t < ticks) as i64;
    let not_slower = sorted_ticks.partition_point(|t| *t <= ticks) as i64;

    RouteStanding {
        total,
        faster,
        others: (total - 1).max(0),
        slower_others: total - not_slower,
        route_best: sorted_ticks.first().copied(),
    }
}
