use async_trait::async_trait;

use super::models::{PlayerAccount, PlayerPreferences, PointsStanding};
use crate::storage::StoreError;

/// Persistence of per-player accounts and their point totals
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Records a connection, creating the account on first touch.
    async fn touch_account(
        &self,
        player_id: &str,
        player_name: &str,
        connected_at: i64,
    ) -> Result<PlayerAccount, StoreError>;

    /// Atomically adds `delta` to the player's total and returns the new total.
    ///
    /// Missing accounts are created with the delta as their starting total. An empty
    /// `player_name` keeps the stored name.
    async fn add_points(
        &self,
        player_id: &str,
        player_name: &str,
        delta: i64,
    ) -> Result<i64, StoreError>;

    async fn account(&self, player_id: &str) -> Result<Option<PlayerAccount>, StoreError>;

    /// Zeroes every total and returns the number of accounts touched.
    async fn reset_all_points(&self) -> Result<u64, StoreError>;

    /// Accounts with at least `min_points`, highest first
    async fn top_points(
        &self,
        limit: u32,
        min_points: i64,
    ) -> Result<Vec<PointsStanding>, StoreError>;

    /// Overwrites the preference flags, returning false when the account is absent.
    async fn update_preferences(
        &self,
        player_id: &str,
        preferences: &PlayerPreferences,
    ) -> Result<bool, StoreError>;
}
