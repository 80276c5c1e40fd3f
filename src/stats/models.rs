use serde::{Deserialize, Serialize};

/// Per-player aggregate state. `global_points` is a cache the recompute job can rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAccount {
    pub player_id: String,
    pub player_name: String,
    pub global_points: i64,
    pub times_connected: i64,
    pub last_connected: i64,
    #[serde(flatten)]
    pub preferences: PlayerPreferences,
}

impl PlayerAccount {
    pub fn new(player_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: player_name.into(),
            global_points: 0,
            times_connected: 0,
            last_connected: 0,
            preferences: PlayerPreferences::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPreferences {
    pub hide_timer_hud: bool,
    pub hide_keys: bool,
    pub sounds_enabled: bool,
    pub player_fov: i32,
    pub hud_type: i32,
    pub is_vip: bool,
}

impl Default for PlayerPreferences {
    fn default() -> Self {
        Self {
            hide_timer_hud: false,
            hide_keys: false,
            sounds_enabled: false,
            player_fov: 0,
            hud_type: 1,
            is_vip: false,
        }
    }
}

/// One row of the points ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsStanding {
    pub position: u32,
    pub player_id: String,
    pub player_name: String,
    pub global_points: i64,
}
