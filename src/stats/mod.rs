pub mod handlers;
pub mod models;
pub mod repository;

pub use handlers::{connect_player, get_player, update_preferences};
pub use models::{PlayerAccount, PlayerPreferences, PointsStanding};
pub use repository::StatsStore;
