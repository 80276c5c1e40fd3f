mod anti_farm;
mod baseline;
mod placement;
mod route_kind;
mod style_multiplier;

pub use anti_farm::AntiFarmGuard;
pub use baseline::BaselineRule;
pub use placement::PlacementRule;
pub use route_kind::BonusStyleGuard;
pub use style_multiplier::StyleMultiplierRule;
