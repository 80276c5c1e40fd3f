use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, FromRepr};

/// Built-in movement rulesets. The discriminant is the stored style id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, FromRepr, Display,
)]
#[repr(u16)]
pub enum Style {
    #[strum(to_string = "Normal")]
    Normal = 0,
    #[strum(to_string = "Low Gravity")]
    LowGravity = 1,
    #[strum(to_string = "Sideways")]
    Sideways = 2,
    #[strum(to_string = "OnlyW")]
    OnlyW = 3,
    #[strum(to_string = "400vel")]
    Velocity400 = 4,
    #[strum(to_string = "High Gravity")]
    HighGravity = 5,
    #[strum(to_string = "OnlyA")]
    OnlyA = 6,
    #[strum(to_string = "OnlyD")]
    OnlyD = 7,
    #[strum(to_string = "OnlyS")]
    OnlyS = 8,
    #[strum(to_string = "Half Sideways")]
    HalfSideways = 9,
    #[strum(to_string = "Fast Forward")]
    FastForward = 10,
    #[strum(to_string = "Parachute")]
    Parachute = 11,
    #[strum(to_string = "TAS")]
    Tas = 12,
}

impl Style {
    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn from_id(id: u16) -> Option<Self> {
        Self::from_repr(id)
    }

    /// Multiplier applied to the baseline when points for this style are enabled
    pub fn default_multiplier(self) -> f64 {
        match self {
            Style::Normal | Style::HighGravity => 1.0,
            Style::LowGravity | Style::FastForward | Style::Parachute => 0.8,
            Style::Sideways | Style::OnlyW | Style::HalfSideways => 1.3,
            Style::Velocity400 => 1.5,
            Style::OnlyA | Style::OnlyD | Style::OnlyS => 1.33,
            Style::Tas => 0.0,
        }
    }

    pub fn all_ids() -> Vec<u16> {
        Style::iter().map(Style::id).collect()
    }
}
