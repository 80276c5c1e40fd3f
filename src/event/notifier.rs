use async_trait::async_trait;
use tracing::info;

use super::{
    events::TimerEvent,
    handler::{EventError, EventHandler},
};
use crate::points::Style;
use crate::records::{format_ticks, Route};

/// Turns committed facts into player-facing chat lines.
///
/// The game server relays whatever this handler logs under the `chat` target.
pub struct ChatNotifier;

impl ChatNotifier {
    pub fn new() -> Self {
        Self
    }

    pub fn format_message(event: &TimerEvent) -> Option<String> {
        match event {
            TimerEvent::RecordImproved {
                player_name,
                route,
                previous_best,
                new_best,
                rank,
                ..
            } => {
                let mut message = format!(
                    "{} finished {} in {}",
                    player_name,
                    describe_route(route),
                    format_ticks(*new_best)
                );
                if let Some(previous) = previous_best {
                    message.push_str(&format!(" (-{})", format_ticks(previous - new_best)));
                }
                match rank {
                    Some(1) => message.push_str(" and set a new server record!"),
                    Some(rank) => message.push_str(&format!(", rank #{}", rank)),
                    None => {}
                }
                Some(message)
            }
            TimerEvent::PointsAwarded {
                player_name,
                delta,
                new_total,
                ..
            } if *delta > 0 => Some(format!(
                "{} gained +{} points ({})",
                player_name, delta, new_total
            )),
            TimerEvent::StageImproved {
                route,
                stage,
                new_best,
                ..
            } => Some(format!(
                "Stage {} of {}: {}",
                stage,
                describe_route(route),
                format_ticks(*new_best)
            )),
            _ => None,
        }
    }
}

impl Default for ChatNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_route(route: &Route) -> String {
    let mut description = route.map_name.clone();
    if route.is_bonus() {
        description.push_str(&format!(" bonus {}", route.bonus));
    }
    if !route.is_default_style() {
        match Style::from_id(route.style) {
            Some(style) => description.push_str(&format!(" [{}]", style)),
            None => description.push_str(&format!(" [style {}]", route.style)),
        }
    }
    description
}

#[async_trait]
impl EventHandler for ChatNotifier {
    async fn handle(&self, event: &TimerEvent) -> Result<(), EventError> {
        if let Some(message) = Self::format_message(event) {
            info!(target: "chat", player_id = ?event.player_id(), "{}", message);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ChatNotifier"
    }
}
