use tokio::sync::broadcast;
use tracing::debug;

use super::events::TimerEvent;

const DEFAULT_CAPACITY: usize = 1000;

/// Event bus for distributing events throughout the application
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TimerEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` undelivered events per receiver
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Emits an event to every subscriber, returning how many received it
    pub fn emit(&self, event: TimerEvent) -> usize {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(event_type, receivers, "Event emitted");
                receivers
            }
            Err(_) => {
                debug!(event_type, "Event emitted with no receivers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
