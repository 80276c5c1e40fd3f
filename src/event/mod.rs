pub mod bus;
pub mod dispatcher;
pub mod events;
pub mod handler;
pub mod notifier;

pub use bus::EventBus;
pub use dispatcher::EventDispatcher;
pub use events::TimerEvent;
pub use handler::{EventError, EventHandler};
pub use notifier::ChatNotifier;
