use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::{
    bus::EventBus,
    events::TimerEvent,
    handler::{EventError, EventHandler},
};

/// Feeds events from the bus to registered handlers
///
/// Each handler runs in its own task with a timeout, and retryable failures are retried
/// with exponential backoff. One failing handler never blocks the others.
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
    event_bus: EventBus,
    handler_timeout: Duration,
    max_retries: u32,
}

impl EventDispatcher {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            handlers: Vec::new(),
            event_bus,
            handler_timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        info!(handler_name = handler.name(), "Registering event handler");
        self.handlers.push(handler);
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Subscribes to the bus and spawns the dispatch loop.
    ///
    /// The loop ends once every bus handle has been dropped.
    pub fn start_listening(self) -> JoinHandle<()> {
        let handlers = self.handlers;
        let mut receiver = self.event_bus.subscribe();
        let handler_timeout = self.handler_timeout;
        let max_retries = self.max_retries;
        drop(self.event_bus);

        info!(
            handler_count = handlers.len(),
            timeout_ms = handler_timeout.as_millis() as u64,
            max_retries,
            "Starting event dispatcher"
        );

        tokio::spawn(async move {
            loop {
                let event = match receiver.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event dispatcher lagged behind, events dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                debug!(
                    event_type = event.event_type(),
                    handlers = handlers.len(),
                    "Dispatching event"
                );

                for handler in &handlers {
                    let event = event.clone();
                    let handler = Arc::clone(handler);

                    tokio::spawn(async move {
                        if let Err(e) =
                            Self::handle_with_retry(handler, event, handler_timeout, max_retries)
                                .await
                        {
                            error!(error = ?e, "Handler failed permanently");
                        }
                    });
                }
            }

            info!("Event dispatcher stopped listening");
        })
    }

    async fn handle_with_retry(
        handler: Arc<dyn EventHandler>,
        event: TimerEvent,
        handler_timeout: Duration,
        max_retries: u32,
    ) -> Result<(), EventError> {
        let handler_name = handler.name();
        let event_type = event.event_type();
        let mut attempt = 0;

        loop {
            let error = match timeout(handler_timeout, handler.handle(&event)).await {
                Ok(Ok(())) => {
                    if attempt > 0 {
                        info!(
                            handler = handler_name,
                            event_type,
                            attempt = attempt + 1,
                            "Handler succeeded after retry"
                        );
                    }
                    return Ok(());
                }
                Ok(Err(e)) => e,
                Err(_elapsed) => EventError::Timeout,
            };

            if !error.is_retryable() || attempt >= max_retries {
                error!(
                    handler = handler_name,
                    event_type,
                    attempt = attempt + 1,
                    error = ?error,
                    "Handler gave up"
                );
                return Err(error);
            }

            warn!(
                handler = handler_name,
                event_type,
                attempt = attempt + 1,
                error = ?error,
                "Handler failed, will retry"
            );
            let delay = Duration::from_millis(100 * 2_u64.pow(attempt));
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
