use tokio::sync::mpsc::{self, error::TrySendError};

use super::{Listener, TeamEvent};
use crate::config::NotificationConfig;

/// Listeners that receive every dispatched event, in registration order.
pub struct ListenerRegistry {
    listeners: Vec<Box<dyn Listener>>,
}

impl ListenerRegistry {
    fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a listener to receive events.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    async fn deliver(&self, event: &TeamEvent, config: &NotificationConfig) {
        for listener in &self.listeners {
            let mut backoff = config.retry_backoff;
            let mut attempt = 1;

            loop {
                match listener.handle(event).await {
                    Ok(()) => break,
                    Err(e) if attempt < config.max_attempts => {
                        log::debug!(
                            target: "folio::events",
                            "msg=\"listener failed, retrying\", event={}, attempt={attempt}, error=\"{e}\"",
                            event.name()
                        );
                        tokio::time::sleep(backoff).await;
                        backoff = backoff.saturating_mul(2);
                        attempt += 1;
                    }
                    Err(e) => {
                        log::error!(
                            target: "folio::events",
                            "msg=\"event dropped after retries\", event={}, team_id={}, attempts={attempt}, error=\"{e}\"",
                            event.name(),
                            event.team_id()
                        );
                        break;
                    }
                }
            }
        }
    }
}

/// Hands team events to a background worker without blocking the caller.
///
/// `publish` never waits and never fails: a full queue or a stopped worker
/// drops the event with a warning. Clones share the same queue.
///
/// # Example
///
/// ```rust,ignore
/// use folio::config::NotificationConfig;
/// use folio::events::{NotificationDispatcher, listeners::AuditLogListener};
///
/// let dispatcher = NotificationDispatcher::spawn(&NotificationConfig::default(), |registry| {
///     registry.listen(AuditLogListener::new());
/// });
/// ```
#[derive(Debug, Clone, Default)]
pub struct NotificationDispatcher {
    sender: Option<mpsc::Sender<TeamEvent>>,
}

impl NotificationDispatcher {
    /// A dispatcher that discards every event.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Starts the worker task on the current tokio runtime.
    ///
    /// Without registered listeners, or outside a runtime, the returned
    /// dispatcher is [`disabled`](Self::disabled).
    pub fn spawn<F>(config: &NotificationConfig, f: F) -> Self
    where
        F: FnOnce(&mut ListenerRegistry),
    {
        let mut registry = ListenerRegistry::new();
        f(&mut registry);

        if registry.is_empty() {
            return Self::disabled();
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!(
                target: "folio::events",
                "msg=\"no tokio runtime, notifications disabled\""
            );
            return Self::disabled();
        };

        let (sender, mut receiver) = mpsc::channel::<TeamEvent>(config.queue_capacity.max(1));
        let config = config.clone();

        runtime.spawn(async move {
            while let Some(event) = receiver.recv().await {
                registry.deliver(&event, &config).await;
            }
        });

        Self {
            sender: Some(sender),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Queues an event for delivery.
    pub fn publish(&self, event: TeamEvent) {
        let Some(sender) = &self.sender else {
            return;
        };

        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!(
                    target: "folio::events",
                    "msg=\"notification queue full, event dropped\", event={}, team_id={}",
                    event.name(),
                    event.team_id()
                );
            }
            Err(TrySendError::Closed(event)) => {
                log::warn!(
                    target: "folio::events",
                    "msg=\"notification worker stopped, event dropped\", event={}, team_id={}",
                    event.name(),
                    event.team_id()
                );
            }
        }
    }
}
