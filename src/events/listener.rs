use async_trait::async_trait;

use super::TeamEvent;
use crate::FolioError;

/// Trait for handling team events asynchronously.
///
/// Implement this trait to forward events to a message bus, a webhook, an
/// audit table, etc. A returned error makes the dispatcher retry the same
/// listener up to its attempt budget; it never reaches the action that
/// produced the event.
///
/// # Example
///
/// ```rust,ignore
/// use folio::events::{Listener, TeamEvent};
/// use folio::FolioError;
/// use async_trait::async_trait;
///
/// struct KafkaListener {
///     producer: MyProducer,
/// }
///
/// #[async_trait]
/// impl Listener for KafkaListener {
///     async fn handle(&self, event: &TeamEvent) -> Result<(), FolioError> {
///         self.producer
///             .send("team-events", event.payload())
///             .await
///             .map_err(|e| FolioError::DownstreamUnavailable(e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &TeamEvent) -> Result<(), FolioError>;
}
