use async_trait::async_trait;

use crate::FolioError;
use crate::events::{Listener, TeamEvent};

/// Emits team events as tracing events.
///
/// Requires the `tracing` feature to be enabled.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &TeamEvent) -> Result<(), FolioError> {
        tracing::info!(
            target: "folio::events",
            event_name = event.name(),
            team_id = %event.team_id(),
            subject_id = %event.subject_id(),
            "team event"
        );
        Ok(())
    }
}
