use async_trait::async_trait;

use crate::events::{Listener, TeamEvent};
use crate::{FolioError, TeamId};

/// Writes one audit line per roster change to the `folio::audit` log target.
///
/// Additions and removals log at separate levels so removals can be surfaced
/// on their own. Restricting to a single team drops events for other teams.
///
/// # Example
///
/// ```rust,ignore
/// use folio::events::NotificationDispatcher;
/// use folio::events::listeners::AuditLogListener;
///
/// let dispatcher = NotificationDispatcher::spawn(&config, |registry| {
///     registry.listen(AuditLogListener::new().removals_at(log::Level::Warn));
/// });
/// ```
#[derive(Debug, Clone)]
pub struct AuditLogListener {
    additions: log::Level,
    removals: log::Level,
    team: Option<TeamId>,
}

impl AuditLogListener {
    /// Logs every roster change at INFO.
    pub fn new() -> Self {
        Self {
            additions: log::Level::Info,
            removals: log::Level::Info,
            team: None,
        }
    }

    pub fn additions_at(mut self, level: log::Level) -> Self {
        self.additions = level;
        self
    }

    pub fn removals_at(mut self, level: log::Level) -> Self {
        self.removals = level;
        self
    }

    pub fn for_team(mut self, team_id: TeamId) -> Self {
        self.team = Some(team_id);
        self
    }

    /// `None` when the event belongs to a team this listener ignores.
    fn level_for(&self, event: &TeamEvent) -> Option<log::Level> {
        if self.team.is_some_and(|team| team != event.team_id()) {
            return None;
        }
        Some(if event.is_removal() {
            self.removals
        } else {
            self.additions
        })
    }
}

impl Default for AuditLogListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for AuditLogListener {
    async fn handle(&self, event: &TeamEvent) -> Result<(), FolioError> {
        let Some(level) = self.level_for(event) else {
            return Ok(());
        };

        log::log!(
            target: "folio::audit",
            level,
            "msg=\"roster changed\", event={}, team_id={}, subject_id={}, actor_id={}, at={}",
            event.name(),
            event.team_id(),
            event.subject_id(),
            event.actor_id(),
            event.timestamp().to_rfc3339()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UserId;

    fn events(team: TeamId) -> (TeamEvent, TeamEvent, TeamEvent) {
        let (actor, subject) = (UserId::new(), UserId::new());
        (
            TeamEvent::member_added(team, actor, subject),
            TeamEvent::member_removed(team, actor, subject),
            TeamEvent::manager_removed(team, actor, subject),
        )
    }

    #[test]
    fn test_removals_log_at_their_own_level() {
        let listener = AuditLogListener::new().removals_at(log::Level::Warn);
        let (added, removed, demoted) = events(TeamId::new());

        assert_eq!(listener.level_for(&added), Some(log::Level::Info));
        assert_eq!(listener.level_for(&removed), Some(log::Level::Warn));
        assert_eq!(listener.level_for(&demoted), Some(log::Level::Warn));
    }

    #[test]
    fn test_team_filter_skips_other_teams() {
        let team = TeamId::new();
        let listener = AuditLogListener::default()
            .for_team(team)
            .additions_at(log::Level::Debug);

        assert_eq!(listener.level_for(&events(team).0), Some(log::Level::Debug));
        assert_eq!(listener.level_for(&events(TeamId::new()).0), None);
    }

    #[tokio::test]
    async fn test_filtered_events_are_still_handled() {
        let listener = AuditLogListener::new().for_team(TeamId::new());
        let (added, removed, _) = events(TeamId::new());

        assert!(listener.handle(&added).await.is_ok());
        assert!(listener.handle(&removed).await.is_ok());
    }
}
