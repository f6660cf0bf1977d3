use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::{TeamId, UserId};

/// Roster change events emitted by team actions after the change commits.
///
/// Delivery is at-most-once: a dropped or undeliverable event is logged and
/// never retried past the dispatcher's attempt budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TeamEvent {
    MemberAdded {
        team_id: TeamId,
        actor_id: UserId,
        subject_id: UserId,
        at: DateTime<Utc>,
    },
    MemberRemoved {
        team_id: TeamId,
        actor_id: UserId,
        subject_id: UserId,
        at: DateTime<Utc>,
    },
    ManagerRemoved {
        team_id: TeamId,
        actor_id: UserId,
        subject_id: UserId,
        at: DateTime<Utc>,
    },
}

impl TeamEvent {
    pub fn member_added(team_id: TeamId, actor_id: UserId, subject_id: UserId) -> Self {
        Self::MemberAdded {
            team_id,
            actor_id,
            subject_id,
            at: Utc::now(),
        }
    }

    pub fn member_removed(team_id: TeamId, actor_id: UserId, subject_id: UserId) -> Self {
        Self::MemberRemoved {
            team_id,
            actor_id,
            subject_id,
            at: Utc::now(),
        }
    }

    pub fn manager_removed(team_id: TeamId, actor_id: UserId, subject_id: UserId) -> Self {
        Self::ManagerRemoved {
            team_id,
            actor_id,
            subject_id,
            at: Utc::now(),
        }
    }

    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MemberAdded { .. } => "team.member.added",
            Self::MemberRemoved { .. } => "team.member.removed",
            Self::ManagerRemoved { .. } => "team.manager.removed",
        }
    }

    pub fn team_id(&self) -> TeamId {
        match self {
            Self::MemberAdded { team_id, .. }
            | Self::MemberRemoved { team_id, .. }
            | Self::ManagerRemoved { team_id, .. } => *team_id,
        }
    }

    /// The manager who made the change.
    pub fn actor_id(&self) -> UserId {
        match self {
            Self::MemberAdded { actor_id, .. }
            | Self::MemberRemoved { actor_id, .. }
            | Self::ManagerRemoved { actor_id, .. } => *actor_id,
        }
    }

    /// The user whose membership changed.
    pub fn subject_id(&self) -> UserId {
        match self {
            Self::MemberAdded { subject_id, .. }
            | Self::MemberRemoved { subject_id, .. }
            | Self::ManagerRemoved { subject_id, .. } => *subject_id,
        }
    }

    pub fn is_removal(&self) -> bool {
        !matches!(self, Self::MemberAdded { .. })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::MemberAdded { at, .. }
            | Self::MemberRemoved { at, .. }
            | Self::ManagerRemoved { at, .. } => *at,
        }
    }

    /// Wire payload for message-bus listeners.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({ "event": self.name() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let (team, actor, subject) = (TeamId::new(), UserId::new(), UserId::new());

        assert_eq!(
            TeamEvent::member_added(team, actor, subject).name(),
            "team.member.added"
        );
        assert_eq!(
            TeamEvent::member_removed(team, actor, subject).name(),
            "team.member.removed"
        );
        assert_eq!(
            TeamEvent::manager_removed(team, actor, subject).name(),
            "team.manager.removed"
        );
    }

    #[test]
    fn test_event_accessors() {
        let (team, actor, subject) = (TeamId::new(), UserId::new(), UserId::new());
        let event = TeamEvent::member_removed(team, actor, subject);

        assert_eq!(event.team_id(), team);
        assert_eq!(event.subject_id(), subject);
        assert!(event.timestamp() <= Utc::now());
    }

    #[test]
    fn test_event_payload() {
        let (team, actor, subject) = (TeamId::new(), UserId::new(), UserId::new());
        let payload = TeamEvent::manager_removed(team, actor, subject).payload();

        assert_eq!(payload["event"], "manager_removed");
        assert_eq!(payload["team_id"], team.to_string());
        assert_eq!(payload["actor_id"], actor.to_string());
        assert_eq!(payload["subject_id"], subject.to_string());
    }
}
