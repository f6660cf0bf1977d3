use crate::events::{NotificationDispatcher, TeamEvent};
use crate::teams::{RosterRepository, TeamRepository, TeamRole};
use crate::{DenyReason, FolioError, TeamId, UserId};

#[derive(Debug, Clone, Copy)]
pub struct RemoveFromTeamInput {
    pub team_id: TeamId,
    pub actor_id: UserId,
    /// The user being removed.
    pub user_id: UserId,
}

async fn require_team<T: TeamRepository>(teams: &T, team_id: TeamId) -> Result<(), FolioError> {
    teams
        .find_by_id(team_id)
        .await?
        .map(|_| ())
        .ok_or(FolioError::NotFound)
}

/// Removes a plain member from a team. Managers only.
pub struct RemoveMemberAction<T, R>
where
    T: TeamRepository,
    R: RosterRepository,
{
    teams: T,
    roster: R,
    dispatcher: NotificationDispatcher,
}

impl<T: TeamRepository, R: RosterRepository> RemoveMemberAction<T, R> {
    pub fn new(teams: T, roster: R, dispatcher: NotificationDispatcher) -> Self {
        Self {
            teams,
            roster,
            dispatcher,
        }
    }

    /// Managers are never removed through this path.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Roster entry deleted, `member-removed` published
    /// - `Err(FolioError::NotFound)` - Team or target entry does not exist
    /// - `Err(FolioError::Forbidden(NotTeamManager))` - Actor does not manage the team
    /// - `Err(FolioError::Forbidden(CannotRemoveManager))` - Target is a manager
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "remove_member", skip_all, err))]
    pub async fn execute(&self, input: RemoveFromTeamInput) -> Result<(), FolioError> {
        require_team(&self.teams, input.team_id).await?;

        let actor_role = self.roster.find_role(input.team_id, input.actor_id).await?;
        if !actor_role.is_some_and(|role| role.is_manager()) {
            return Err(FolioError::Forbidden(DenyReason::NotTeamManager));
        }

        let target_role = self
            .roster
            .find_role(input.team_id, input.user_id)
            .await?
            .ok_or(FolioError::NotFound)?;
        if target_role != TeamRole::Member {
            return Err(FolioError::Forbidden(DenyReason::CannotRemoveManager));
        }

        self.roster.delete(input.team_id, input.user_id).await?;

        log::info!(
            target: "folio",
            "msg=\"member removed\", team_id={}, member_id={}, user_id={}",
            input.team_id,
            input.user_id,
            input.actor_id
        );

        self.dispatcher.publish(TeamEvent::member_removed(
            input.team_id,
            input.actor_id,
            input.user_id,
        ));

        Ok(())
    }
}

/// Removes a manager from a team. Only the main manager may do this.
pub struct RemoveManagerAction<T, R>
where
    T: TeamRepository,
    R: RosterRepository,
{
    teams: T,
    roster: R,
    dispatcher: NotificationDispatcher,
}

impl<T: TeamRepository, R: RosterRepository> RemoveManagerAction<T, R> {
    pub fn new(teams: T, roster: R, dispatcher: NotificationDispatcher) -> Self {
        Self {
            teams,
            roster,
            dispatcher,
        }
    }

    /// # Returns
    ///
    /// - `Ok(())` - Roster entry deleted, `manager-removed` published
    /// - `Err(FolioError::Forbidden(CannotRemoveSelf))` - Actor targeted themself
    /// - `Err(FolioError::NotFound)` - Team or target entry does not exist
    /// - `Err(FolioError::Forbidden(NotMainManager))` - Actor is not the main manager
    /// - `Err(FolioError::Forbidden(TargetNotManager))` - Target holds another role
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "remove_manager", skip_all, err)
    )]
    pub async fn execute(&self, input: RemoveFromTeamInput) -> Result<(), FolioError> {
        if input.actor_id == input.user_id {
            return Err(FolioError::Forbidden(DenyReason::CannotRemoveSelf));
        }

        require_team(&self.teams, input.team_id).await?;

        let actor_role = self.roster.find_role(input.team_id, input.actor_id).await?;
        if actor_role != Some(TeamRole::MainManager) {
            return Err(FolioError::Forbidden(DenyReason::NotMainManager));
        }

        let target_role = self
            .roster
            .find_role(input.team_id, input.user_id)
            .await?
            .ok_or(FolioError::NotFound)?;
        if target_role != TeamRole::Manager {
            return Err(FolioError::Forbidden(DenyReason::TargetNotManager));
        }

        self.roster.delete(input.team_id, input.user_id).await?;

        log::info!(
            target: "folio",
            "msg=\"manager removed\", team_id={}, manager_id={}, user_id={}",
            input.team_id,
            input.user_id,
            input.actor_id
        );

        self.dispatcher.publish(TeamEvent::manager_removed(
            input.team_id,
            input.actor_id,
            input.user_id,
        ));

        Ok(())
    }
}
