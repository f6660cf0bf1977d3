use super::add_members::{AddMembersAction, AddMembersInput, FailedMember};
use crate::events::NotificationDispatcher;
use crate::teams::{
    CreateRosterEntry, CreateTeam, Principal, RosterRepository, Team, TeamRepository, TeamRole,
    validate_team_name,
};
use crate::{DenyReason, FolioError, UserId};

#[derive(Debug, Clone)]
pub struct CreateTeamInput {
    pub name: String,
    pub creator: Principal,
    /// Added as `MEMBER` after the team exists.
    pub members: Vec<UserId>,
}

#[derive(Debug, Clone)]
pub struct CreateTeamOutput {
    pub team: Team,
    pub failed_members: Vec<FailedMember>,
}

/// Creates a team with the creator as `MAIN_MANAGER`.
///
/// This action:
/// 1. Verifies the creator holds a manager account
/// 2. Creates the team (names are unique)
/// 3. Inserts the creator as `MAIN_MANAGER`
/// 4. Adds the initial members, collecting failures instead of aborting
pub struct CreateTeamAction<T, R>
where
    T: TeamRepository,
    R: RosterRepository,
{
    add_members: AddMembersAction<T, R>,
}

impl<T: TeamRepository, R: RosterRepository> CreateTeamAction<T, R> {
    pub fn new(teams: T, roster: R, dispatcher: NotificationDispatcher) -> Self {
        Self {
            add_members: AddMembersAction::new(teams, roster, dispatcher),
        }
    }

    /// # Returns
    ///
    /// - `Ok(output)` - The team, plus initial members that were not added
    /// - `Err(FolioError::Forbidden(ManagerAccountRequired))` - Creator is not a manager account
    /// - `Err(FolioError::InvalidInput(_))` - Blank or overlong name
    /// - `Err(FolioError::Conflict(_))` - Name already taken
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "create_team", skip_all, err))]
    pub async fn execute(&self, input: CreateTeamInput) -> Result<CreateTeamOutput, FolioError> {
        if !input.creator.can_create_teams() {
            return Err(FolioError::Forbidden(DenyReason::ManagerAccountRequired));
        }
        let name = validate_team_name(&input.name)?;

        let team = self.add_members.teams().create(CreateTeam { name }).await?;

        self.add_members
            .roster()
            .create(CreateRosterEntry {
                team_id: team.id,
                user_id: input.creator.user_id,
                role: TeamRole::MainManager,
            })
            .await?;

        log::info!(
            target: "folio",
            "msg=\"team created\", team_id={}, name=\"{}\", user_id={}",
            team.id,
            team.name,
            input.creator.user_id
        );

        if input.members.is_empty() {
            return Ok(CreateTeamOutput {
                team,
                failed_members: Vec::new(),
            });
        }

        let failed_members = match self
            .add_members
            .execute(AddMembersInput {
                team_id: team.id,
                actor_id: input.creator.user_id,
                user_ids: input.members,
            })
            .await
        {
            Ok(output) => output.failed_members,
            Err(err) => {
                log::error!(
                    target: "folio",
                    "msg=\"initial members not added\", team_id={}, error=\"{}\"",
                    team.id,
                    err.error
                );
                err.output.failed_members
            }
        };

        Ok(CreateTeamOutput {
            team,
            failed_members,
        })
    }
}
