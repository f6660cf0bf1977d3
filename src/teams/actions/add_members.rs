use std::collections::HashSet;
use std::fmt;

use crate::events::{NotificationDispatcher, TeamEvent};
use crate::teams::{CreateRosterEntry, RosterRepository, TeamRepository, TeamRole};
use crate::{DenyReason, FolioError, TeamId, UserId};

#[derive(Debug, Clone)]
pub struct AddMembersInput {
    pub team_id: TeamId,
    pub actor_id: UserId,
    pub user_ids: Vec<UserId>,
}

/// A candidate that was not added, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMember {
    pub user_id: UserId,
    /// `Conflict` for users already on the team or repeated in the request.
    pub error: FolioError,
}

/// Per-request outcome of adding members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddMembersOutput {
    pub added: usize,
    pub failed: usize,
    pub failed_members: Vec<FailedMember>,
}

impl AddMembersOutput {
    fn all_failed(user_ids: Vec<UserId>, error: &FolioError) -> Self {
        let mut output = Self::default();
        for user_id in user_ids {
            output.fail(user_id, error.clone());
        }
        output
    }

    fn fail(&mut self, user_id: UserId, error: FolioError) {
        self.failed += 1;
        self.failed_members.push(FailedMember { user_id, error });
    }

    /// Ids of the users that were not added, in request order.
    pub fn failed_ids(&self) -> Vec<UserId> {
        self.failed_members.iter().map(|m| m.user_id).collect()
    }
}

/// An add-members call that added nobody. Every candidate is in `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMembersError {
    pub error: FolioError,
    pub output: AddMembersOutput,
}

impl fmt::Display for AddMembersError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} members not added)", self.error, self.output.failed)
    }
}

impl std::error::Error for AddMembersError {}

impl From<AddMembersError> for FolioError {
    fn from(err: AddMembersError) -> Self {
        err.error
    }
}

/// Adds users to a team as `MEMBER`.
///
/// This action:
/// 1. Validates the team exists
/// 2. Verifies the actor is a manager of the team
/// 3. Skips users already on the roster, reporting them as failed
/// 4. Inserts the rest, publishing `member-added` for each insert
pub struct AddMembersAction<T, R>
where
    T: TeamRepository,
    R: RosterRepository,
{
    teams: T,
    roster: R,
    dispatcher: NotificationDispatcher,
}

impl<T: TeamRepository, R: RosterRepository> AddMembersAction<T, R> {
    pub fn new(teams: T, roster: R, dispatcher: NotificationDispatcher) -> Self {
        Self {
            teams,
            roster,
            dispatcher,
        }
    }

    pub(crate) fn teams(&self) -> &T {
        &self.teams
    }

    pub(crate) fn roster(&self) -> &R {
        &self.roster
    }

    /// Duplicates are not errors; they show up in `failed_members` as
    /// `Conflict`.
    ///
    /// # Returns
    ///
    /// - `Ok(output)` - Counts of added and failed users
    /// - `Err(AddMembersError)` - Nothing was added; `output` lists every
    ///   candidate as failed and `error` is one of:
    ///   - `FolioError::NotFound` - Team does not exist
    ///   - `FolioError::Forbidden(NotTeamManager)` - Actor is not a manager
    ///   - any other error - Reading the roster failed
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "add_members", skip_all, err))]
    pub async fn execute(
        &self,
        input: AddMembersInput,
    ) -> Result<AddMembersOutput, AddMembersError> {
        let candidates = input.user_ids.clone();
        self.add(input).await.map_err(|error| AddMembersError {
            output: AddMembersOutput::all_failed(candidates, &error),
            error,
        })
    }

    async fn add(&self, input: AddMembersInput) -> Result<AddMembersOutput, FolioError> {
        self.teams
            .find_by_id(input.team_id)
            .await?
            .ok_or(FolioError::NotFound)?;

        let is_manager = self
            .roster
            .find_role(input.team_id, input.actor_id)
            .await?
            .is_some_and(|role| role.is_manager());
        if !is_manager {
            log::warn!(
                target: "folio",
                "msg=\"add members refused\", team_id={}, user_id={}, candidates={}",
                input.team_id,
                input.actor_id,
                input.user_ids.len()
            );
            return Err(FolioError::Forbidden(DenyReason::NotTeamManager));
        }

        let existing: HashSet<UserId> = self
            .roster
            .list_members(input.team_id)
            .await?
            .into_iter()
            .map(|entry| entry.user_id)
            .collect();
        let mut requested = HashSet::new();

        let mut output = AddMembersOutput::default();
        for user_id in input.user_ids {
            if existing.contains(&user_id) {
                output.fail(user_id, FolioError::Conflict("already a team member".to_owned()));
                continue;
            }
            if !requested.insert(user_id) {
                output.fail(user_id, FolioError::Conflict("repeated in request".to_owned()));
                continue;
            }

            let entry = CreateRosterEntry {
                team_id: input.team_id,
                user_id,
                role: TeamRole::Member,
            };
            match self.roster.create(entry).await {
                Ok(_) => {
                    output.added += 1;
                    self.dispatcher.publish(TeamEvent::member_added(
                        input.team_id,
                        input.actor_id,
                        user_id,
                    ));
                }
                Err(err) => {
                    log::warn!(
                        target: "folio",
                        "msg=\"member insert failed\", team_id={}, member_id={}, error=\"{}\"",
                        input.team_id,
                        user_id,
                        err
                    );
                    output.fail(user_id, err);
                }
            }
        }

        log::info!(
            target: "folio",
            "msg=\"members added\", team_id={}, user_id={}, added={}, failed={}",
            input.team_id,
            input.actor_id,
            output.added,
            output.failed
        );

        Ok(output)
    }
}
