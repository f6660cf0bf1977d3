//! Teams, rosters and the rules for who may change them.
//!
//! Every team has exactly one `MAIN_MANAGER` (its creator), any number of
//! `MANAGER`s and `MEMBER`s. Roster writes go through the actions in this
//! module, which publish a [`TeamEvent`](crate::events::TeamEvent) after each
//! committed change. Reads used by access checks go through
//! [`TeamDirectory`], which puts the membership cache in front of the roster.

mod actions;
mod directory;
mod memory;
mod repository;
mod types;

pub use actions::{
    AddMembersAction, AddMembersError, AddMembersInput, AddMembersOutput, CreateTeamAction,
    CreateTeamInput, CreateTeamOutput, FailedMember, GetMembersAction, RemoveFromTeamInput,
    RemoveManagerAction, RemoveMemberAction,
};
pub use directory::{MembershipLookup, TeamDirectory};
pub use memory::{InMemoryRosterRepository, InMemoryTeamRepository};
pub use repository::{CreateRosterEntry, CreateTeam, RosterRepository, TeamRepository};
pub use types::{
    AccountRole, MAX_TEAM_NAME_LEN, Principal, RosterEntry, Team, TeamRole, validate_team_name,
};
