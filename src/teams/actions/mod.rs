mod add_members;
mod create;
mod members;
mod remove;

pub use add_members::{
    AddMembersAction, AddMembersError, AddMembersInput, AddMembersOutput, FailedMember,
};
pub use create::{CreateTeamAction, CreateTeamInput, CreateTeamOutput};
pub use members::GetMembersAction;
pub use remove::{RemoveFromTeamInput, RemoveManagerAction, RemoveMemberAction};
