use super::decision::{Decision, DenyReason, Grant, GrantSource, Operation};
use crate::assets::{AssetRepository, Folder, Note, ResourceRef};
use crate::teams::MembershipLookup;
use crate::{FolioError, TeamId, UserId};

/// The resource an access check is about, with the lookups it depends on.
///
/// A note carries its parent folder so inherited shares and folder-owner
/// deletes can be evaluated without another fetch.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Folder(&'a Folder),
    Note { note: &'a Note, folder: &'a Folder },
}

impl Target<'_> {
    pub fn resource(&self) -> ResourceRef {
        match self {
            Self::Folder(folder) => ResourceRef::folder(folder.id),
            Self::Note { note, .. } => ResourceRef::note(note.id),
        }
    }

    pub fn owner_id(&self) -> UserId {
        match self {
            Self::Folder(folder) => folder.owner_id,
            Self::Note { note, .. } => note.owner_id,
        }
    }

    pub fn team_id(&self) -> TeamId {
        match self {
            Self::Folder(folder) => folder.team_id,
            Self::Note { note, .. } => note.team_id,
        }
    }

    /// The folder a note inherits shares from.
    fn parent(&self) -> Option<&Folder> {
        match self {
            Self::Folder(_) => None,
            Self::Note { folder, .. } => Some(folder),
        }
    }
}

/// Decides whether an actor may perform an operation on a folder or note.
///
/// Read and write follow one rule chain, first match wins:
///
/// 1. the actor owns the resource
/// 2. a share on the resource itself
/// 3. for notes, a share on the parent folder
/// 4. the actor manages the resource's team
///
/// A read-only grant from 2 or 3 denies writes even when rule 4 would have
/// matched. Deletes are open to the owner, the folder owner (for notes) and
/// team managers. Share and revoke are open to the owner and team managers.
///
/// The resolver only reads. It never retries; collaborator errors propagate.
#[derive(Debug, Clone)]
pub struct AccessResolver<A, M> {
    assets: A,
    membership: M,
}

impl<A, M> AccessResolver<A, M>
where
    A: AssetRepository,
    M: MembershipLookup,
{
    pub fn new(assets: A, membership: M) -> Self {
        Self { assets, membership }
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn membership(&self) -> &M {
        &self.membership
    }

    /// Evaluates `op` on `target` for `actor`.
    ///
    /// # Returns
    ///
    /// - `Ok(Decision::Allow(grant))` - Permitted, with the effective permission
    /// - `Ok(Decision::Deny(reason))` - Refused
    /// - `Err(_)` - A storage or membership lookup failed
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "resolve_access", skip(self, target), fields(resource = %target.resource()), err)
    )]
    pub async fn resolve(
        &self,
        target: Target<'_>,
        actor: UserId,
        op: Operation,
    ) -> Result<Decision, FolioError> {
        let decision = match op {
            Operation::Read | Operation::Write => self.resolve_access(target, actor, op).await?,
            Operation::Delete => self.resolve_delete(target, actor).await?,
            Operation::Share | Operation::Revoke => self.resolve_sharing(target, actor).await?,
        };

        if let Decision::Deny(reason) = decision {
            log::debug!(
                target: "folio",
                "msg=\"access denied\", resource={}, user_id={}, op={}, reason=\"{}\"",
                target.resource(),
                actor,
                op,
                reason
            );
        }

        Ok(decision)
    }

    /// Like [`resolve`](Self::resolve), with a denial turned into
    /// `Err(FolioError::Forbidden)`.
    pub async fn authorize(
        &self,
        target: Target<'_>,
        actor: UserId,
        op: Operation,
    ) -> Result<Grant, FolioError> {
        self.resolve(target, actor, op).await?.into_result()
    }

    /// Checks that `actor` may share `target` with `grantee`.
    ///
    /// # Returns
    ///
    /// - `Ok(grant)` - The actor's grant on the resource
    /// - `Err(FolioError::Forbidden(NoAccess | InsufficientPermission))` - Actor may not share
    /// - `Err(FolioError::Forbidden(TargetNotTeamMember))` - Grantee is outside the team
    pub async fn authorize_share(
        &self,
        target: Target<'_>,
        actor: UserId,
        grantee: UserId,
    ) -> Result<Grant, FolioError> {
        let grant = self.authorize(target, actor, Operation::Share).await?;

        if !self.membership.is_member(target.team_id(), grantee).await? {
            return Err(FolioError::Forbidden(DenyReason::TargetNotTeamMember));
        }

        Ok(grant)
    }

    /// Any team member may create folders in the team.
    pub async fn authorize_folder_creation(
        &self,
        team_id: TeamId,
        actor: UserId,
    ) -> Result<Grant, FolioError> {
        if self.membership.is_member(team_id, actor).await? {
            Ok(Grant::full(GrantSource::TeamMember))
        } else {
            Err(FolioError::Forbidden(DenyReason::NotTeamMember))
        }
    }

    /// Only managers may list everything in a team.
    pub async fn authorize_team_listing(
        &self,
        team_id: TeamId,
        actor: UserId,
    ) -> Result<(), FolioError> {
        if self.membership.is_manager(team_id, actor).await? {
            Ok(())
        } else {
            Err(FolioError::Forbidden(DenyReason::NotTeamManager))
        }
    }

    /// Users may always list their own assets. Listing someone else's needs
    /// a team in which the actor is a manager and the subject a member.
    pub async fn authorize_user_listing(
        &self,
        actor: UserId,
        subject: UserId,
        team_id: Option<TeamId>,
    ) -> Result<(), FolioError> {
        if actor == subject {
            return Ok(());
        }

        let team_id = team_id.ok_or(FolioError::Forbidden(DenyReason::NotTeamManager))?;
        self.authorize_team_listing(team_id, actor).await?;

        if !self.membership.is_member(team_id, subject).await? {
            return Err(FolioError::Forbidden(DenyReason::TargetNotTeamMember));
        }

        Ok(())
    }

    /// Rules 1 to 3: ownership, direct share, inherited share.
    async fn explicit_grant(
        &self,
        target: Target<'_>,
        actor: UserId,
    ) -> Result<Option<Grant>, FolioError> {
        if target.owner_id() == actor {
            return Ok(Some(Grant::full(GrantSource::Owner)));
        }

        if let Some(share) = self.assets.find_share(&target.resource(), actor).await? {
            return Ok(Some(Grant::new(share.permission, GrantSource::DirectShare)));
        }

        if let Some(folder) = target.parent() {
            let inherited = self
                .assets
                .find_share(&ResourceRef::folder(folder.id), actor)
                .await?;
            if let Some(share) = inherited {
                return Ok(Some(Grant::new(share.permission, GrantSource::InheritedShare)));
            }
        }

        Ok(None)
    }

    async fn manager_grant(
        &self,
        target: Target<'_>,
        actor: UserId,
    ) -> Result<Option<Grant>, FolioError> {
        Ok(self
            .membership
            .is_manager(target.team_id(), actor)
            .await?
            .then(|| Grant::full(GrantSource::TeamManager)))
    }

    async fn resolve_access(
        &self,
        target: Target<'_>,
        actor: UserId,
        op: Operation,
    ) -> Result<Decision, FolioError> {
        if let Some(grant) = self.explicit_grant(target, actor).await? {
            if op == Operation::Write && !grant.permission.allows_write() {
                return Ok(Decision::Deny(DenyReason::InsufficientPermission));
            }
            return Ok(Decision::Allow(grant));
        }

        Ok(self
            .manager_grant(target, actor)
            .await?
            .map_or(Decision::Deny(DenyReason::NoAccess), Decision::Allow))
    }

    async fn resolve_delete(
        &self,
        target: Target<'_>,
        actor: UserId,
    ) -> Result<Decision, FolioError> {
        if target.owner_id() == actor {
            return Ok(Decision::Allow(Grant::full(GrantSource::Owner)));
        }

        if target.parent().is_some_and(|folder| folder.owner_id == actor) {
            return Ok(Decision::Allow(Grant::full(GrantSource::FolderOwner)));
        }

        self.manager_or_deny(target, actor).await
    }

    async fn resolve_sharing(
        &self,
        target: Target<'_>,
        actor: UserId,
    ) -> Result<Decision, FolioError> {
        if target.owner_id() == actor {
            return Ok(Decision::Allow(Grant::full(GrantSource::Owner)));
        }

        self.manager_or_deny(target, actor).await
    }

    /// Manager override for delete/share/revoke. Share holders that reach
    /// this point are told their permission is insufficient.
    async fn manager_or_deny(
        &self,
        target: Target<'_>,
        actor: UserId,
    ) -> Result<Decision, FolioError> {
        if let Some(grant) = self.manager_grant(target, actor).await? {
            return Ok(Decision::Allow(grant));
        }

        let reason = if self.explicit_grant(target, actor).await?.is_some() {
            DenyReason::InsufficientPermission
        } else {
            DenyReason::NoAccess
        };

        Ok(Decision::Deny(reason))
    }
}
