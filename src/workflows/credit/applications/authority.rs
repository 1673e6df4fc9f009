use std::sync::Arc;

use super::domain::{Principal, Role};
use super::repository::{RepositoryError, RoleDirectory};

/// Authorization denials raised anywhere in the workflow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForbiddenError {
    #[error("profile has no assigned role")]
    MissingRole,
    #[error("role '{}' is not allowed to perform this action", role.label())]
    RoleNotAllowed { role: Role },
    #[error("application does not belong to the caller's company")]
    NotCompanyOwner,
    #[error("applicants may only submit a draft by setting status to 'pending' and nothing else")]
    ApplicantSubmitOnly,
    #[error("applicants cannot modify an application once it leaves draft")]
    ApplicantImmutableAfterSubmit,
    #[error("draft applications are not actionable by staff")]
    StaffCannotTouchDrafts,
    #[error("draft applications cannot be listed by staff")]
    DraftFilterUnavailable,
    #[error("applicants may only delete their own draft applications")]
    ApplicantDeleteDraftOnly,
}

/// Resolves a principal's role; the gate in front of every authorization
/// decision.
pub struct RoleAuthority<D> {
    directory: Arc<D>,
}

/// Failure modes of role resolution, flattened into the service taxonomy at
/// the call site.
#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),
    #[error(transparent)]
    Directory(#[from] RepositoryError),
}

impl<D> RoleAuthority<D>
where
    D: RoleDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Look up the principal's role, failing when none is assigned.
    pub fn resolve(&self, principal: &Principal) -> Result<Role, RoleError> {
        let role = self
            .directory
            .role_for_user(&principal.sub)?
            .ok_or(ForbiddenError::MissingRole)?;
        Ok(role)
    }

    /// Resolve and additionally require membership in `allowed`. An empty
    /// `allowed` slice only requires that some role exists.
    pub fn assert(&self, principal: &Principal, allowed: &[Role]) -> Result<Role, RoleError> {
        let role = self.resolve(principal)?;
        if !allowed.is_empty() && !allowed.contains(&role) {
            return Err(ForbiddenError::RoleNotAllowed { role }.into());
        }
        Ok(role)
    }
}
