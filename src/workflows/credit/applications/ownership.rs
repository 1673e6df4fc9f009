use std::sync::Arc;

use super::domain::{Company, CreditApplication, Principal};
use super::repository::{CompanyDirectory, RepositoryError};

/// Maps a principal to the company it owns so applicant-visible data can be
/// scoped to that company.
pub struct CompanyOwnership<D> {
    directory: Arc<D>,
}

impl<D> CompanyOwnership<D>
where
    D: CompanyDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// The company associated with the principal, if any.
    pub fn company_for(&self, principal: &Principal) -> Result<Option<Company>, RepositoryError> {
        self.directory.company_for_user(&principal.sub)
    }

    /// Whether the principal's company owns the given application. A
    /// principal without a company owns nothing.
    pub fn owns(
        &self,
        principal: &Principal,
        application: &CreditApplication,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .company_for(principal)?
            .is_some_and(|company| company.id == application.company_id))
    }
}
