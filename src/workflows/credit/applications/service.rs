use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::access::{self, AccessError, CompanyScope, ListFilters, PagePolicy};
use super::authority::{ForbiddenError, RoleAuthority, RoleError};
use super::domain::{
    ApplicationId, ApplicationStatus, CreditApplication, NewApplication, PageMeta, Paginated,
    Principal, Role,
};
use super::ownership::CompanyOwnership;
use super::repository::{
    ApplicationChanges, ApplicationRepository, CompanyDirectory, RepositoryError, RoleDirectory,
};
use super::transitions::{check_staff_transition, is_applicant_submission, InvalidTransition};
use super::validation::{self, ApplicationPatch, ValidationError};

/// Workflow knobs injected at construction; never read from ambient state.
#[derive(Debug, Clone, Default)]
pub struct WorkflowPolicy {
    /// When set, a company with a pending application cannot open another one.
    pub single_pending_per_company: bool,
    pub pages: PagePolicy,
}

impl WorkflowPolicy {
    pub fn strict() -> Self {
        Self {
            single_pending_per_company: true,
            pages: PagePolicy::default(),
        }
    }
}

/// Error taxonomy surfaced to callers. HTTP mapping stays with the router.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("application not found")]
    NotFound,
    #[error("company already has a pending application")]
    PendingApplicationExists,
    #[error("application was modified concurrently, retry the update")]
    ConcurrentUpdate,
    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<RoleError> for ServiceError {
    fn from(value: RoleError) -> Self {
        match value {
            RoleError::Forbidden(err) => Self::Forbidden(err),
            RoleError::Directory(err) => Self::Repository(err),
        }
    }
}

impl From<AccessError> for ServiceError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::Forbidden(err) => Self::Forbidden(err),
            AccessError::Validation(err) => Self::Validation(err),
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(value: InvalidTransition) -> Self {
        Self::Validation(ValidationError::Transition(value))
    }
}

/// Service composing the role authority, company ownership resolver, state
/// machine, and field rules over an abstract store.
pub struct CreditApplicationService<R, C, D> {
    repository: Arc<R>,
    ownership: CompanyOwnership<C>,
    authority: RoleAuthority<D>,
    policy: WorkflowPolicy,
}

impl<R, C, D> CreditApplicationService<R, C, D>
where
    R: ApplicationRepository + 'static,
    C: CompanyDirectory + 'static,
    D: RoleDirectory + 'static,
{
    pub fn new(
        repository: Arc<R>,
        companies: Arc<C>,
        roles: Arc<D>,
        policy: WorkflowPolicy,
    ) -> Self {
        Self {
            repository,
            ownership: CompanyOwnership::new(companies),
            authority: RoleAuthority::new(roles),
            policy,
        }
    }

    /// Open a new application in draft for the caller's company. Only
    /// applicants request credit; staff never originate applications.
    pub fn create_application(
        &self,
        input: NewApplication,
        principal: &Principal,
    ) -> Result<CreditApplication, ServiceError> {
        self.authority.assert(principal, &[Role::Applicant])?;
        let company = self
            .ownership
            .company_for(principal)?
            .ok_or(ValidationError::CompanyRequired)?;

        validation::validate_new(&input)?;

        if self.policy.single_pending_per_company
            && self.repository.has_pending_for_company(&company.id)?
        {
            return Err(ServiceError::PendingApplicationExists);
        }

        let now = Utc::now();
        let application = CreditApplication {
            id: ApplicationId::generate(),
            company_id: company.id,
            requested_amount: input.requested_amount,
            purpose: input.purpose,
            purpose_other: input.purpose_other,
            term_months: input.term_months,
            status: ApplicationStatus::Draft,
            risk_score: None,
            approved_amount: None,
            interest_rate: None,
            created_at: now,
            updated_at: now,
        };

        let created = self.repository.create(application)?;
        info!(
            application_id = %created.id.0,
            company_id = %company.id.0,
            "credit application opened in draft"
        );
        Ok(created)
    }

    /// Fetch one application, subject to role and ownership visibility.
    pub fn get_application(
        &self,
        id: &ApplicationId,
        principal: &Principal,
    ) -> Result<CreditApplication, ServiceError> {
        let role = self.authority.resolve(principal)?;
        let application = self.repository.get(id)?.ok_or(ServiceError::NotFound)?;

        let owns = if role.is_staff() {
            false
        } else {
            self.ownership.owns(principal, &application)?
        };

        match access::read_decision(role, owns, application.status) {
            access::ReadDecision::Allow => Ok(application),
            access::ReadDecision::NotVisible => Err(ServiceError::NotFound),
            access::ReadDecision::Deny(err) => Err(err.into()),
        }
    }

    /// List applications visible to the caller.
    pub fn list_applications(
        &self,
        filters: ListFilters,
        principal: &Principal,
    ) -> Result<Paginated<CreditApplication>, ServiceError> {
        let role = self.authority.resolve(principal)?;

        // A bad sort field is rejected even when the result set would be
        // empty anyway.
        if let Some(name) = filters.sort.as_deref() {
            access::parse_sort_field(name)?;
        }

        let scope = if role.is_staff() {
            CompanyScope::Any
        } else {
            match self.ownership.company_for(principal)? {
                Some(company) => CompanyScope::Own(company.id),
                None => {
                    let page = filters.page.unwrap_or(1).max(1);
                    let limit = filters
                        .limit
                        .unwrap_or(self.policy.pages.default_limit)
                        .clamp(1, self.policy.pages.max_limit);
                    return Ok(Paginated::empty(page, limit));
                }
            }
        };

        let query = access::list_query(scope, &filters, self.policy.pages)?;
        let (items, total) = self.repository.list(&query)?;
        Ok(Paginated {
            meta: PageMeta::compute(total, query.page, query.limit),
            items,
        })
    }

    /// Apply a partial update: applicants may only submit their own draft,
    /// staff drive the review transitions and field changes.
    pub fn update_application(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
        principal: &Principal,
    ) -> Result<CreditApplication, ServiceError> {
        let role = self.authority.resolve(principal)?;
        let existing = self.repository.get(id)?.ok_or(ServiceError::NotFound)?;

        if role.is_staff() {
            self.staff_update(existing, patch)
        } else {
            self.applicant_submit(principal, existing, patch)
        }
    }

    /// Remove an application. Applicants may only discard their own drafts.
    pub fn delete_application(
        &self,
        id: &ApplicationId,
        principal: &Principal,
    ) -> Result<(), ServiceError> {
        let role = self.authority.resolve(principal)?;
        let existing = self.repository.get(id)?.ok_or(ServiceError::NotFound)?;

        let owns = if role.is_staff() {
            false
        } else {
            self.ownership.owns(principal, &existing)?
        };
        access::delete_decision(role, owns, existing.status)?;

        if !self.repository.delete(id)? {
            return Err(ServiceError::NotFound);
        }
        info!(application_id = %id.0, status = existing.status.label(), "application deleted");
        Ok(())
    }

    fn staff_update(
        &self,
        existing: CreditApplication,
        patch: ApplicationPatch,
    ) -> Result<CreditApplication, ServiceError> {
        if existing.status == ApplicationStatus::Draft {
            return Err(ForbiddenError::StaffCannotTouchDrafts.into());
        }
        if patch.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }
        if let Some(next) = patch.status {
            check_staff_transition(existing.status, next)?;
        }
        validation::validate_patch(&existing, &patch)?;

        let from = existing.status;
        let updated = self.apply(&existing.id, changes_from(patch, from))?;
        if updated.status != from {
            info!(
                application_id = %updated.id.0,
                from = from.label(),
                to = updated.status.label(),
                "application status advanced"
            );
        }
        Ok(updated)
    }

    fn applicant_submit(
        &self,
        principal: &Principal,
        existing: CreditApplication,
        mut patch: ApplicationPatch,
    ) -> Result<CreditApplication, ServiceError> {
        if !self.ownership.owns(principal, &existing)? {
            return Err(ForbiddenError::NotCompanyOwner.into());
        }
        // Once a row leaves draft the applicant has no write access at all,
        // whatever the payload; that denial comes before any field handling.
        if existing.status != ApplicationStatus::Draft {
            return Err(ForbiddenError::ApplicantImmutableAfterSubmit.into());
        }

        if patch.strip_review_fields() {
            debug!(
                application_id = %existing.id.0,
                "review-only fields ignored on applicant update"
            );
        }
        if patch.is_empty() {
            return Err(ValidationError::EmptyUpdate.into());
        }
        if !patch.is_status_only() {
            return Err(ForbiddenError::ApplicantSubmitOnly.into());
        }
        let Some(next) = patch.status else {
            return Err(ForbiddenError::ApplicantSubmitOnly.into());
        };
        if !is_applicant_submission(existing.status, next) {
            return Err(ForbiddenError::ApplicantSubmitOnly.into());
        }
        validation::validate_patch(&existing, &patch)?;

        let changes = ApplicationChanges {
            status: Some(ApplicationStatus::Pending),
            expected_status: Some(ApplicationStatus::Draft),
            ..ApplicationChanges::default()
        };
        let updated = self.apply(&existing.id, changes)?;
        info!(
            application_id = %updated.id.0,
            company_id = %updated.company_id.0,
            "application submitted for review"
        );
        Ok(updated)
    }

    fn apply(
        &self,
        id: &ApplicationId,
        changes: ApplicationChanges,
    ) -> Result<CreditApplication, ServiceError> {
        match self.repository.update(id, changes) {
            Ok(Some(application)) => Ok(application),
            Ok(None) => Err(ServiceError::NotFound),
            Err(RepositoryError::Precondition) => Err(ServiceError::ConcurrentUpdate),
            Err(err) => Err(err.into()),
        }
    }
}

fn changes_from(patch: ApplicationPatch, expected: ApplicationStatus) -> ApplicationChanges {
    ApplicationChanges {
        requested_amount: patch.requested_amount,
        purpose: patch.purpose,
        purpose_other: patch.purpose_other,
        term_months: patch.term_months,
        status: patch.status,
        risk_score: patch.risk_score,
        approved_amount: patch.approved_amount,
        interest_rate: patch.interest_rate,
        expected_status: Some(expected),
        updated_at: None,
    }
}
