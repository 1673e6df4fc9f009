//! Credit application lifecycle: role authority, company ownership, the
//! status state machine, field validation rules, and the access policy that
//! ties them together over an abstract store.

pub mod access;
pub mod authority;
pub mod domain;
pub mod memory;
pub mod ownership;
pub mod repository;
pub mod router;
pub mod service;
pub mod transitions;
pub mod validation;

#[cfg(test)]
mod tests;

pub use access::{ListFilters, PagePolicy, SORTABLE_FIELDS};
pub use authority::ForbiddenError;
pub use domain::{
    ApplicationId, ApplicationStatus, Company, CompanyId, CreditApplication, CreditPurpose,
    NewApplication, PageMeta, Paginated, Principal, Role, UserId,
};
pub use repository::{
    ApplicationChanges, ApplicationRepository, CompanyDirectory, ListQuery, RepositoryError,
    RoleDirectory, SortField, SortOrder,
};
pub use router::application_router;
pub use service::{CreditApplicationService, ServiceError, WorkflowPolicy};
pub use validation::{ApplicationPatch, ValidationError};
