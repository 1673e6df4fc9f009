use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationStatus, Company, CompanyId, CreditApplication, CreditPurpose, Role,
    UserId,
};

/// Storage abstraction for credit applications so the service layer can be
/// exercised against any backend. Implementations must apply
/// [`ApplicationChanges`] atomically, including its status precondition.
pub trait ApplicationRepository: Send + Sync {
    fn get(&self, id: &ApplicationId) -> Result<Option<CreditApplication>, RepositoryError>;
    fn create(&self, application: CreditApplication)
        -> Result<CreditApplication, RepositoryError>;
    fn update(
        &self,
        id: &ApplicationId,
        changes: ApplicationChanges,
    ) -> Result<Option<CreditApplication>, RepositoryError>;
    fn list(&self, query: &ListQuery) -> Result<(Vec<CreditApplication>, usize), RepositoryError>;
    fn delete(&self, id: &ApplicationId) -> Result<bool, RepositoryError>;
    fn has_pending_for_company(&self, company_id: &CompanyId) -> Result<bool, RepositoryError>;
}

/// Lookup of the company associated with a user, one company per user.
pub trait CompanyDirectory: Send + Sync {
    fn company_for_user(&self, user_id: &UserId) -> Result<Option<Company>, RepositoryError>;
}

/// Lookup of the role assigned to a user.
pub trait RoleDirectory: Send + Sync {
    fn role_for_user(&self, user_id: &UserId) -> Result<Option<Role>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("write precondition failed: application status changed concurrently")]
    Precondition,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Partial update applied to a single application row. `None` fields are left
/// untouched. `expected_status` is re-checked inside the backend's write so a
/// concurrent transition cannot be overwritten blindly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationChanges {
    pub requested_amount: Option<Decimal>,
    pub purpose: Option<CreditPurpose>,
    pub purpose_other: Option<String>,
    pub term_months: Option<u16>,
    pub status: Option<ApplicationStatus>,
    pub risk_score: Option<Decimal>,
    pub approved_amount: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub expected_status: Option<ApplicationStatus>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields a caller may sort listings by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    RequestedAmount,
    TermMonths,
    Status,
    RiskScore,
    ApprovedAmount,
    InterestRate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Fully-resolved listing query handed to the repository after the access
/// policy has scoped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub status: Option<ApplicationStatus>,
    /// Rows in this status are excluded regardless of `status`; used to keep
    /// drafts out of staff listings.
    pub exclude_status: Option<ApplicationStatus>,
    pub company_id: Option<CompanyId>,
    pub sort: SortField,
    pub order: SortOrder,
}
