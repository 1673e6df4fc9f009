use serde::{Deserialize, Serialize};

use super::authority::ForbiddenError;
use super::domain::{ApplicationStatus, CompanyId, Role};
use super::repository::{ListQuery, SortField, SortOrder};
use super::validation::ValidationError;

/// Sort keys callers may request; anything else is rejected by name.
pub const SORTABLE_FIELDS: &[&str] = &[
    "id",
    "requested_amount",
    "term_months",
    "status",
    "risk_score",
    "approved_amount",
    "interest_rate",
    "created_at",
    "updated_at",
];

pub fn parse_sort_field(name: &str) -> Result<SortField, ValidationError> {
    match name {
        "id" => Ok(SortField::Id),
        "requested_amount" => Ok(SortField::RequestedAmount),
        "term_months" => Ok(SortField::TermMonths),
        "status" => Ok(SortField::Status),
        "risk_score" => Ok(SortField::RiskScore),
        "approved_amount" => Ok(SortField::ApprovedAmount),
        "interest_rate" => Ok(SortField::InterestRate),
        "created_at" => Ok(SortField::CreatedAt),
        "updated_at" => Ok(SortField::UpdatedAt),
        other => Err(ValidationError::UnknownSortField {
            field: other.to_string(),
            allowed: SORTABLE_FIELDS,
        }),
    }
}

/// Raw listing filters as received from the caller, before the access policy
/// scopes them to the principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilters {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

/// Pagination bounds injected from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePolicy {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PagePolicy {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Failure modes of scoping a listing to a principal.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Company visibility resolved for the caller: applicants are pinned to their
/// own company, staff may look across all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyScope {
    Own(CompanyId),
    Any,
}

/// Scope raw filters into a repository query.
///
/// Applicants may look at any status of their own rows, drafts included.
/// Staff may filter by company freely but never see drafts: an explicit draft
/// filter is rejected outright, and unfiltered listings exclude drafts at the
/// query level.
pub fn list_query(
    scope: CompanyScope,
    filters: &ListFilters,
    pages: PagePolicy,
) -> Result<ListQuery, AccessError> {
    let (company_id, exclude_status) = match scope {
        CompanyScope::Any => {
            if filters.status == Some(ApplicationStatus::Draft) {
                return Err(ForbiddenError::DraftFilterUnavailable.into());
            }
            (filters.company_id, Some(ApplicationStatus::Draft))
        }
        CompanyScope::Own(company_id) => (Some(company_id), None),
    };

    let sort = match filters.sort.as_deref() {
        Some(name) => parse_sort_field(name)?,
        None => SortField::CreatedAt,
    };

    Ok(ListQuery {
        page: filters.page.unwrap_or(1).max(1),
        limit: filters
            .limit
            .unwrap_or(pages.default_limit)
            .clamp(1, pages.max_limit),
        status: filters.status,
        exclude_status,
        company_id,
        sort,
        order: filters.order.unwrap_or_default(),
    })
}

/// Outcome of a single-row read check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadDecision {
    Allow,
    /// The row exists but must not be acknowledged to this caller (staff
    /// looking at a draft). Surfaces as not-found.
    NotVisible,
    Deny(ForbiddenError),
}

pub fn read_decision(role: Role, owns: bool, status: ApplicationStatus) -> ReadDecision {
    if role.is_staff() {
        if status == ApplicationStatus::Draft {
            ReadDecision::NotVisible
        } else {
            ReadDecision::Allow
        }
    } else if owns {
        ReadDecision::Allow
    } else {
        ReadDecision::Deny(ForbiddenError::NotCompanyOwner)
    }
}

/// Applicants may delete only their own drafts; staff may delete anything.
pub fn delete_decision(
    role: Role,
    owns: bool,
    status: ApplicationStatus,
) -> Result<(), ForbiddenError> {
    if role.is_staff() {
        return Ok(());
    }
    if !owns {
        return Err(ForbiddenError::NotCompanyOwner);
    }
    if status != ApplicationStatus::Draft {
        return Err(ForbiddenError::ApplicantDeleteDraftOnly);
    }
    Ok(())
}
