use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{
    ApplicationId, ApplicationStatus, Company, CompanyId, CreditApplication, Role, UserId,
};
use super::repository::{
    ApplicationChanges, ApplicationRepository, CompanyDirectory, ListQuery, RepositoryError,
    RoleDirectory, SortField, SortOrder,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{what} mutex poisoned")))
}

/// In-memory application store. Each operation holds the table mutex for its
/// full read-modify-write, which gives updates the same atomicity a database
/// transaction would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<ApplicationId, CreditApplication>>,
}

impl ApplicationRepository for MemoryStore {
    fn get(&self, id: &ApplicationId) -> Result<Option<CreditApplication>, RepositoryError> {
        let rows = lock(&self.rows, "application store")?;
        Ok(rows.get(id).cloned())
    }

    fn create(
        &self,
        application: CreditApplication,
    ) -> Result<CreditApplication, RepositoryError> {
        let mut rows = lock(&self.rows, "application store")?;
        if rows.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(application.id, application.clone());
        Ok(application)
    }

    fn update(
        &self,
        id: &ApplicationId,
        changes: ApplicationChanges,
    ) -> Result<Option<CreditApplication>, RepositoryError> {
        let mut rows = lock(&self.rows, "application store")?;
        let Some(row) = rows.get_mut(id) else {
            return Ok(None);
        };

        if let Some(expected) = changes.expected_status {
            if row.status != expected {
                return Err(RepositoryError::Precondition);
            }
        }

        if let Some(amount) = changes.requested_amount {
            row.requested_amount = amount;
        }
        if let Some(purpose) = changes.purpose {
            row.purpose = purpose;
        }
        if let Some(purpose_other) = changes.purpose_other {
            row.purpose_other = Some(purpose_other);
        }
        if let Some(term) = changes.term_months {
            row.term_months = term;
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        if let Some(score) = changes.risk_score {
            row.risk_score = Some(score);
        }
        if let Some(amount) = changes.approved_amount {
            row.approved_amount = Some(amount);
        }
        if let Some(rate) = changes.interest_rate {
            row.interest_rate = Some(rate);
        }
        row.updated_at = changes.updated_at.unwrap_or_else(Utc::now);

        Ok(Some(row.clone()))
    }

    fn list(&self, query: &ListQuery) -> Result<(Vec<CreditApplication>, usize), RepositoryError> {
        let rows = lock(&self.rows, "application store")?;
        let mut matched: Vec<CreditApplication> = rows
            .values()
            .filter(|row| query.status.map_or(true, |status| row.status == status))
            .filter(|row| {
                query
                    .exclude_status
                    .map_or(true, |status| row.status != status)
            })
            .filter(|row| {
                query
                    .company_id
                    .map_or(true, |company| row.company_id == company)
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = compare_by(a, b, query.sort);
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matched.len();
        let offset = (query.page.saturating_sub(1) as usize).saturating_mul(query.limit as usize);
        let page: Vec<CreditApplication> = matched
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .collect();

        Ok((page, total))
    }

    fn delete(&self, id: &ApplicationId) -> Result<bool, RepositoryError> {
        let mut rows = lock(&self.rows, "application store")?;
        Ok(rows.remove(id).is_some())
    }

    fn has_pending_for_company(&self, company_id: &CompanyId) -> Result<bool, RepositoryError> {
        let rows = lock(&self.rows, "application store")?;
        Ok(rows.values().any(|row| {
            row.company_id == *company_id && row.status == ApplicationStatus::Pending
        }))
    }
}

fn compare_by(a: &CreditApplication, b: &CreditApplication, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.0.cmp(&b.id.0),
        SortField::RequestedAmount => a.requested_amount.cmp(&b.requested_amount),
        SortField::TermMonths => a.term_months.cmp(&b.term_months),
        SortField::Status => a.status.label().cmp(b.status.label()),
        SortField::RiskScore => a.risk_score.cmp(&b.risk_score),
        SortField::ApprovedAmount => a.approved_amount.cmp(&b.approved_amount),
        SortField::InterestRate => a.interest_rate.cmp(&b.interest_rate),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

/// In-memory company directory keyed by owning user.
#[derive(Debug, Default)]
pub struct MemoryCompanyDirectory {
    companies: Mutex<HashMap<UserId, Company>>,
}

impl MemoryCompanyDirectory {
    /// Register a company for a user, replacing any previous association.
    pub fn register(&self, company: Company) -> Result<(), RepositoryError> {
        let mut companies = lock(&self.companies, "company directory")?;
        companies.insert(company.user_id, company);
        Ok(())
    }
}

impl CompanyDirectory for MemoryCompanyDirectory {
    fn company_for_user(&self, user_id: &UserId) -> Result<Option<Company>, RepositoryError> {
        let companies = lock(&self.companies, "company directory")?;
        Ok(companies.get(user_id).cloned())
    }
}

/// In-memory role assignments.
#[derive(Debug, Default)]
pub struct MemoryRoleDirectory {
    roles: Mutex<HashMap<UserId, Role>>,
}

impl MemoryRoleDirectory {
    pub fn assign(&self, user_id: UserId, role: Role) -> Result<(), RepositoryError> {
        let mut roles = lock(&self.roles, "role directory")?;
        roles.insert(user_id, role);
        Ok(())
    }
}

impl RoleDirectory for MemoryRoleDirectory {
    fn role_for_user(&self, user_id: &UserId) -> Result<Option<Role>, RepositoryError> {
        let roles = lock(&self.roles, "role directory")?;
        Ok(roles.get(user_id).cloned())
    }
}
