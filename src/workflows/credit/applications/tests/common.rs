use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::workflows::credit::applications::domain::{
    ApplicationStatus, Company, CompanyId, CreditApplication, CreditPurpose, NewApplication,
    Principal, Role, UserId,
};
use crate::workflows::credit::applications::memory::{
    MemoryCompanyDirectory, MemoryRoleDirectory, MemoryStore,
};
use crate::workflows::credit::applications::repository::{
    ApplicationChanges, ApplicationRepository, RepositoryError,
};
use crate::workflows::credit::applications::router::PRINCIPAL_HEADER;
use crate::workflows::credit::applications::service::{CreditApplicationService, WorkflowPolicy};
use crate::workflows::credit::applications::validation::ApplicationPatch;

pub(super) fn dec(value: &str) -> Decimal {
    value.parse().expect("valid decimal literal")
}

pub(super) type TestService =
    CreditApplicationService<MemoryStore, MemoryCompanyDirectory, MemoryRoleDirectory>;

/// Everything a scenario needs: the service, its backing store, and one
/// principal per role. `applicant` owns `company_id`; `outsider` is a second
/// applicant owning `other_company_id`; `companyless` carries the applicant
/// role but has no registered company; `stranger` has no role at all.
pub(super) struct Harness {
    pub(super) service: TestService,
    pub(super) store: Arc<MemoryStore>,
    pub(super) applicant: Principal,
    pub(super) outsider: Principal,
    pub(super) operator: Principal,
    pub(super) admin: Principal,
    pub(super) companyless: Principal,
    pub(super) stranger: Principal,
    pub(super) company_id: CompanyId,
    pub(super) other_company_id: CompanyId,
}

pub(super) fn harness() -> Harness {
    harness_with_policy(WorkflowPolicy::strict())
}

pub(super) fn harness_with_policy(policy: WorkflowPolicy) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let companies = Arc::new(MemoryCompanyDirectory::default());
    let roles = Arc::new(MemoryRoleDirectory::default());

    let applicant = Principal::new(UserId(Uuid::new_v4()));
    let outsider = Principal::new(UserId(Uuid::new_v4()));
    let operator = Principal::new(UserId(Uuid::new_v4()));
    let admin = Principal::new(UserId(Uuid::new_v4()));
    let companyless = Principal::new(UserId(Uuid::new_v4()));
    let stranger = Principal::new(UserId(Uuid::new_v4()));

    roles
        .assign(applicant.sub, Role::Applicant)
        .expect("assign role");
    roles
        .assign(outsider.sub, Role::Applicant)
        .expect("assign role");
    roles
        .assign(operator.sub, Role::Operator)
        .expect("assign role");
    roles.assign(admin.sub, Role::Admin).expect("assign role");
    roles
        .assign(companyless.sub, Role::Applicant)
        .expect("assign role");

    let company_id = CompanyId(Uuid::new_v4());
    let other_company_id = CompanyId(Uuid::new_v4());
    companies
        .register(Company {
            id: company_id,
            user_id: applicant.sub,
            legal_name: "Acme Tooling LLC".to_string(),
        })
        .expect("register company");
    companies
        .register(Company {
            id: other_company_id,
            user_id: outsider.sub,
            legal_name: "Beacon Logistics SA".to_string(),
        })
        .expect("register company");

    let service = CreditApplicationService::new(store.clone(), companies, roles, policy);

    Harness {
        service,
        store,
        applicant,
        outsider,
        operator,
        admin,
        companyless,
        stranger,
        company_id,
        other_company_id,
    }
}

pub(super) fn equipment_request() -> NewApplication {
    NewApplication {
        requested_amount: dec("10000"),
        purpose: CreditPurpose::Equipment,
        purpose_other: None,
        term_months: 12,
    }
}

pub(super) fn submit_patch() -> ApplicationPatch {
    ApplicationPatch {
        status: Some(ApplicationStatus::Pending),
        ..ApplicationPatch::default()
    }
}

impl Harness {
    /// Create a draft owned by `applicant`.
    pub(super) fn draft(&self) -> CreditApplication {
        self.service
            .create_application(equipment_request(), &self.applicant)
            .expect("create draft")
    }

    /// Create a draft and submit it.
    pub(super) fn pending(&self) -> CreditApplication {
        let draft = self.draft();
        self.service
            .update_application(&draft.id, submit_patch(), &self.applicant)
            .expect("submit draft")
    }

    /// Drive an application to the given status through the store, bypassing
    /// the service, for fixtures the workflow cannot produce in one step.
    pub(super) fn force_status(
        &self,
        application: &CreditApplication,
        status: ApplicationStatus,
    ) -> CreditApplication {
        self.store
            .update(
                &application.id,
                ApplicationChanges {
                    status: Some(status),
                    ..ApplicationChanges::default()
                },
            )
            .expect("store update")
            .expect("application present")
    }
}

pub(super) fn principal_headers(principal: &Principal) -> axum::http::HeaderMap {
    let mut headers = axum::http::HeaderMap::new();
    headers.insert(
        PRINCIPAL_HEADER,
        principal.sub.0.to_string().parse().expect("header value"),
    );
    headers
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Store stand-in for backend outages.
pub(super) struct UnavailableStore;

impl ApplicationRepository for UnavailableStore {
    fn get(
        &self,
        _id: &crate::workflows::credit::applications::domain::ApplicationId,
    ) -> Result<Option<CreditApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn create(
        &self,
        _application: CreditApplication,
    ) -> Result<CreditApplication, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _id: &crate::workflows::credit::applications::domain::ApplicationId,
        _changes: ApplicationChanges,
    ) -> Result<Option<CreditApplication>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(
        &self,
        _query: &crate::workflows::credit::applications::repository::ListQuery,
    ) -> Result<(Vec<CreditApplication>, usize), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(
        &self,
        _id: &crate::workflows::credit::applications::domain::ApplicationId,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn has_pending_for_company(
        &self,
        _company_id: &CompanyId,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}
