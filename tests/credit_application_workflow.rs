//! Integration specifications for the credit application workflow.
//!
//! Scenarios exercise the public service facade and the HTTP router end to
//! end: drafting, submission, review transitions, and the role-based
//! visibility rules, without reaching into private modules.

mod common {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use uuid::Uuid;

    use credit_desk::workflows::credit::applications::domain::{
        Company, CompanyId, CreditPurpose, NewApplication, Principal, Role, UserId,
    };
    use credit_desk::workflows::credit::applications::memory::{
        MemoryCompanyDirectory, MemoryRoleDirectory, MemoryStore,
    };
    use credit_desk::workflows::credit::{CreditApplicationService, WorkflowPolicy};

    pub(super) type Service =
        CreditApplicationService<MemoryStore, MemoryCompanyDirectory, MemoryRoleDirectory>;

    pub(super) struct Scenario {
        pub(super) service: Arc<Service>,
        pub(super) applicant: Principal,
        pub(super) operator: Principal,
        pub(super) admin: Principal,
        pub(super) company_id: CompanyId,
    }

    pub(super) fn dec(value: &str) -> Decimal {
        value.parse().expect("valid decimal literal")
    }

    pub(super) fn scenario() -> Scenario {
        let store = Arc::new(MemoryStore::default());
        let companies = Arc::new(MemoryCompanyDirectory::default());
        let roles = Arc::new(MemoryRoleDirectory::default());

        let applicant = Principal::new(UserId(Uuid::new_v4()));
        let operator = Principal::new(UserId(Uuid::new_v4()));
        let admin = Principal::new(UserId(Uuid::new_v4()));

        roles
            .assign(applicant.sub, Role::Applicant)
            .expect("assign applicant");
        roles
            .assign(operator.sub, Role::Operator)
            .expect("assign operator");
        roles.assign(admin.sub, Role::Admin).expect("assign admin");

        let company_id = CompanyId(Uuid::new_v4());
        companies
            .register(Company {
                id: company_id,
                user_id: applicant.sub,
                legal_name: "Acme Tooling LLC".to_string(),
            })
            .expect("register company");

        let service = Arc::new(CreditApplicationService::new(
            store,
            companies,
            roles,
            WorkflowPolicy::strict(),
        ));

        Scenario {
            service,
            applicant,
            operator,
            admin,
            company_id,
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

    pub(super) async fn read_json_body(
        response: axum::http::Response<axum::body::Body>,
    ) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }
}

use common::{dec, equipment_request, read_json_body, scenario};

use credit_desk::workflows::credit::applications::access::ListFilters;
use credit_desk::workflows::credit::applications::domain::ApplicationStatus;
use credit_desk::workflows::credit::applications::router::{
    application_router, PRINCIPAL_HEADER,
};
use credit_desk::workflows::credit::applications::validation::{
    ApplicationPatch, ValidationError,
};
use credit_desk::workflows::credit::ServiceError;
use tower::ServiceExt;

#[test]
fn application_moves_from_draft_to_approval() {
    let s = scenario();

    let draft = s
        .service
        .create_application(equipment_request(), &s.applicant)
        .expect("draft created");
    assert_eq!(draft.status, ApplicationStatus::Draft);
    assert_eq!(draft.company_id, s.company_id);

    let pending = s
        .service
        .update_application(
            &draft.id,
            ApplicationPatch {
                status: Some(ApplicationStatus::Pending),
                ..ApplicationPatch::default()
            },
            &s.applicant,
        )
        .expect("submitted");
    assert_eq!(pending.status, ApplicationStatus::Pending);

    let approved = s
        .service
        .update_application(
            &pending.id,
            ApplicationPatch {
                status: Some(ApplicationStatus::Approved),
                approved_amount: Some(dec("9000")),
                interest_rate: Some(dec("12.5")),
                ..ApplicationPatch::default()
            },
            &s.operator,
        )
        .expect("approved");
    assert_eq!(approved.status, ApplicationStatus::Approved);
    assert_eq!(approved.approved_amount, Some(dec("9000")));
    assert_eq!(approved.interest_rate, Some(dec("12.5")));

    // Approval is final; a later rejection attempt is refused.
    let rejection = s.service.update_application(
        &approved.id,
        ApplicationPatch {
            status: Some(ApplicationStatus::Rejected),
            ..ApplicationPatch::default()
        },
        &s.admin,
    );
    match rejection {
        Err(ServiceError::Validation(ValidationError::Transition(err))) => {
            assert_eq!(err.from, ApplicationStatus::Approved);
            assert!(err.allowed.is_empty());
        }
        other => panic!("expected transition refusal, got {other:?}"),
    }
}

#[test]
fn drafts_stay_invisible_to_the_review_side() {
    let s = scenario();
    let draft = s
        .service
        .create_application(equipment_request(), &s.applicant)
        .expect("draft created");

    assert!(matches!(
        s.service.get_application(&draft.id, &s.operator),
        Err(ServiceError::NotFound)
    ));

    let staff_view = s
        .service
        .list_applications(ListFilters::default(), &s.operator)
        .expect("staff listing");
    assert_eq!(staff_view.meta.total, 0);

    let own_view = s
        .service
        .list_applications(ListFilters::default(), &s.applicant)
        .expect("own listing");
    assert_eq!(own_view.meta.total, 1);
}

#[tokio::test]
async fn http_surface_carries_the_full_lifecycle() {
    let s = scenario();
    let router = application_router(s.service.clone());

    // Create.
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/api/v1/credit/applications")
                .header(PRINCIPAL_HEADER, s.applicant.sub.0.to_string())
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&equipment_request()).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let created = read_json_body(response).await;
    let id = created
        .get("id")
        .and_then(serde_json::Value::as_str)
        .expect("id in payload")
        .to_string();

    // Submit.
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::patch(format!("/api/v1/credit/applications/{id}"))
                .header(PRINCIPAL_HEADER, s.applicant.sub.0.to_string())
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({ "status": "pending" }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    // Approve.
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::patch(format!("/api/v1/credit/applications/{id}"))
                .header(PRINCIPAL_HEADER, s.operator.sub.0.to_string())
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::json!({
                        "status": "approved",
                        "approved_amount": "9000",
                        "interest_rate": "12.5",
                    })
                    .to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let approved = read_json_body(response).await;
    assert_eq!(
        approved.get("status").and_then(serde_json::Value::as_str),
        Some("approved")
    );

    // Listing as staff now shows the settled application.
    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/credit/applications?status=approved")
                .header(PRINCIPAL_HEADER, s.admin.sub.0.to_string())
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let page = read_json_body(response).await;
    assert_eq!(
        page.pointer("/meta/total")
            .and_then(serde_json::Value::as_u64),
        Some(1)
    );
}

#[test]
fn one_pending_application_per_company() {
    let s = scenario();
    let draft = s
        .service
        .create_application(equipment_request(), &s.applicant)
        .expect("draft created");
    s.service
        .update_application(
            &draft.id,
            ApplicationPatch {
                status: Some(ApplicationStatus::Pending),
                ..ApplicationPatch::default()
            },
            &s.applicant,
        )
        .expect("submitted");

    assert!(matches!(
        s.service
            .create_application(equipment_request(), &s.applicant),
        Err(ServiceError::PendingApplicationExists)
    ));
}
