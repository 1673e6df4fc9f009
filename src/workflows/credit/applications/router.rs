use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::json;
use uuid::Uuid;

use super::access::ListFilters;
use super::domain::{ApplicationId, NewApplication, Principal, UserId};
use super::repository::{ApplicationRepository, CompanyDirectory, RoleDirectory};
use super::service::{CreditApplicationService, ServiceError};
use super::validation::ApplicationPatch;

/// Header carrying the upstream-authenticated subject id. Token verification
/// lives in front of this service; the router only trusts the resolved id.
pub const PRINCIPAL_HEADER: &str = "x-principal-sub";

/// Router builder exposing the credit application operations over HTTP.
pub fn application_router<R, C, D>(service: Arc<CreditApplicationService<R, C, D>>) -> Router
where
    R: ApplicationRepository + 'static,
    C: CompanyDirectory + 'static,
    D: RoleDirectory + 'static,
{
    Router::new()
        .route(
            "/api/v1/credit/applications",
            get(list_handler::<R, C, D>).post(create_handler::<R, C, D>),
        )
        .route(
            "/api/v1/credit/applications/:application_id",
            get(get_handler::<R, C, D>)
                .patch(update_handler::<R, C, D>)
                .delete(delete_handler::<R, C, D>),
        )
        .with_state(service)
}

fn principal_from(headers: &HeaderMap) -> Result<Principal, Response> {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .map(|sub| Principal::new(UserId(sub)))
        .ok_or_else(|| {
            let payload = json!({
                "error": format!("missing or invalid {PRINCIPAL_HEADER} header"),
            });
            (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
        })
}

fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::PendingApplicationExists | ServiceError::ConcurrentUpdate => {
            StatusCode::CONFLICT
        }
        ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "request failed on storage");
    }
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn create_handler<R, C, D>(
    State(service): State<Arc<CreditApplicationService<R, C, D>>>,
    headers: HeaderMap,
    axum::Json(input): axum::Json<NewApplication>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CompanyDirectory + 'static,
    D: RoleDirectory + 'static,
{
    let principal = match principal_from(&headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match service.create_application(input, &principal) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R, C, D>(
    State(service): State<Arc<CreditApplicationService<R, C, D>>>,
    headers: HeaderMap,
    Path(application_id): Path<Uuid>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CompanyDirectory + 'static,
    D: RoleDirectory + 'static,
{
    let principal = match principal_from(&headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match service.get_application(&ApplicationId(application_id), &principal) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, C, D>(
    State(service): State<Arc<CreditApplicationService<R, C, D>>>,
    headers: HeaderMap,
    Query(filters): Query<ListFilters>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CompanyDirectory + 'static,
    D: RoleDirectory + 'static,
{
    let principal = match principal_from(&headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match service.list_applications(filters, &principal) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<R, C, D>(
    State(service): State<Arc<CreditApplicationService<R, C, D>>>,
    headers: HeaderMap,
    Path(application_id): Path<Uuid>,
    axum::Json(patch): axum::Json<ApplicationPatch>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CompanyDirectory + 'static,
    D: RoleDirectory + 'static,
{
    let principal = match principal_from(&headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match service.update_application(&ApplicationId(application_id), patch, &principal) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<R, C, D>(
    State(service): State<Arc<CreditApplicationService<R, C, D>>>,
    headers: HeaderMap,
    Path(application_id): Path<Uuid>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CompanyDirectory + 'static,
    D: RoleDirectory + 'static,
{
    let principal = match principal_from(&headers) {
        Ok(principal) => principal,
        Err(response) => return response,
    };
    match service.delete_application(&ApplicationId(application_id), &principal) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}
