use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Value};

use super::domain::RequestId;
use super::repository::{LoanRequestRepository, RepositoryError};
use super::scoring::RawApplication;
use super::service::{LoanRequestService, LoanServiceError};

const REQUESTS_PATH: &str = "/view_requests";

/// Router builder exposing intake, history, and reporting endpoints.
pub fn loan_router<R>(service: Arc<LoanRequestService<R>>) -> Router
where
    R: LoanRequestRepository + 'static,
{
    Router::new()
        .route("/add_request", post(add_request_handler::<R>))
        .route(REQUESTS_PATH, get(view_requests_handler::<R>))
        .route(
            "/delete_request/:id",
            get(delete_request_handler::<R>).post(delete_request_handler::<R>),
        )
        .route("/eda", get(eda_handler::<R>))
        .route("/charts", get(charts_handler::<R>))
        .route("/api/predict", post(predict_handler::<R>))
        .route("/model_metrics", get(model_metrics_handler::<R>))
        .route("/fix_dates", post(fix_dates_handler::<R>))
        .with_state(service)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "error": message.into(),
    });
    (status, Json(payload)).into_response()
}

fn service_error_response(err: LoanServiceError) -> Response {
    match err {
        LoanServiceError::Scoring(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        LoanServiceError::Repository(RepositoryError::NotFound(id)) => error_response(
            StatusCode::NOT_FOUND,
            format!("loan request {id} not found"),
        ),
        LoanServiceError::Repository(other) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

pub(crate) async fn add_request_handler<R>(
    State(service): State<Arc<LoanRequestService<R>>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response
where
    R: LoanRequestRepository + 'static,
{
    let raw = RawApplication::from(fields);
    match service.submit(&raw) {
        Ok(_) => Redirect::to(REQUESTS_PATH).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn view_requests_handler<R>(
    State(service): State<Arc<LoanRequestService<R>>>,
) -> Response
where
    R: LoanRequestRepository + 'static,
{
    match service.requests() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn delete_request_handler<R>(
    State(service): State<Arc<LoanRequestService<R>>>,
    Path(id): Path<i64>,
) -> Response
where
    R: LoanRequestRepository + 'static,
{
    match service.delete(RequestId(id)) {
        Ok(_) => Redirect::to(REQUESTS_PATH).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn eda_handler<R>(State(service): State<Arc<LoanRequestService<R>>>) -> Response
where
    R: LoanRequestRepository + 'static,
{
    (StatusCode::OK, Json(service.exploratory_report())).into_response()
}

pub(crate) async fn charts_handler<R>(
    State(service): State<Arc<LoanRequestService<R>>>,
) -> Response
where
    R: LoanRequestRepository + 'static,
{
    (StatusCode::OK, Json(service.chart_data())).into_response()
}

pub(crate) async fn predict_handler<R>(
    State(service): State<Arc<LoanRequestService<R>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response
where
    R: LoanRequestRepository + 'static,
{
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    if is_blank(&body) {
        return error_response(StatusCode::BAD_REQUEST, "No data provided");
    }
    let raw = match serde_json::from_value::<RawApplication>(body) {
        Ok(raw) => raw,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("invalid application payload: {err}"),
            )
        }
    };
    match service.predict(&raw) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => service_error_response(err),
    }
}

/// Bodies that carry no attributes at all: `null`, `false`, `""`, `[]` or `{}`.
fn is_blank(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Number(_) => false,
    }
}

pub(crate) async fn model_metrics_handler<R>(
    State(service): State<Arc<LoanRequestService<R>>>,
) -> Response
where
    R: LoanRequestRepository + 'static,
{
    (StatusCode::OK, Json(service.model_metrics())).into_response()
}

pub(crate) async fn fix_dates_handler<R>(
    State(service): State<Arc<LoanRequestService<R>>>,
) -> Response
where
    R: LoanRequestRepository + 'static,
{
    match service.repair_timestamps() {
        Ok(repair) => (StatusCode::OK, Json(repair)).into_response(),
        Err(err) => service_error_response(err),
    }
}
