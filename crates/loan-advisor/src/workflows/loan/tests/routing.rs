use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::loan::domain::RequestId;
use crate::workflows::loan::repository::LoanRequestRepository;
use crate::workflows::loan::router::delete_request_handler;
use crate::workflows::loan::{loan_router, LoanRequestService, LoanScorer};

const FORM: &str = "gender=Male&married=Yes&dependents=3%2B&education=Graduate\
&self_employed=No&applicant_income=4000&coapplicant_income=1500&loan_amount=250\
&loan_term=360&credit_history=0&property_area=Semiurban";

fn form_request(body: &str) -> Request<Body> {
    Request::post("/add_request")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn add_request_redirects_and_persists_raw_tokens() {
    let (router, repository) = build_router();

    let response = router
        .clone()
        .oneshot(form_request(FORM))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/view_requests"
    );

    let stored = repository.all().expect("all");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].dependents.as_deref(), Some("3+"));
    assert_eq!(stored[0].prediction.label(), "Rejected");

    let listing = router
        .oneshot(get("/view_requests"))
        .await
        .expect("route executes");
    assert_eq!(listing.status(), StatusCode::OK);
    let payload = read_json_body(listing).await;
    assert_eq!(payload[0]["property_area"], json!("Semiurban"));
    assert_eq!(payload[0]["prediction"], json!("Rejected"));
}

#[tokio::test]
async fn add_request_with_missing_field_is_bad_request() {
    let (router, repository) = build_router();
    let truncated = FORM.replace("&property_area=Semiurban", "");

    let response = router
        .oneshot(form_request(&truncated))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        json!("missing required field 'property_area'")
    );
    assert_eq!(repository.count().expect("count"), 0);
}

#[tokio::test]
async fn api_predict_accepts_native_numbers() {
    let (router, repository) = build_router();
    let body = json!({
        "gender": "Female",
        "married": "No",
        "dependents": 0,
        "education": "Graduate",
        "self_employed": "No",
        "applicant_income": 6000,
        "coapplicant_income": 0.0,
        "loan_amount": 150,
        "loan_term": 360,
        "credit_history": 1,
        "property_area": "Urban"
    });

    let response = router
        .oneshot(json_request("/api/predict", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload,
        json!({"prediction": "Approved", "confidence": "Low (using fallback)"})
    );
    assert_eq!(repository.count().expect("count"), 0);
}

#[tokio::test]
async fn api_predict_rejects_empty_payload() {
    let (router, _) = build_router();

    let response = router
        .oneshot(json_request("/api/predict", json!({})))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload, json!({"error": "No data provided"}));
}

#[tokio::test]
async fn api_predict_treats_null_body_as_empty() {
    let (router, _) = build_router();

    let response = router
        .oneshot(json_request("/api/predict", serde_json::Value::Null))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload, json!({"error": "No data provided"}));
}

#[tokio::test]
async fn api_predict_rejects_nested_values_as_json_error() {
    let (router, _) = build_router();

    let response = router
        .oneshot(json_request(
            "/api/predict",
            json!({"gender": "Male", "applicant_income": [1]}),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"].is_string());
}

#[tokio::test]
async fn api_predict_rejects_non_object_and_malformed_bodies() {
    let (router, _) = build_router();

    let response = router
        .clone()
        .oneshot(json_request("/api/predict", json!(42)))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json_body(response).await["error"].is_string());

    let truncated = Request::post("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"gender\": "))
        .expect("request builds");
    let response = router.oneshot(truncated).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn api_predict_rejects_unparseable_numbers() {
    let (router, _) = build_router();
    let body = json!({
        "gender": "Male",
        "married": "Yes",
        "dependents": "1",
        "education": "Graduate",
        "self_employed": "No",
        "applicant_income": "plenty",
        "coapplicant_income": "0",
        "loan_amount": "100",
        "loan_term": "360",
        "credit_history": "1",
        "property_area": "Rural"
    });

    let response = router
        .oneshot(json_request("/api/predict", body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_route_redirects_then_reports_missing() {
    let (service, repository) = build_service();
    let service = Arc::new(service);
    service.seed_samples_if_empty().expect("seed");
    let router = loan_router(service.clone());

    let response = router
        .clone()
        .oneshot(
            Request::post("/delete_request/2")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(repository.fetch(RequestId(2)).expect("fetch").is_none());
    assert_eq!(repository.count().expect("count"), 4);

    let again = router
        .oneshot(get("/delete_request/2"))
        .await
        .expect("route executes");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_handler_maps_store_outage_to_internal_error() {
    let service = Arc::new(LoanRequestService::new(
        Arc::new(LoanScorer::fallback_only("none")),
        Arc::new(UnavailableRepository),
    ));

    let response =
        delete_request_handler::<UnavailableRepository>(State(service), Path(1)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn eda_and_charts_return_error_payload_when_empty() {
    let (router, _) = build_router();

    for uri in ["/eda", "/charts"] {
        let response = router.clone().oneshot(get(uri)).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let payload = read_json_body(response).await;
        assert!(payload["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn eda_returns_report_after_seeding() {
    let (service, _) = build_service();
    let service = Arc::new(service);
    service.seed_samples_if_empty().expect("seed");

    let response = loan_router(service)
        .oneshot(get("/eda"))
        .await
        .expect("route executes");

    let payload = read_json_body(response).await;
    assert_eq!(payload["total_requests"], json!(5));
    assert_eq!(
        payload["approval_distribution"]["percentages"],
        json!([60.0, 40.0])
    );
    assert_eq!(
        payload["property_area_analysis"]["Urban"],
        json!({"count": 2, "approval_rate": 100.0})
    );
}

#[tokio::test]
async fn fix_dates_and_model_metrics_report_json() {
    let (router, _) = build_router();

    let repaired = router
        .clone()
        .oneshot(
            Request::post("/fix_dates")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(repaired.status(), StatusCode::OK);
    let payload = read_json_body(repaired).await;
    assert_eq!(payload["fixed"], json!(0));

    let metrics = router
        .oneshot(get("/model_metrics"))
        .await
        .expect("route executes");
    let payload = read_json_body(metrics).await;
    assert_eq!(payload["model_type"], json!("Simple Rules"));
    assert_eq!(payload["accuracy"], json!(0.75));
}
