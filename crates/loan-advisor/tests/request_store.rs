//! The SQLite-backed store behind the service facade: durability across
//! reopen, seeding, and reporting over persisted rows.

use std::path::PathBuf;
use std::sync::Arc;

use loan_advisor::workflows::loan::scoring::RawApplication;
use loan_advisor::workflows::loan::{
    LoanRequestRepository, LoanRequestService, LoanScorer, PredictionLabel, SqliteRequestStore,
};

fn database_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "loan-advisor-{}-{name}.db",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

fn form_application() -> RawApplication {
    RawApplication::new()
        .with("gender", "Female")
        .with("married", "No")
        .with("dependents", "1")
        .with("education", "Graduate")
        .with("self_employed", "No")
        .with("applicant_income", " 3500 ")
        .with("coapplicant_income", "0")
        .with("loan_amount", "90")
        .with("loan_term", "180")
        .with("credit_history", "0")
        .with("property_area", "Semiurban")
}

#[test]
fn submitted_requests_survive_reopening_the_store() {
    let path = database_path("durable");

    let submitted = {
        let store = Arc::new(SqliteRequestStore::open(&path).expect("open store"));
        let service = LoanRequestService::new(Arc::new(LoanScorer::fallback_only("none")), store);
        service.submit(&form_application()).expect("submit")
    };
    assert_eq!(submitted.prediction, PredictionLabel::Approved);

    let reopened = SqliteRequestStore::open(&path).expect("reopen store");
    let records = reopened.all().expect("all");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, submitted.id);
    assert_eq!(records[0].applicant_income, Some(3500.0));
    assert_eq!(records[0].loan_term, Some(180));
    assert!(records[0].request_date.is_some());

    drop(reopened);
    std::fs::remove_file(path).ok();
}

#[test]
fn seeded_store_produces_a_full_report() {
    let store = Arc::new(SqliteRequestStore::open_in_memory().expect("open store"));
    let service = LoanRequestService::new(
        Arc::new(LoanScorer::fallback_only("none")),
        store.clone(),
    );

    assert_eq!(service.seed_samples_if_empty().expect("seed"), 5);
    let outcome = service.exploratory_report();
    let report = outcome.report().expect("report computed");

    assert_eq!(report.total_requests, 5);
    assert_eq!(report.approval_distribution.values, [3, 2]);
    assert_eq!(report.self_employed_analysis["Yes"].count, 1);
    assert_eq!(report.self_employed_analysis["No"].approval_rate, 75.0);

    let charts = service.chart_data();
    let charts = charts.charts().expect("charts computed");
    assert_eq!(charts.approval_rates["area_Urban"], 100.0);
    assert_eq!(store.count().expect("count"), 5);
}
