use loan_advisor::config::AppConfig;
use loan_advisor::error::AppError;
use loan_advisor::workflows::loan::{
    ArtifactState, LoanRequestService, LoanScorer, SqliteRequestStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type LoanService = LoanRequestService<SqliteRequestStore>;

/// Attempts the model load once; an unusable artifact leaves the scorer in
/// rule-fallback mode.
pub(crate) fn build_scorer(config: &AppConfig) -> Arc<LoanScorer> {
    Arc::new(LoanScorer::new(ArtifactState::load(
        &config.model.artifact_path,
    )))
}

pub(crate) fn build_service(config: &AppConfig) -> Result<Arc<LoanService>, AppError> {
    let store = SqliteRequestStore::open(&config.storage.database_path)?;
    Ok(Arc::new(LoanRequestService::new(
        build_scorer(config),
        Arc::new(store),
    )))
}
