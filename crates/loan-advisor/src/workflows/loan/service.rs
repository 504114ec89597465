use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use super::analytics::{analyze, prepare_chart_data, AnalysisOutcome, ChartOutcome};
use super::domain::{ApplicationRecord, NewLoanRequest, PredictionLabel, RequestId};
use super::repository::{LoanRequestRepository, RepositoryError};
use super::scoring::{LoanScorer, ModelMetrics, RawApplication, ScoringError, ScoringOutcome};
use super::seed::sample_requests;

/// Response body of the stateless prediction endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionView {
    pub prediction: PredictionLabel,
    pub confidence: &'static str,
}

impl From<&ScoringOutcome> for PredictionView {
    fn from(outcome: &ScoringOutcome) -> Self {
        Self {
            prediction: outcome.label,
            confidence: outcome.source.confidence(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimestampRepair {
    pub fixed: usize,
    pub message: String,
}

/// Service composing the scoring pipeline with the request store.
pub struct LoanRequestService<R> {
    scorer: Arc<LoanScorer>,
    repository: Arc<R>,
}

impl<R> LoanRequestService<R>
where
    R: LoanRequestRepository + 'static,
{
    pub fn new(scorer: Arc<LoanScorer>, repository: Arc<R>) -> Self {
        Self { scorer, repository }
    }

    pub fn scorer(&self) -> &LoanScorer {
        &self.scorer
    }

    /// Score an application and persist it with its label. Nothing is stored
    /// when scoring fails.
    pub fn submit(&self, raw: &RawApplication) -> Result<ApplicationRecord, LoanServiceError> {
        let outcome = self.scorer.predict(raw)?;
        let record = self.repository.insert(NewLoanRequest {
            application: outcome.application,
            prediction: outcome.label,
            requested_at: Utc::now(),
        })?;
        info!(
            id = %record.id,
            prediction = %record.prediction,
            source = ?outcome.source,
            "stored loan request"
        );
        Ok(record)
    }

    /// Score without persisting.
    pub fn predict(&self, raw: &RawApplication) -> Result<PredictionView, LoanServiceError> {
        let outcome = self.scorer.predict(raw)?;
        info!(prediction = %outcome.label, source = ?outcome.source, "scored loan application");
        Ok(PredictionView::from(&outcome))
    }

    pub fn requests(&self) -> Result<Vec<ApplicationRecord>, LoanServiceError> {
        Ok(self.repository.all()?)
    }

    /// Remove a stored request and hand back what was removed.
    pub fn delete(&self, id: RequestId) -> Result<ApplicationRecord, LoanServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound(id))?;
        self.repository.delete(id)?;
        info!(%id, prediction = %record.prediction, "deleted loan request");
        Ok(record)
    }

    pub fn repair_timestamps(&self) -> Result<TimestampRepair, LoanServiceError> {
        let fixed = self.repository.repair_missing_timestamps(Utc::now())?;
        info!(fixed, "repaired missing request timestamps");
        let message = if fixed > 0 {
            format!("Repaired {fixed} missing request timestamps.")
        } else {
            "All request timestamps are already set.".to_string()
        };
        Ok(TimestampRepair { fixed, message })
    }

    /// Never fails: store errors become the report's error payload.
    pub fn exploratory_report(&self) -> AnalysisOutcome {
        match self.repository.all() {
            Ok(records) => analyze(&records),
            Err(err) => {
                error!(error = %err, "failed to load requests for analysis");
                AnalysisOutcome::unavailable(format!("Failed to load loan requests: {err}"))
            }
        }
    }

    pub fn chart_data(&self) -> ChartOutcome {
        match self.repository.all() {
            Ok(records) => prepare_chart_data(&records),
            Err(err) => {
                error!(error = %err, "failed to load requests for charts");
                ChartOutcome::unavailable(format!("Failed to load loan requests: {err}"))
            }
        }
    }

    pub fn model_metrics(&self) -> ModelMetrics {
        self.scorer.metrics()
    }

    /// Returns how many sample requests were inserted.
    pub fn seed_samples_if_empty(&self) -> Result<usize, LoanServiceError> {
        if self.repository.count()? > 0 {
            return Ok(0);
        }
        let samples = sample_requests(Utc::now());
        let inserted = samples.len();
        for sample in samples {
            self.repository.insert(sample)?;
        }
        info!(inserted, "seeded sample loan requests");
        Ok(inserted)
    }
}

/// Error raised by the loan request service.
#[derive(Debug, thiserror::Error)]
pub enum LoanServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
