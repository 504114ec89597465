//! Loan application scoring, request history, and exploratory reporting.
//!
//! Submissions flow through [`scoring`] (encode, standardize, classify, or the
//! rule fallback when no model artifact loaded), are persisted through a
//! [`LoanRequestRepository`], and are summarized by [`analytics`].

pub mod analytics;
pub mod domain;
pub mod export;
pub mod repository;
pub mod router;
pub mod scoring;
mod seed;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use analytics::{analyze, AnalysisOutcome, ChartOutcome, ExploratoryReport};
pub use domain::{ApplicationRecord, LoanApplication, NewLoanRequest, PredictionLabel, RequestId};
pub use export::write_requests_csv;
pub use repository::{LoanRequestRepository, RepositoryError};
pub use router::loan_router;
pub use scoring::{
    ArtifactState, EncodingError, LoanScorer, ModelMetrics, PredictionSource, RawApplication,
    ScoringError,
};
pub use seed::sample_requests;
pub use service::{LoanRequestService, LoanServiceError, PredictionView, TimestampRepair};
pub use store::SqliteRequestStore;
