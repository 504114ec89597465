use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::loan::domain::{ApplicationRecord, NewLoanRequest, RequestId};
use crate::workflows::loan::repository::{LoanRequestRepository, RepositoryError};
use crate::workflows::loan::scoring::{LoanScorer, RawApplication};
use crate::workflows::loan::{loan_router, sample_requests, LoanRequestService};

pub(super) fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 2, 3, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Approved by the first fallback rule.
pub(super) fn strong_application() -> RawApplication {
    RawApplication::new()
        .with("gender", "Female")
        .with("married", "No")
        .with("dependents", "0")
        .with("education", "Graduate")
        .with("self_employed", "No")
        .with("applicant_income", "6000")
        .with("coapplicant_income", "0")
        .with("loan_amount", "150")
        .with("loan_term", "360")
        .with("credit_history", "1")
        .with("property_area", "Urban")
}

/// Rejected by every fallback rule.
pub(super) fn weak_application() -> RawApplication {
    strong_application()
        .with("applicant_income", "2000")
        .with("loan_amount", "300")
        .with("credit_history", "0")
}

/// The five demo requests as stored records with ids 1..=5.
pub(super) fn seeded_records() -> Vec<ApplicationRecord> {
    sample_requests(fixed_time())
        .into_iter()
        .enumerate()
        .map(|(index, request)| request.into_record(RequestId(index as i64 + 1)))
        .collect()
}

pub(super) fn build_service() -> (LoanRequestService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let scorer = Arc::new(LoanScorer::fallback_only("no artifact in tests"));
    let service = LoanRequestService::new(scorer, repository.clone());
    (service, repository)
}

pub(super) fn build_router() -> (Router, Arc<MemoryRepository>) {
    let (service, repository) = build_service();
    (loan_router(Arc::new(service)), repository)
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    records: BTreeMap<RequestId, ApplicationRecord>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    /// Stores a record as-is, bypassing id assignment.
    pub(super) fn put(&self, record: ApplicationRecord) {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.last_id = guard.last_id.max(record.id.0);
        guard.records.insert(record.id, record);
    }
}

impl LoanRequestRepository for MemoryRepository {
    fn insert(&self, request: NewLoanRequest) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.last_id += 1;
        let record = request.into_record(RequestId(guard.last_id));
        guard.records.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: RequestId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.records.get(&id).cloned())
    }

    fn all(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.records.values().cloned().collect())
    }

    fn delete(&self, id: RequestId) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(id))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.records.len())
    }

    fn repair_missing_timestamps(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let mut fixed = 0;
        for record in guard.records.values_mut() {
            if record.request_date.is_none() {
                record.request_date = Some(now);
                fixed += 1;
            }
        }
        Ok(fixed)
    }
}

pub(super) struct UnavailableRepository;

impl LoanRequestRepository for UnavailableRepository {
    fn insert(&self, _request: NewLoanRequest) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: RequestId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: RequestId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn repair_missing_timestamps(&self, _now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
