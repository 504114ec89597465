use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use super::domain::{ApplicationRecord, NewLoanRequest, PredictionLabel, RequestId};
use super::repository::{LoanRequestRepository, RepositoryError};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS loan_request (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    gender             TEXT,
    married            TEXT,
    dependents         TEXT,
    education          TEXT,
    self_employed      TEXT,
    applicant_income   REAL,
    coapplicant_income REAL,
    loan_amount        REAL,
    loan_term          INTEGER,
    credit_history     REAL,
    property_area      TEXT,
    prediction         TEXT NOT NULL,
    request_date       TEXT
)";

const SELECT_COLUMNS: &str = "SELECT id, gender, married, dependents, education, self_employed,
    applicant_income, coapplicant_income, loan_amount, loan_term, credit_history,
    property_area, prediction, request_date FROM loan_request";

/// Durable request store backed by a single SQLite file.
pub struct SqliteRequestStore {
    connection: Mutex<Connection>,
}

fn unavailable(err: rusqlite::Error) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}

impl SqliteRequestStore {
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        let connection = Connection::open(path).map_err(unavailable)?;
        info!(path = %path.display(), "opened loan request store");
        Self::with_connection(connection)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        Self::with_connection(Connection::open_in_memory().map_err(unavailable)?)
    }

    fn with_connection(connection: Connection) -> Result<Self, RepositoryError> {
        connection.execute(CREATE_TABLE, []).map_err(unavailable)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        self.connection
            .lock()
            .map_err(|_| RepositoryError::Unavailable("connection mutex poisoned".to_string()))
    }
}

/// Column values as SQLite hands them back, before label/timestamp parsing.
struct StoredRow {
    id: i64,
    gender: Option<String>,
    married: Option<String>,
    dependents: Option<String>,
    education: Option<String>,
    self_employed: Option<String>,
    applicant_income: Option<f64>,
    coapplicant_income: Option<f64>,
    loan_amount: Option<f64>,
    loan_term: Option<i64>,
    credit_history: Option<f64>,
    property_area: Option<String>,
    prediction: String,
    request_date: Option<String>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            gender: row.get(1)?,
            married: row.get(2)?,
            dependents: row.get(3)?,
            education: row.get(4)?,
            self_employed: row.get(5)?,
            applicant_income: row.get(6)?,
            coapplicant_income: row.get(7)?,
            loan_amount: row.get(8)?,
            loan_term: row.get(9)?,
            credit_history: row.get(10)?,
            property_area: row.get(11)?,
            prediction: row.get(12)?,
            request_date: row.get(13)?,
        })
    }

    fn into_record(self) -> Result<ApplicationRecord, RepositoryError> {
        let prediction: PredictionLabel = self
            .prediction
            .parse()
            .map_err(|err| RepositoryError::Corrupt(format!("request {}: {err}", self.id)))?;

        let request_date = self
            .request_date
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|stamp| stamp.with_timezone(&Utc))
                    .map_err(|err| {
                        RepositoryError::Corrupt(format!(
                            "request {}: bad timestamp '{raw}' ({err})",
                            self.id
                        ))
                    })
            })
            .transpose()?;

        Ok(ApplicationRecord {
            id: RequestId(self.id),
            gender: self.gender,
            married: self.married,
            dependents: self.dependents,
            education: self.education,
            self_employed: self.self_employed,
            applicant_income: self.applicant_income,
            coapplicant_income: self.coapplicant_income,
            loan_amount: self.loan_amount,
            loan_term: self.loan_term,
            credit_history: self.credit_history,
            property_area: self.property_area,
            prediction,
            request_date,
        })
    }
}

impl LoanRequestRepository for SqliteRequestStore {
    fn insert(&self, request: NewLoanRequest) -> Result<ApplicationRecord, RepositoryError> {
        let connection = self.connection()?;
        let application = &request.application;
        connection
            .execute(
                "INSERT INTO loan_request (gender, married, dependents, education, self_employed,
                    applicant_income, coapplicant_income, loan_amount, loan_term, credit_history,
                    property_area, prediction, request_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    application.gender,
                    application.married,
                    application.dependents,
                    application.education,
                    application.self_employed,
                    application.applicant_income,
                    application.coapplicant_income,
                    application.loan_amount,
                    application.loan_term.trunc() as i64,
                    application.credit_history,
                    application.property_area,
                    request.prediction.label(),
                    request.requested_at.to_rfc3339(),
                ],
            )
            .map_err(unavailable)?;

        let id = RequestId(connection.last_insert_rowid());
        Ok(request.into_record(id))
    }

    fn fetch(&self, id: RequestId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let connection = self.connection()?;
        let row = connection
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.0],
                StoredRow::from_row,
            )
            .optional()
            .map_err(unavailable)?;
        row.map(StoredRow::into_record).transpose()
    }

    fn all(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let connection = self.connection()?;
        let mut statement = connection
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY id"))
            .map_err(unavailable)?;
        let rows = statement
            .query_map([], StoredRow::from_row)
            .map_err(unavailable)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(unavailable)?;
        rows.into_iter().map(StoredRow::into_record).collect()
    }

    fn delete(&self, id: RequestId) -> Result<(), RepositoryError> {
        let connection = self.connection()?;
        let removed = connection
            .execute("DELETE FROM loan_request WHERE id = ?1", params![id.0])
            .map_err(unavailable)?;
        if removed == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let connection = self.connection()?;
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM loan_request", [], |row| row.get(0))
            .map_err(unavailable)?;
        Ok(count as usize)
    }

    fn repair_missing_timestamps(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let connection = self.connection()?;
        connection
            .execute(
                "UPDATE loan_request SET request_date = ?1 WHERE request_date IS NULL",
                params![now.to_rfc3339()],
            )
            .map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::loan::domain::LoanApplication;
    use chrono::TimeZone;

    fn request(prediction: PredictionLabel) -> NewLoanRequest {
        NewLoanRequest {
            application: LoanApplication {
                gender: "Male".to_string(),
                married: "Yes".to_string(),
                dependents: "3+".to_string(),
                dependents_count: 3.0,
                education: "Graduate".to_string(),
                self_employed: "No".to_string(),
                applicant_income: 4000.0,
                coapplicant_income: 1500.0,
                loan_amount: 250.0,
                loan_term: 360.0,
                credit_history: 0.0,
                property_area: "Semiurban".to_string(),
            },
            prediction,
            requested_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn insert_assigns_ids_and_round_trips_columns() {
        let store = SqliteRequestStore::open_in_memory().expect("store opens");
        let first = store
            .insert(request(PredictionLabel::Rejected))
            .expect("insert");
        let second = store
            .insert(request(PredictionLabel::Approved))
            .expect("insert");
        assert!(second.id > first.id);

        let loaded = store.fetch(first.id).expect("fetch").expect("present");
        assert_eq!(loaded, first);
        assert_eq!(loaded.dependents.as_deref(), Some("3+"));
        assert_eq!(loaded.loan_term, Some(360));
        assert_eq!(store.count().expect("count"), 2);
        assert_eq!(store.all().expect("all").len(), 2);
    }

    #[test]
    fn delete_reports_missing_ids() {
        let store = SqliteRequestStore::open_in_memory().expect("store opens");
        let record = store
            .insert(request(PredictionLabel::Approved))
            .expect("insert");
        store.delete(record.id).expect("delete");
        assert!(store.fetch(record.id).expect("fetch").is_none());
        assert!(matches!(
            store.delete(record.id),
            Err(RepositoryError::NotFound(id)) if id == record.id
        ));
    }

    #[test]
    fn repair_only_touches_null_timestamps() {
        let store = SqliteRequestStore::open_in_memory().expect("store opens");
        let kept = store
            .insert(request(PredictionLabel::Approved))
            .expect("insert");
        let legacy = store
            .insert(request(PredictionLabel::Rejected))
            .expect("insert");
        store
            .connection()
            .expect("lock")
            .execute(
                "UPDATE loan_request SET request_date = NULL WHERE id = ?1",
                params![legacy.id.0],
            )
            .expect("null out timestamp");

        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(store.repair_missing_timestamps(now).expect("repair"), 1);
        assert_eq!(store.repair_missing_timestamps(now).expect("repair"), 0);

        let repaired = store.fetch(legacy.id).expect("fetch").expect("present");
        assert_eq!(repaired.request_date, Some(now));
        let untouched = store.fetch(kept.id).expect("fetch").expect("present");
        assert_eq!(untouched.request_date, kept.request_date);
    }

    #[test]
    fn unknown_prediction_text_is_corrupt() {
        let store = SqliteRequestStore::open_in_memory().expect("store opens");
        let record = store
            .insert(request(PredictionLabel::Approved))
            .expect("insert");
        store
            .connection()
            .expect("lock")
            .execute(
                "UPDATE loan_request SET prediction = 'Maybe' WHERE id = ?1",
                params![record.id.0],
            )
            .expect("tamper");
        assert!(matches!(store.all(), Err(RepositoryError::Corrupt(_))));
    }
}
