use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the request store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub i64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary decision attached to every stored request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionLabel {
    Approved,
    Rejected,
}

impl PredictionLabel {
    /// Classifier output `1` means approval; anything else is a rejection.
    pub const fn from_class(class: u8) -> Self {
        if class == 1 {
            PredictionLabel::Approved
        } else {
            PredictionLabel::Rejected
        }
    }

    pub const fn class(self) -> u8 {
        match self {
            PredictionLabel::Approved => 1,
            PredictionLabel::Rejected => 0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PredictionLabel::Approved => "Approved",
            PredictionLabel::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown prediction label '{0}'")]
pub struct UnknownPredictionLabel(pub String);

impl FromStr for PredictionLabel {
    type Err = UnknownPredictionLabel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Approved" => Ok(PredictionLabel::Approved),
            "Rejected" => Ok(PredictionLabel::Rejected),
            other => Err(UnknownPredictionLabel(other.to_string())),
        }
    }
}

/// Applicant attributes after numeric coercion, ready for scoring and storage.
///
/// Categorical fields keep the submitted text verbatim; the encoder compares them
/// literally and unrecognized values simply binarize to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub gender: String,
    pub married: String,
    /// Raw token as submitted, e.g. `"3+"`.
    pub dependents: String,
    pub dependents_count: f64,
    pub education: String,
    pub self_employed: String,
    pub applicant_income: f64,
    pub coapplicant_income: f64,
    /// Thousands, matching the training data.
    pub loan_amount: f64,
    /// Months. Kept as a real so encoding sees the submitted value untruncated.
    pub loan_term: f64,
    pub credit_history: f64,
    pub property_area: String,
}

/// A persisted loan request.
///
/// Every attribute is optional because rows written by older releases of the
/// store may carry nulls; analytics skip missing values per field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: RequestId,
    pub gender: Option<String>,
    pub married: Option<String>,
    pub dependents: Option<String>,
    pub education: Option<String>,
    pub self_employed: Option<String>,
    pub applicant_income: Option<f64>,
    pub coapplicant_income: Option<f64>,
    pub loan_amount: Option<f64>,
    pub loan_term: Option<i64>,
    pub credit_history: Option<f64>,
    pub property_area: Option<String>,
    pub prediction: PredictionLabel,
    pub request_date: Option<DateTime<Utc>>,
}

/// Insert payload handed to the request store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoanRequest {
    pub application: LoanApplication,
    pub prediction: PredictionLabel,
    pub requested_at: DateTime<Utc>,
}

impl NewLoanRequest {
    pub fn into_record(self, id: RequestId) -> ApplicationRecord {
        let NewLoanRequest {
            application,
            prediction,
            requested_at,
        } = self;

        ApplicationRecord {
            id,
            gender: Some(application.gender),
            married: Some(application.married),
            dependents: Some(application.dependents),
            education: Some(application.education),
            self_employed: Some(application.self_employed),
            applicant_income: Some(application.applicant_income),
            coapplicant_income: Some(application.coapplicant_income),
            loan_amount: Some(application.loan_amount),
            loan_term: Some(application.loan_term.trunc() as i64),
            credit_history: Some(application.credit_history),
            property_area: Some(application.property_area),
            prediction,
            request_date: Some(requested_at),
        }
    }
}
