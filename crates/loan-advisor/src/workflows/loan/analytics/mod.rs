//! Descriptive statistics over stored loan requests.
//!
//! Everything here is a pure function of the records handed in. Failures never
//! escape as errors: an empty dataset yields an explanatory payload and a
//! failing section is replaced by its error message so the rest of the report
//! still renders.

mod charts;
mod fields;
mod stats;

pub use charts::{prepare_chart_data, ChartData, ChartOutcome, ChartSeries, IncomeLoanSeries};
pub use fields::{categorical_breakdown, CategoricalField, CategoryStat, NumericField};
pub use stats::{basic_stats, BasicStats};

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::domain::{ApplicationRecord, PredictionLabel, RequestId};
use stats::percentage;

pub const NO_DATA_MESSAGE: &str = "No loan requests are available for analysis.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("{field} holds a non-finite value on request {id}")]
    NonFiniteValue {
        field: &'static str,
        id: RequestId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalDistribution {
    pub labels: [&'static str; 2],
    pub values: [usize; 2],
    pub percentages: [f64; 2],
}

impl ApprovalDistribution {
    pub fn from_records(records: &[ApplicationRecord]) -> Self {
        let total = records.len();
        let approved = records
            .iter()
            .filter(|record| record.prediction == PredictionLabel::Approved)
            .count();
        let rejected = total - approved;

        Self {
            labels: [
                PredictionLabel::Approved.label(),
                PredictionLabel::Rejected.label(),
            ],
            values: [approved, rejected],
            percentages: [percentage(approved, total), percentage(rejected, total)],
        }
    }
}

/// Stats for one numeric field over all records and per outcome.
/// A side with no values is reported as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSplit {
    pub all: Option<BasicStats>,
    pub approved: Option<BasicStats>,
    pub rejected: Option<BasicStats>,
}

impl NumericSplit {
    pub fn compute(
        records: &[ApplicationRecord],
        field: NumericField,
    ) -> Result<Self, AnalysisError> {
        let mut all = Vec::with_capacity(records.len());
        let mut approved = Vec::new();
        let mut rejected = Vec::new();

        for record in records {
            let Some(value) = field.value(record) else {
                continue;
            };
            if !value.is_finite() {
                return Err(AnalysisError::NonFiniteValue {
                    field: field.name(),
                    id: record.id,
                });
            }
            all.push(value);
            match record.prediction {
                PredictionLabel::Approved => approved.push(value),
                PredictionLabel::Rejected => rejected.push(value),
            }
        }

        Ok(Self {
            all: basic_stats(&all),
            approved: basic_stats(&approved),
            rejected: basic_stats(&rejected),
        })
    }
}

/// Either a computed section or the message of the error that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionResult<T> {
    Computed(T),
    Failed { error: String },
}

impl<T> SectionResult<T> {
    fn capture(section: &'static str, result: Result<T, AnalysisError>) -> Self {
        match result {
            Ok(value) => SectionResult::Computed(value),
            Err(err) => {
                warn!(section, error = %err, "analysis section failed");
                SectionResult::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            SectionResult::Computed(value) => Some(value),
            SectionResult::Failed { .. } => None,
        }
    }
}

pub type CategoricalBreakdown = BTreeMap<String, CategoryStat>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploratoryReport {
    pub total_requests: usize,
    pub approval_distribution: ApprovalDistribution,
    pub income_analysis: SectionResult<NumericSplit>,
    pub loan_amount_analysis: SectionResult<NumericSplit>,
    pub credit_history_analysis: SectionResult<NumericSplit>,
    pub gender_analysis: CategoricalBreakdown,
    pub married_analysis: CategoricalBreakdown,
    pub education_analysis: CategoricalBreakdown,
    pub property_area_analysis: CategoricalBreakdown,
    pub self_employed_analysis: CategoricalBreakdown,
}

impl ExploratoryReport {
    pub fn numeric(&self, field: NumericField) -> &SectionResult<NumericSplit> {
        match field {
            NumericField::ApplicantIncome => &self.income_analysis,
            NumericField::LoanAmount => &self.loan_amount_analysis,
            NumericField::CreditHistory => &self.credit_history_analysis,
        }
    }

    pub fn categorical(&self, field: CategoricalField) -> &CategoricalBreakdown {
        match field {
            CategoricalField::Gender => &self.gender_analysis,
            CategoricalField::Married => &self.married_analysis,
            CategoricalField::Education => &self.education_analysis,
            CategoricalField::PropertyArea => &self.property_area_analysis,
            CategoricalField::SelfEmployed => &self.self_employed_analysis,
        }
    }
}

/// Serializes either as the report itself or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Report(Box<ExploratoryReport>),
    Unavailable { error: String },
}

impl AnalysisOutcome {
    pub fn unavailable(error: impl Into<String>) -> Self {
        AnalysisOutcome::Unavailable {
            error: error.into(),
        }
    }

    pub fn report(&self) -> Option<&ExploratoryReport> {
        match self {
            AnalysisOutcome::Report(report) => Some(report),
            AnalysisOutcome::Unavailable { .. } => None,
        }
    }
}

pub fn analyze(records: &[ApplicationRecord]) -> AnalysisOutcome {
    if records.is_empty() {
        return AnalysisOutcome::unavailable(NO_DATA_MESSAGE);
    }

    let numeric = |section: &'static str, field: NumericField| {
        SectionResult::capture(section, NumericSplit::compute(records, field))
    };

    AnalysisOutcome::Report(Box::new(ExploratoryReport {
        total_requests: records.len(),
        approval_distribution: ApprovalDistribution::from_records(records),
        income_analysis: numeric("income_analysis", NumericField::ApplicantIncome),
        loan_amount_analysis: numeric("loan_amount_analysis", NumericField::LoanAmount),
        credit_history_analysis: numeric("credit_history_analysis", NumericField::CreditHistory),
        gender_analysis: categorical_breakdown(records, CategoricalField::Gender),
        married_analysis: categorical_breakdown(records, CategoricalField::Married),
        education_analysis: categorical_breakdown(records, CategoricalField::Education),
        property_area_analysis: categorical_breakdown(records, CategoricalField::PropertyArea),
        self_employed_analysis: categorical_breakdown(records, CategoricalField::SelfEmployed),
    }))
}
