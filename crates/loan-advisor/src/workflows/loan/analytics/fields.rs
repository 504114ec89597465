use std::collections::BTreeMap;

use serde::Serialize;

use super::super::domain::{ApplicationRecord, PredictionLabel};
use super::stats::percentage;

/// Categorical attributes the breakdowns are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    Gender,
    Married,
    Education,
    PropertyArea,
    SelfEmployed,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 5] = [
        CategoricalField::Gender,
        CategoricalField::Married,
        CategoricalField::Education,
        CategoricalField::PropertyArea,
        CategoricalField::SelfEmployed,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            CategoricalField::Gender => "gender",
            CategoricalField::Married => "married",
            CategoricalField::Education => "education",
            CategoricalField::PropertyArea => "property_area",
            CategoricalField::SelfEmployed => "self_employed",
        }
    }

    pub fn value(self, record: &ApplicationRecord) -> Option<&str> {
        let value = match self {
            CategoricalField::Gender => &record.gender,
            CategoricalField::Married => &record.married,
            CategoricalField::Education => &record.education,
            CategoricalField::PropertyArea => &record.property_area,
            CategoricalField::SelfEmployed => &record.self_employed,
        };
        value.as_deref()
    }
}

/// Numeric attributes summarized by outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    ApplicantIncome,
    LoanAmount,
    CreditHistory,
}

impl NumericField {
    pub const ALL: [NumericField; 3] = [
        NumericField::ApplicantIncome,
        NumericField::LoanAmount,
        NumericField::CreditHistory,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            NumericField::ApplicantIncome => "applicant_income",
            NumericField::LoanAmount => "loan_amount",
            NumericField::CreditHistory => "credit_history",
        }
    }

    pub fn value(self, record: &ApplicationRecord) -> Option<f64> {
        match self {
            NumericField::ApplicantIncome => record.applicant_income,
            NumericField::LoanAmount => record.loan_amount,
            NumericField::CreditHistory => record.credit_history,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryStat {
    pub count: usize,
    pub approval_rate: f64,
}

/// Count and approval rate for every distinct value of `field`.
///
/// Records missing the field are ignored. Keys are sorted.
pub fn categorical_breakdown(
    records: &[ApplicationRecord],
    field: CategoricalField,
) -> BTreeMap<String, CategoryStat> {
    let mut tallies: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in records {
        let Some(value) = field.value(record) else {
            continue;
        };
        let (total, approved) = tallies.entry(value).or_default();
        *total += 1;
        if record.prediction == PredictionLabel::Approved {
            *approved += 1;
        }
    }

    tallies
        .into_iter()
        .map(|(value, (count, approved))| {
            (
                value.to_string(),
                CategoryStat {
                    count,
                    approval_rate: percentage(approved, count),
                },
            )
        })
        .collect()
}
