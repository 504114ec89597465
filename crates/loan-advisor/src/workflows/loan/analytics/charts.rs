use std::collections::BTreeMap;

use serde::Serialize;

use super::super::domain::{ApplicationRecord, PredictionLabel};
use super::fields::{categorical_breakdown, CategoricalField};
use super::NO_DATA_MESSAGE;

const APPROVAL_COLORS: &[&str] = &["#28a745", "#dc3545"];
const GENDER_COLORS: &[&str] = &["#007bff", "#e83e8c"];
const MARRIED_COLORS: &[&str] = &["#6f42c1", "#fd7e14"];
const EDUCATION_COLORS: &[&str] = &["#20c997", "#ffc107"];
const AREA_COLORS: &[&str] = &["#17a2b8", "#28a745", "#ffc107"];
const CREDIT_COLORS: &[&str] = &["#28a745", "#dc3545"];

/// One pie or bar chart: parallel label, value and color arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<usize>,
    pub colors: Vec<&'static str>,
}

impl ChartSeries {
    fn new(pairs: Vec<(String, usize)>, palette: &'static [&'static str]) -> Self {
        let colors = palette.iter().copied().cycle().take(pairs.len()).collect();
        let (labels, values) = pairs.into_iter().unzip();
        Self {
            labels,
            values,
            colors,
        }
    }

    fn from_field(
        records: &[ApplicationRecord],
        field: CategoricalField,
        palette: &'static [&'static str],
    ) -> Self {
        let pairs = categorical_breakdown(records, field)
            .into_iter()
            .map(|(value, stat)| (value, stat.count))
            .collect();
        Self::new(pairs, palette)
    }
}

/// Income against requested amount. Only records carrying both values are
/// plotted so the arrays stay index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeLoanSeries {
    pub labels: Vec<String>,
    pub incomes: Vec<f64>,
    pub loan_amounts: Vec<f64>,
    pub predictions: Vec<PredictionLabel>,
}

impl IncomeLoanSeries {
    fn from_records(records: &[ApplicationRecord]) -> Self {
        let mut series = Self {
            labels: Vec::new(),
            incomes: Vec::new(),
            loan_amounts: Vec::new(),
            predictions: Vec::new(),
        };
        for record in records {
            let (Some(income), Some(amount)) = (record.applicant_income, record.loan_amount) else {
                continue;
            };
            series.labels.push(format!("Request {}", record.id));
            series.incomes.push(income);
            series.loan_amounts.push(amount);
            series.predictions.push(record.prediction);
        }
        series
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub approval: ChartSeries,
    pub gender: ChartSeries,
    pub married: ChartSeries,
    pub education: ChartSeries,
    pub area: ChartSeries,
    pub income_loan: IncomeLoanSeries,
    pub credit: ChartSeries,
    /// Keyed `"{dimension}_{value}"`, e.g. `gender_Male` or `area_Urban`.
    pub approval_rates: BTreeMap<String, f64>,
    pub total_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChartOutcome {
    Charts(Box<ChartData>),
    Unavailable { error: String },
}

impl ChartOutcome {
    pub fn unavailable(error: impl Into<String>) -> Self {
        ChartOutcome::Unavailable {
            error: error.into(),
        }
    }

    pub fn charts(&self) -> Option<&ChartData> {
        match self {
            ChartOutcome::Charts(data) => Some(data),
            ChartOutcome::Unavailable { .. } => None,
        }
    }
}

pub fn prepare_chart_data(records: &[ApplicationRecord]) -> ChartOutcome {
    if records.is_empty() {
        return ChartOutcome::unavailable(NO_DATA_MESSAGE);
    }

    let approved = records
        .iter()
        .filter(|record| record.prediction == PredictionLabel::Approved)
        .count();
    let approval = ChartSeries::new(
        vec![
            (PredictionLabel::Approved.label().to_string(), approved),
            (
                PredictionLabel::Rejected.label().to_string(),
                records.len() - approved,
            ),
        ],
        APPROVAL_COLORS,
    );

    let good_history = records
        .iter()
        .filter(|record| record.credit_history == Some(1.0))
        .count();
    let bad_history = records
        .iter()
        .filter(|record| record.credit_history == Some(0.0))
        .count();
    let credit = ChartSeries::new(
        vec![
            ("Good history".to_string(), good_history),
            ("Bad history".to_string(), bad_history),
        ],
        CREDIT_COLORS,
    );

    let mut approval_rates = BTreeMap::new();
    for (dimension, field) in [
        ("gender", CategoricalField::Gender),
        ("education", CategoricalField::Education),
        ("area", CategoricalField::PropertyArea),
    ] {
        for (value, stat) in categorical_breakdown(records, field) {
            approval_rates.insert(format!("{dimension}_{value}"), stat.approval_rate);
        }
    }

    ChartOutcome::Charts(Box::new(ChartData {
        approval,
        gender: ChartSeries::from_field(records, CategoricalField::Gender, GENDER_COLORS),
        married: ChartSeries::from_field(records, CategoricalField::Married, MARRIED_COLORS),
        education: ChartSeries::from_field(records, CategoricalField::Education, EDUCATION_COLORS),
        area: ChartSeries::from_field(records, CategoricalField::PropertyArea, AREA_COLORS),
        income_loan: IncomeLoanSeries::from_records(records),
        credit,
        approval_rates,
        total_requests: records.len(),
    }))
}
