//! Raw applicant attributes to the fixed-order feature vector the classifier
//! was trained on.
//!
//! The layout must match the column order used when the standardization
//! parameters were fitted. A reordering does not fail loudly; it silently
//! produces wrong predictions, so the order lives in one place ([`Feature::ORDERED`])
//! and the artifact loader checks its feature names against it.

use std::collections::{BTreeMap, HashMap};
use std::ops::Index;

use serde::{Deserialize, Serialize};

use super::super::domain::LoanApplication;

pub const FEATURE_COUNT: usize = 12;

/// Model inputs, declared in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Dependents,
    ApplicantIncome,
    CoapplicantIncome,
    LoanAmount,
    LoanTerm,
    CreditHistory,
    GenderIsMale,
    MarriedIsYes,
    EducationIsNotGraduate,
    SelfEmployedIsYes,
    PropertyAreaIsSemiurban,
    PropertyAreaIsUrban,
}

impl Feature {
    pub const ORDERED: [Feature; FEATURE_COUNT] = [
        Feature::Dependents,
        Feature::ApplicantIncome,
        Feature::CoapplicantIncome,
        Feature::LoanAmount,
        Feature::LoanTerm,
        Feature::CreditHistory,
        Feature::GenderIsMale,
        Feature::MarriedIsYes,
        Feature::EducationIsNotGraduate,
        Feature::SelfEmployedIsYes,
        Feature::PropertyAreaIsSemiurban,
        Feature::PropertyAreaIsUrban,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Column name in the training frame, as recorded in the artifact bundle.
    pub const fn training_column(self) -> &'static str {
        match self {
            Feature::Dependents => "Dependents",
            Feature::ApplicantIncome => "ApplicantIncome",
            Feature::CoapplicantIncome => "CoapplicantIncome",
            Feature::LoanAmount => "LoanAmount",
            Feature::LoanTerm => "Loan_Amount_Term",
            Feature::CreditHistory => "Credit_History",
            Feature::GenderIsMale => "Gender_Male",
            Feature::MarriedIsYes => "Married_Yes",
            Feature::EducationIsNotGraduate => "Education_Not Graduate",
            Feature::SelfEmployedIsYes => "Self_Employed_Yes",
            Feature::PropertyAreaIsSemiurban => "Property_Area_Semiurban",
            Feature::PropertyAreaIsUrban => "Property_Area_Urban",
        }
    }
}

/// Ordered model input. Always exactly [`FEATURE_COUNT`] reals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub const fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }
}

impl Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// One submitted attribute. HTML forms deliver text; JSON clients may send
/// native numbers for the numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Flag(bool),
    Null,
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// Free-form attribute mapping as received from the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawApplication(BTreeMap<String, RawValue>);

impl RawApplication {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<RawValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<RawValue> {
        self.0.remove(key)
    }

    fn value(&self, field: &'static str) -> Result<&RawValue, EncodingError> {
        match self.0.get(field) {
            None | Some(RawValue::Null) => Err(EncodingError::MissingField { field }),
            Some(value) => Ok(value),
        }
    }

    fn number(&self, field: &'static str) -> Result<f64, EncodingError> {
        let parsed = match self.value(field)? {
            RawValue::Number(number) => *number,
            RawValue::Flag(flag) => f64::from(u8::from(*flag)),
            RawValue::Text(text) => {
                parse_decimal(text).ok_or_else(|| EncodingError::InvalidNumber {
                    field,
                    value: text.clone(),
                })?
            }
            RawValue::Null => return Err(EncodingError::MissingField { field }),
        };

        if parsed.is_finite() {
            Ok(parsed)
        } else {
            Err(EncodingError::NonFinite { field })
        }
    }

    fn text(&self, field: &'static str) -> Result<String, EncodingError> {
        Ok(match self.value(field)? {
            RawValue::Text(text) => text.clone(),
            RawValue::Number(number) => number_token(*number),
            RawValue::Flag(flag) => flag.to_string(),
            RawValue::Null => return Err(EncodingError::MissingField { field }),
        })
    }

    /// `"3+"` is the open-ended top bucket and maps to exactly 3.0.
    fn dependents(&self) -> Result<(String, f64), EncodingError> {
        const FIELD: &str = "dependents";
        match self.value(FIELD)? {
            RawValue::Text(text) if text == "3+" => Ok((text.clone(), 3.0)),
            RawValue::Number(number) => {
                let count = self.number(FIELD)?;
                Ok((number_token(*number), count))
            }
            _ => {
                let token = self.text(FIELD)?;
                let count = self.number(FIELD)?;
                Ok((token, count))
            }
        }
    }
}

impl From<HashMap<String, String>> for RawApplication {
    fn from(form: HashMap<String, String>) -> Self {
        Self(
            form.into_iter()
                .map(|(key, value)| (key, RawValue::Text(value)))
                .collect(),
        )
    }
}

/// Surrounding whitespace is ignored and a single `_` may separate two digits,
/// as in `"1_000"`.
fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let mut cleaned = String::with_capacity(trimmed.len());
    for (index, ch) in trimmed.char_indices() {
        if ch != '_' {
            cleaned.push(ch);
            continue;
        }
        let before = trimmed[..index].chars().next_back();
        let after = trimmed[index + 1..].chars().next();
        match (before, after) {
            (Some(before), Some(after)) if before.is_ascii_digit() && after.is_ascii_digit() => {}
            _ => return None,
        }
    }
    cleaned.parse().ok()
}

fn number_token(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("field '{field}' must be numeric, found '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field '{field}' must be a finite number")]
    NonFinite { field: &'static str },
}

/// Coerce every required attribute. No partial results: the first missing or
/// malformed field aborts the whole application.
pub fn parse_application(raw: &RawApplication) -> Result<LoanApplication, EncodingError> {
    let (dependents, dependents_count) = raw.dependents()?;

    Ok(LoanApplication {
        gender: raw.text("gender")?,
        married: raw.text("married")?,
        dependents,
        dependents_count,
        education: raw.text("education")?,
        self_employed: raw.text("self_employed")?,
        applicant_income: raw.number("applicant_income")?,
        coapplicant_income: raw.number("coapplicant_income")?,
        loan_amount: raw.number("loan_amount")?,
        loan_term: raw.number("loan_term")?,
        credit_history: raw.number("credit_history")?,
        property_area: raw.text("property_area")?,
    })
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

impl LoanApplication {
    /// Dropped-baseline one-hot encoding: `Female`, `No`, `Graduate` and `Rural`
    /// are the implicit all-zero categories. Comparison is literal.
    pub fn features(&self) -> FeatureVector {
        let mut values = [0.0; FEATURE_COUNT];
        for feature in Feature::ORDERED {
            values[feature.index()] = match feature {
                Feature::Dependents => self.dependents_count,
                Feature::ApplicantIncome => self.applicant_income,
                Feature::CoapplicantIncome => self.coapplicant_income,
                Feature::LoanAmount => self.loan_amount,
                Feature::LoanTerm => self.loan_term,
                Feature::CreditHistory => self.credit_history,
                Feature::GenderIsMale => flag(self.gender == "Male"),
                Feature::MarriedIsYes => flag(self.married == "Yes"),
                Feature::EducationIsNotGraduate => flag(self.education == "Not Graduate"),
                Feature::SelfEmployedIsYes => flag(self.self_employed == "Yes"),
                Feature::PropertyAreaIsSemiurban => flag(self.property_area == "Semiurban"),
                Feature::PropertyAreaIsUrban => flag(self.property_area == "Urban"),
            };
        }
        FeatureVector(values)
    }
}

pub fn encode(raw: &RawApplication) -> Result<FeatureVector, EncodingError> {
    parse_application(raw).map(|application| application.features())
}
