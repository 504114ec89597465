use chrono::{DateTime, Utc};

use super::domain::{LoanApplication, NewLoanRequest, PredictionLabel};

struct Sample {
    gender: &'static str,
    married: &'static str,
    dependents: &'static str,
    education: &'static str,
    self_employed: &'static str,
    applicant_income: f64,
    coapplicant_income: f64,
    loan_amount: f64,
    loan_term: f64,
    credit_history: f64,
    property_area: &'static str,
    prediction: PredictionLabel,
}

const SAMPLES: [Sample; 5] = [
    Sample {
        gender: "Male",
        married: "Yes",
        dependents: "2",
        education: "Graduate",
        self_employed: "No",
        applicant_income: 5000.0,
        coapplicant_income: 2000.0,
        loan_amount: 150.0,
        loan_term: 360.0,
        credit_history: 1.0,
        property_area: "Urban",
        prediction: PredictionLabel::Approved,
    },
    Sample {
        gender: "Female",
        married: "No",
        dependents: "0",
        education: "Graduate",
        self_employed: "No",
        applicant_income: 3000.0,
        coapplicant_income: 0.0,
        loan_amount: 100.0,
        loan_term: 180.0,
        credit_history: 1.0,
        property_area: "Semiurban",
        prediction: PredictionLabel::Approved,
    },
    Sample {
        gender: "Male",
        married: "Yes",
        dependents: "1",
        education: "Not Graduate",
        self_employed: "Yes",
        applicant_income: 2000.0,
        coapplicant_income: 1000.0,
        loan_amount: 200.0,
        loan_term: 360.0,
        credit_history: 0.0,
        property_area: "Rural",
        prediction: PredictionLabel::Rejected,
    },
    Sample {
        gender: "Female",
        married: "No",
        dependents: "0",
        education: "Graduate",
        self_employed: "No",
        applicant_income: 8000.0,
        coapplicant_income: 3000.0,
        loan_amount: 300.0,
        loan_term: 360.0,
        credit_history: 1.0,
        property_area: "Urban",
        prediction: PredictionLabel::Approved,
    },
    Sample {
        gender: "Male",
        married: "Yes",
        dependents: "3+",
        education: "Graduate",
        self_employed: "No",
        applicant_income: 4000.0,
        coapplicant_income: 1500.0,
        loan_amount: 250.0,
        loan_term: 360.0,
        credit_history: 0.0,
        property_area: "Semiurban",
        prediction: PredictionLabel::Rejected,
    },
];

/// Demo requests inserted into an empty store. Labels are fixed rather than
/// scored so the dashboards look the same whichever predictor is active.
pub fn sample_requests(requested_at: DateTime<Utc>) -> Vec<NewLoanRequest> {
    SAMPLES
        .iter()
        .map(|sample| NewLoanRequest {
            application: LoanApplication {
                gender: sample.gender.to_string(),
                married: sample.married.to_string(),
                dependents: sample.dependents.to_string(),
                dependents_count: if sample.dependents == "3+" {
                    3.0
                } else {
                    sample.dependents.parse().unwrap_or_default()
                },
                education: sample.education.to_string(),
                self_employed: sample.self_employed.to_string(),
                applicant_income: sample.applicant_income,
                coapplicant_income: sample.coapplicant_income,
                loan_amount: sample.loan_amount,
                loan_term: sample.loan_term,
                credit_history: sample.credit_history,
                property_area: sample.property_area.to_string(),
            },
            prediction: sample.prediction,
            requested_at,
        })
        .collect()
}
