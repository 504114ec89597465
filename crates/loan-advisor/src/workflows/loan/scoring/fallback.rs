/// Hand-coded approval policy used only while no trained classifier is loaded.
/// Rules are checked in order and the first match wins.
pub fn predict_fallback(applicant_income: f64, loan_amount: f64, credit_history: f64) -> u8 {
    if applicant_income > 5000.0 && loan_amount < 200.0 && credit_history == 1.0 {
        1
    } else if applicant_income > 3000.0 && loan_amount < 100.0 {
        1
    } else {
        0
    }
}
