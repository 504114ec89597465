use std::io;

use super::domain::ApplicationRecord;

pub const EXPORT_COLUMNS: [&str; 14] = [
    "id",
    "gender",
    "married",
    "dependents",
    "education",
    "self_employed",
    "applicant_income",
    "coapplicant_income",
    "loan_amount",
    "loan_term",
    "credit_history",
    "property_area",
    "prediction",
    "request_date",
];

/// Writes one CSV row per stored request. The header is always written, so
/// an empty store still produces a well-formed file. Missing values are empty
/// cells and timestamps are RFC 3339.
pub fn write_requests_csv<W: io::Write>(
    records: &[ApplicationRecord],
    writer: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(EXPORT_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
