use crate::cli::SourceArgs;
use crate::infra::{build_scorer, build_service};
use clap::Args;
use loan_advisor::error::AppError;
use loan_advisor::workflows::loan::analytics::{
    AnalysisOutcome, BasicStats, CategoricalField, NumericField, NumericSplit, SectionResult,
};
use loan_advisor::workflows::loan::{write_requests_csv, RawApplication};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    #[arg(long)]
    pub(crate) gender: String,
    #[arg(long)]
    pub(crate) married: String,
    /// 0, 1, 2 or 3+
    #[arg(long)]
    pub(crate) dependents: String,
    #[arg(long)]
    pub(crate) education: String,
    #[arg(long)]
    pub(crate) self_employed: String,
    #[arg(long)]
    pub(crate) applicant_income: String,
    #[arg(long)]
    pub(crate) coapplicant_income: String,
    /// Requested amount in thousands
    #[arg(long)]
    pub(crate) loan_amount: String,
    /// Term in months
    #[arg(long)]
    pub(crate) loan_term: String,
    #[arg(long)]
    pub(crate) credit_history: String,
    #[arg(long)]
    pub(crate) property_area: String,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

impl PredictArgs {
    fn application(&self) -> RawApplication {
        RawApplication::new()
            .with("gender", self.gender.as_str())
            .with("married", self.married.as_str())
            .with("dependents", self.dependents.as_str())
            .with("education", self.education.as_str())
            .with("self_employed", self.self_employed.as_str())
            .with("applicant_income", self.applicant_income.as_str())
            .with("coapplicant_income", self.coapplicant_income.as_str())
            .with("loan_amount", self.loan_amount.as_str())
            .with("loan_term", self.loan_term.as_str())
            .with("credit_history", self.credit_history.as_str())
            .with("property_area", self.property_area.as_str())
    }
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Destination CSV file
    #[arg(long)]
    pub(crate) output: PathBuf,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

pub(crate) fn run_predict(mut args: PredictArgs) -> Result<(), AppError> {
    let config = args.source.load_config()?;
    let scorer = build_scorer(&config);
    let outcome = scorer.predict(&args.application())?;

    println!("Prediction: {}", outcome.label);
    println!("Confidence: {}", outcome.source.confidence());
    Ok(())
}

pub(crate) fn run_eda(mut args: SourceArgs) -> Result<(), AppError> {
    let config = args.load_config()?;
    let service = build_service(&config)?;
    println!("{}", render_analysis(&service.exploratory_report()));
    Ok(())
}

pub(crate) fn run_export(mut args: ExportArgs) -> Result<(), AppError> {
    let config = args.source.load_config()?;
    let service = build_service(&config)?;
    let records = service.requests()?;

    let file = File::create(&args.output)?;
    write_requests_csv(&records, BufWriter::new(file))?;
    println!(
        "Exported {} requests to {}",
        records.len(),
        args.output.display()
    );
    Ok(())
}

pub(crate) fn run_fix_dates(mut args: SourceArgs) -> Result<(), AppError> {
    let config = args.load_config()?;
    let service = build_service(&config)?;
    let repair = service.repair_timestamps()?;
    println!("{}", repair.message);
    Ok(())
}

pub(crate) fn render_analysis(outcome: &AnalysisOutcome) -> String {
    let report = match outcome {
        AnalysisOutcome::Report(report) => report,
        AnalysisOutcome::Unavailable { error } => return format!("Analysis unavailable: {error}"),
    };

    let mut lines = vec![format!(
        "Loan request analysis ({} requests)",
        report.total_requests
    )];

    lines.push(String::new());
    lines.push("Approval distribution".to_string());
    let distribution = &report.approval_distribution;
    let rows = distribution
        .labels
        .iter()
        .zip(distribution.values)
        .zip(distribution.percentages);
    for ((label, count), share) in rows {
        lines.push(format!("  {label:<10}{count:>5}  ({share:.1}%)"));
    }

    for field in NumericField::ALL {
        lines.push(String::new());
        lines.push(numeric_title(field).to_string());
        match report.numeric(field) {
            SectionResult::Computed(split) => lines.extend(numeric_rows(split)),
            SectionResult::Failed { error } => lines.push(format!("  error: {error}")),
        }
    }

    for field in CategoricalField::ALL {
        lines.push(String::new());
        lines.push(categorical_title(field).to_string());
        for (value, stat) in report.categorical(field) {
            lines.push(format!(
                "  {:<14}count {:>4}  approval {:>5.1}%",
                value, stat.count, stat.approval_rate
            ));
        }
    }

    lines.join("\n")
}

fn numeric_title(field: NumericField) -> &'static str {
    match field {
        NumericField::ApplicantIncome => "Applicant income",
        NumericField::LoanAmount => "Loan amount",
        NumericField::CreditHistory => "Credit history",
    }
}

fn categorical_title(field: CategoricalField) -> &'static str {
    match field {
        CategoricalField::Gender => "Gender",
        CategoricalField::Married => "Marital status",
        CategoricalField::Education => "Education",
        CategoricalField::PropertyArea => "Property area",
        CategoricalField::SelfEmployed => "Self employed",
    }
}

fn numeric_rows(split: &NumericSplit) -> Vec<String> {
    [
        ("all", split.all),
        ("approved", split.approved),
        ("rejected", split.rejected),
    ]
    .into_iter()
    .map(|(label, stats)| match stats {
        Some(BasicStats {
            count,
            mean,
            std,
            min,
            max,
        }) => format!(
            "  {label:<10}count {count:>4}  mean {mean:>10.2}  std {std:>10.2}  min {min:>10.2}  max {max:>10.2}"
        ),
        None => format!("  {label:<10}no values"),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use loan_advisor::workflows::loan::{analyze, sample_requests, RequestId};

    #[test]
    fn renders_every_section_for_seed_data() {
        let requested_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let records: Vec<_> = sample_requests(requested_at)
            .into_iter()
            .enumerate()
            .map(|(index, request)| request.into_record(RequestId(index as i64 + 1)))
            .collect();

        let text = render_analysis(&analyze(&records));

        assert!(text.starts_with("Loan request analysis (5 requests)"));
        assert!(text.contains("(60.0%)"));
        assert!(text.contains("std    2059.13"));
        assert!(text.contains("Property area"));
        assert!(text.contains("  Urban         count    2  approval 100.0%"));
    }

    #[test]
    fn renders_error_payload_for_empty_store() {
        let text = render_analysis(&analyze(&[]));
        assert!(text.starts_with("Analysis unavailable:"));
    }
}
