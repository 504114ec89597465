use crate::report::{run_eda, run_export, run_fix_dates, run_predict, ExportArgs, PredictArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use loan_advisor::config::AppConfig;
use loan_advisor::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Loan Advisor",
    about = "Score loan applications and explore the request history",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single application and print the decision
    Predict(PredictArgs),
    /// Print the exploratory analysis of stored requests
    Eda(SourceArgs),
    /// Export stored requests as CSV
    Export(ExportArgs),
    /// Backfill missing request timestamps
    FixDates(SourceArgs),
}

/// Overrides for where the model artifact and request store live.
#[derive(Args, Debug, Default)]
pub(crate) struct SourceArgs {
    /// Override the configured model artifact path
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Override the configured SQLite database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

impl SourceArgs {
    /// Loads configuration from the environment and applies the overrides.
    pub(crate) fn load_config(&mut self) -> Result<AppConfig, AppError> {
        let mut config = AppConfig::load()?;
        if let Some(model) = self.model.take() {
            config.model.artifact_path = model;
        }
        if let Some(database) = self.database.take() {
            config.storage.database_path = database;
        }
        Ok(config)
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
        Command::Eda(args) => run_eda(args),
        Command::Export(args) => run_export(args),
        Command::FixDates(args) => run_fix_dates(args),
    }
}
