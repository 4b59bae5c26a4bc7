//! Survival Intake: Lung cancer survival prediction.
//!
//! Main entry point. Runs the terminal application by default, or a single
//! headless prediction with `predict --input record.json`.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use survival_intake::adapters::sanitize::SanitizingMakeWriter;
use survival_intake::application::submit_json;
use survival_intake::build_service;
use survival_intake::config::{DatabaseLocation, IntakeConfig, LogMode};
use survival_intake::tui::App;

#[derive(Parser)]
#[command(name = "survival-intake", version, about = "Lung cancer survival prediction intake")]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Cmd>,

    /// Model directory (overrides SURVIVAL_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Database URL, e.g. sqlite://results.db (overrides the configured URL)
    #[arg(long, global = true)]
    database: Option<String>,

    /// Results table (overrides SURVIVAL_TABLE)
    #[arg(long, global = true)]
    table: Option<String>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Interactive intake form (default)
    Tui,
    /// Predict one record read from a JSON file and store the result
    Predict {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = IntakeConfig::from_env()?;
    if let Some(dir) = cli.model_dir {
        config.model_dir = dir;
    }
    if let Some(url) = cli.database.as_deref() {
        config.database = DatabaseLocation::parse(url)?;
    }
    if let Some(table) = cli.table {
        config.table = table;
    }

    let headless = matches!(cli.cmd, Some(Cmd::Predict { .. }));
    let _guard = init_logging(&config, headless)?;

    tracing::info!("Starting survival-intake...");
    let service = build_service(&config).context("startup failed")?;

    match cli.cmd {
        Some(Cmd::Predict { input }) => predict(&service, &input),
        Some(Cmd::Tui) | None => {
            let mut app = App::new(service);
            app.run()?;
            tracing::info!("survival-intake shutdown complete.");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn predict(service: &survival_intake::DefaultIntakeService, input: &Path) -> Result<ExitCode> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let report = submit_json(service, &raw, chrono::Local::now().date_naive());
    for line in &report.stdout {
        println!("{line}");
    }
    for line in &report.stderr {
        eprintln!("{line}");
    }
    Ok(ExitCode::from(report.status.exit_code()))
}

/// Initialize logging.
///
/// Writing logs to the terminal would corrupt the TUI (alternate screen), so
/// `auto` logs to a file when attached to a TTY and to stdout otherwise.
/// Headless runs log to stderr so stdout carries only the result.
fn init_logging(config: &IntakeConfig, headless: bool) -> Result<WorkerGuard> {
    let use_file = match config.log_mode {
        LogMode::File => true,
        LogMode::Stdout => false,
        LogMode::Auto => !headless && std::io::stdout().is_terminal(),
    };

    let (writer, guard) = if use_file {
        if let Some(parent) = config.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("failed to open log file {}", config.log_file.display()))?;
        tracing_appender::non_blocking(file)
    } else if headless {
        tracing_appender::non_blocking(std::io::stderr())
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}
