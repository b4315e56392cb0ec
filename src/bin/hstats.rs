//! hstats CLI - Command-line interface for Health Stats
//!
//! Commands:
//! - summarize: Compute the statistics report for an owner and period
//! - trend: Print one category's trend series
//! - validate: Validate stored record documents
//! - catalog: Print the category catalog
//! - doctor: Diagnose configuration and environment

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use health_stats::catalog::catalog;
use health_stats::schema::{RecordAdapter, StoredDocument};
use health_stats::types::{HealthRecord, TrendSeries};
use health_stats::{
    InMemoryStore, Period, RecordStore, StatisticsReport, StatsConfig, StatsProcessor,
    PRODUCER_NAME, STATS_VERSION,
};

/// hstats - Period-windowed statistics for personal health records
#[derive(Parser)]
#[command(name = "hstats")]
#[command(version = STATS_VERSION)]
#[command(about = "Summarize logged health records by category", long_about = None)]
struct Cli {
    /// Configuration file (JSON); HSTATS_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the statistics report for one owner and period
    Summarize {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Owner whose records are summarized (defaults to the only owner present)
        #[arg(long)]
        owner: Option<String>,

        /// Window: day, week or month (defaults to the configured period)
        #[arg(long)]
        period: Option<Period>,

        /// Query time as RFC 3339 (defaults to now)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Print the trend series of one category
    Trend {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Category id (e.g. "blood-pressure")
        #[arg(short, long)]
        category: String,

        /// Maximum number of points (defaults to the configured cap)
        #[arg(long)]
        points: Option<usize>,

        /// Owner whose records are used (defaults to the only owner present)
        #[arg(long)]
        owner: Option<String>,

        /// Window: day, week or month
        #[arg(long)]
        period: Option<Period>,

        /// Query time as RFC 3339 (defaults to now)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },

    /// Validate stored record documents
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the category catalog
    Catalog {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one document per line)
    Ndjson,
    /// JSON array of documents
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// One JSON line per category summary
    Ndjson,
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("HSTATS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .compact()
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), HstatsCliError> {
    match cli.command {
        Commands::Summarize {
            input,
            output,
            input_format,
            output_format,
            owner,
            period,
            now,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_summarize(
                config,
                &input,
                &output,
                input_format,
                output_format,
                owner,
                period,
                now,
            )
        }

        Commands::Trend {
            input,
            input_format,
            category,
            points,
            owner,
            period,
            now,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(points) = points {
                config.trend_points = points;
            }
            cmd_trend(config, &input, input_format, &category, owner, period, now)
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Catalog { json } => cmd_catalog(json),

        Commands::Doctor { json } => cmd_doctor(cli.config.as_deref(), json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_summarize(
    config: StatsConfig,
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    owner: Option<String>,
    period: Option<Period>,
    now: Option<DateTime<Utc>>,
) -> Result<(), HstatsCliError> {
    let records = load_records(input, &input_format)?;
    let owner = resolve_owner(owner, &records)?;
    let period = period.unwrap_or(config.default_period);
    let now = now.unwrap_or_else(Utc::now);

    let store = InMemoryStore::with_records(records)?;
    let report = StatsProcessor::with_config(config).report(&store, &owner, period, now)?;

    let output_data = format_report(&report, &output_format)?;
    write_output(output, &output_data)
}

fn cmd_trend(
    config: StatsConfig,
    input: &Path,
    input_format: InputFormat,
    category: &str,
    owner: Option<String>,
    period: Option<Period>,
    now: Option<DateTime<Utc>>,
) -> Result<(), HstatsCliError> {
    let records = load_records(input, &input_format)?;
    let owner = resolve_owner(owner, &records)?;
    let period = period.unwrap_or(config.default_period);
    let now = now.unwrap_or_else(Utc::now);

    let store = InMemoryStore::with_records(records)?;
    let window = store.fetch_records(&owner, period.since(now))?;

    let series = TrendSeries {
        category_id: category.to_string(),
        points: StatsProcessor::with_config(config).trend(&window, category),
    };

    println!("{}", serde_json::to_string_pretty(&series)?);
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), HstatsCliError> {
    let documents = load_documents(input, &input_format)?;
    let results = RecordAdapter::validate_documents(&documents);

    let report = ValidationReport {
        total_documents: documents.len(),
        valid_documents: documents.len() - results.len(),
        invalid_documents: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                document_id: r.document_id.clone(),
                error: r.result.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total documents:   {}", report.total_documents);
        println!("Valid documents:   {}", report.valid_documents);
        println!("Invalid documents: {}", report.invalid_documents);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Document {} (index {}): {}",
                    err.document_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_documents > 0 {
        Err(HstatsCliError::ValidationFailed(report.invalid_documents))
    } else {
        Ok(())
    }
}

fn cmd_catalog(json: bool) -> Result<(), HstatsCliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(catalog())?);
        return Ok(());
    }

    println!("Categories");
    println!("==========");
    for category in catalog() {
        println!("{} ({})", category.label, category.id);
        for (idx, field) in category.fields.iter().enumerate() {
            println!("  value{}: {} [{}]", idx + 1, field.name, field.unit);
        }
    }
    Ok(())
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), HstatsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("health-stats version {}", STATS_VERSION),
    });

    if let Some(path) = config_path {
        let check = if !path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist; defaults apply".to_string(),
            }
        } else {
            match fs::read_to_string(path).map_err(HstatsCliError::from).and_then(|content| {
                StatsConfig::from_json(&content).map_err(HstatsCliError::from)
            }) {
                Ok(config) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (trend_points={}, missing_value_policy={}, default_period={})",
                        config.trend_points, config.missing_value_policy, config.default_period
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid config: {}", CliError::from(e).message),
                },
            }
        };
        checks.push(check);
    }

    checks.push(match StatsConfig::from_env() {
        Ok(_) => DoctorCheck {
            name: "environment".to_string(),
            status: CheckStatus::Ok,
            message: "HSTATS_* overrides are valid".to_string(),
        },
        Err(e) => DoctorCheck {
            name: "environment".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    checks.push(if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass documents with --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: STATS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("hstats Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(HstatsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<StatsConfig, HstatsCliError> {
    let base = match path {
        Some(path) => StatsConfig::from_json(&fs::read_to_string(path)?)?,
        None => StatsConfig::default(),
    };
    Ok(base.with_env_overrides(|k| std::env::var(k).ok())?)
}

fn read_input(input: &Path) -> Result<String, HstatsCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_documents(
    input: &Path,
    input_format: &InputFormat,
) -> Result<Vec<StoredDocument>, HstatsCliError> {
    let input_data = read_input(input)?;
    let documents = match input_format {
        InputFormat::Ndjson => RecordAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => RecordAdapter::parse_array(&input_data)?,
    };
    Ok(documents)
}

fn load_records(input: &Path, input_format: &InputFormat) -> Result<Vec<HealthRecord>, HstatsCliError> {
    let documents = load_documents(input, input_format)?;
    Ok(RecordAdapter::to_records(&documents)?)
}

fn resolve_owner(owner: Option<String>, records: &[HealthRecord]) -> Result<String, HstatsCliError> {
    if let Some(owner) = owner {
        return Ok(owner);
    }

    let owners: BTreeSet<&str> = records.iter().map(|r| r.owner_id.as_str()).collect();
    match owners.len() {
        // Empty input yields an empty report for an unnamed owner
        0 => Ok(String::new()),
        1 => Ok(owners.into_iter().next().unwrap_or_default().to_string()),
        _ => Err(HstatsCliError::AmbiguousOwner(
            owners.into_iter().map(str::to_string).collect(),
        )),
    }
}

fn format_report(report: &StatisticsReport, format: &OutputFormat) -> Result<String, HstatsCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for summary in &report.summaries {
                lines.push(serde_json::to_string(summary)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), HstatsCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum HstatsCliError {
    Io(io::Error),
    Stats(health_stats::StatsError),
    Json(serde_json::Error),
    AmbiguousOwner(Vec<String>),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for HstatsCliError {
    fn from(e: io::Error) -> Self {
        HstatsCliError::Io(e)
    }
}

impl From<health_stats::StatsError> for HstatsCliError {
    fn from(e: health_stats::StatsError) -> Self {
        HstatsCliError::Stats(e)
    }
}

impl From<serde_json::Error> for HstatsCliError {
    fn from(e: serde_json::Error) -> Self {
        HstatsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HstatsCliError> for CliError {
    fn from(e: HstatsCliError) -> Self {
        match e {
            HstatsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HstatsCliError::Stats(e) => CliError {
                code: "STATS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'hstats validate' to check the input documents".to_string()),
            },
            HstatsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            HstatsCliError::AmbiguousOwner(owners) => CliError {
                code: "AMBIGUOUS_OWNER".to_string(),
                message: format!("Input holds records for {} owners: {}", owners.len(), owners.join(", ")),
                hint: Some("Pick one with --owner".to_string()),
            },
            HstatsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} documents failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            HstatsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_documents: usize,
    valid_documents: usize,
    invalid_documents: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    document_id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
