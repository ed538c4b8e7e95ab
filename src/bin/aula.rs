//! Aula CLI - Command-line interface for the Aula behavioral engine
//!
//! Commands:
//! - replay: Run a captured frame log through the full pipeline
//! - validate: Validate frame records against vision.frame.v1
//! - doctor: Diagnose configuration and environment
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use aula::collaborators::{MemoryAttendanceSink, MemoryBehaviorLog, MemoryRoster};
use aula::monitor::BehaviorMonitor;
use aula::schema::{FrameLog, FrameLogAdapter, SCHEMA_VERSION};
use aula::types::{AttendanceRecord, RosterEntry, SessionReport};
use aula::{EngineConfig, EngineError, AULA_VERSION, PRODUCER_NAME};

/// Aula - behavioral analytics engine for classroom monitoring
#[derive(Parser)]
#[command(name = "aula")]
#[command(version = AULA_VERSION)]
#[command(about = "Turn per-frame vision signals into behavioral session reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a captured frame log through the full pipeline
    Replay {
        /// Input frame log path (use - for stdin)
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

        /// Roster file (JSON array of entries); derived from the log when omitted
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Engine configuration file (JSON, partial overrides allowed)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate frame records against vision.frame.v1
    Validate {
        /// Input frame log path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a roster file
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one frame record per line)
    Ndjson,
    /// JSON array of frame records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Newline-delimited JSON (one behavior-log entry per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (vision.frame.v1)
    Input,
    /// Output schema (replay summary)
    Output,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AulaCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            roster,
            config,
        } => cmd_replay(
            &input,
            &output,
            input_format,
            output_format,
            roster.as_deref(),
            config.as_deref(),
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor {
            roster,
            config,
            json,
        } => cmd_doctor(roster.as_deref(), config.as_deref(), json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    roster_path: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<(), AulaCliError> {
    let input_data = read_input(input)?;

    let records = match input_format {
        InputFormat::Ndjson => FrameLogAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => FrameLogAdapter::parse_array(&input_data)?,
    };

    if records.is_empty() {
        return Err(AulaCliError::NoFrames);
    }

    let roster_entries = match roster_path {
        Some(path) => {
            let roster_json = fs::read_to_string(path)?;
            serde_json::from_str::<Vec<RosterEntry>>(&roster_json)?
        }
        None => FrameLogAdapter::roster_from_records(&records),
    };

    let config = match config_path {
        Some(path) => {
            let config_json = fs::read_to_string(path)?;
            serde_json::from_str::<EngineConfig>(&config_json)?
        }
        None => EngineConfig::new(),
    };

    let attendance = Arc::new(MemoryAttendanceSink::new());
    let behavior_log = Arc::new(MemoryBehaviorLog::new());
    let monitor = BehaviorMonitor::new(
        config,
        Arc::new(MemoryRoster::new(roster_entries)),
        attendance.clone(),
        behavior_log.clone(),
    );

    let mut log = FrameLog::new(records)?;
    let started_at = log.first_timestamp().unwrap_or_else(chrono::Utc::now);

    monitor.start_session(started_at)?;
    let stop = AtomicBool::new(false);
    let report = monitor.run(&mut log, &stop)?;

    let summary = ReplaySummary {
        producer: PRODUCER_NAME.to_string(),
        version: AULA_VERSION.to_string(),
        attendance: attendance.records(),
        report,
    };

    let output_data = format_output(&summary, &output_format)?;
    write_output(output, &output_data)?;

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), AulaCliError> {
    let input_data = read_input(input)?;

    let records = match input_format {
        InputFormat::Ndjson => FrameLogAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => FrameLogAdapter::parse_array(&input_data)?,
    };

    let results = FrameLogAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                frame_id: r.frame_id.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Frame {} (index {}): {}",
                    err.frame_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(AulaCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_doctor(
    roster: Option<&Path>,
    config: Option<&Path>,
    json: bool,
) -> Result<(), AulaCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "aula_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Aula version {}", AULA_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    if let Some(roster_path) = roster {
        checks.push(check_roster_file(roster_path));
    }

    if let Some(config_path) = config {
        checks.push(check_config_file(config_path));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: AULA_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Aula Doctor Report");
        println!("==================");
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

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AulaCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_roster_file(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: "roster".to_string(),
            status: CheckStatus::Warning,
            message: "Roster file does not exist".to_string(),
        };
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<Vec<RosterEntry>>(&content) {
            Ok(entries) if entries.is_empty() => DoctorCheck {
                name: "roster".to_string(),
                status: CheckStatus::Warning,
                message: "Roster file is empty; sessions cannot start".to_string(),
            },
            Ok(entries) => DoctorCheck {
                name: "roster".to_string(),
                status: CheckStatus::Ok,
                message: format!("Roster file valid ({} identities)", entries.len()),
            },
            Err(e) => DoctorCheck {
                name: "roster".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid roster JSON: {}", e),
            },
        },
        Err(e) => DoctorCheck {
            name: "roster".to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read roster file: {}", e),
        },
    }
}

fn check_config_file(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist; defaults will be used".to_string(),
        };
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<EngineConfig>(&content) {
            Ok(config) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid (hand raise {}s/{}s, looking away {}s/{}s)",
                    config.hand_raise.sustain_threshold_sec,
                    config.hand_raise.cooldown_period_sec,
                    config.looking_away.sustain_threshold_sec,
                    config.looking_away.cooldown_period_sec
                ),
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid config JSON: {}", e),
            },
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read config file: {}", e),
        },
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), AulaCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: {}", SCHEMA_VERSION);
            println!();
            println!("One record per captured frame:");
            println!();
            println!("- schema_version: \"{}\"", SCHEMA_VERSION);
            println!("- frame_id: optional unique identifier");
            println!("- timestamp: capture time (RFC3339, UTC)");
            println!("- faces: identification results for the frame");
            println!("  - identity: registered key, or null for unmatched detections");
            println!("  - display_name, bounding_region, match_confidence (0-1)");
            println!("- hand_raised: raw boolean gesture signal");
            println!("- pose: {{ yaw, pitch, roll }} in degrees, absent when unsolved");
        }
        SchemaType::Output => {
            println!("Output Schema: replay summary");
            println!();
            println!("- producer, version");
            println!("- attendance: one mark per identity, first sighting");
            println!("  - identity, display_name, date, time_in, status");
            println!("- report: the session report");
            println!("  - session_id, session_date, started_at, ended_at, duration_seconds");
            println!("  - entries: one behavior-log row per entity:");
            println!("    - identity, display_name, session_date");
            println!("    - average_attention (0-100), hand_raises, looking_away_count");
            println!("    - duration_seconds (first to last sighting)");
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, AulaCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), AulaCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
        Ok(())
    } else {
        fs::write(output, data)?;
        Ok(())
    }
}

fn format_output(summary: &ReplaySummary, format: &OutputFormat) -> Result<String, AulaCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(summary)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(summary)? + "\n"),
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for entry in &summary.report.entries {
                lines.push(serde_json::to_string(entry)?);
            }
            Ok(lines.join("\n") + "\n")
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ReplaySummary {
    producer: String,
    version: String,
    attendance: Vec<AttendanceRecord>,
    report: SessionReport,
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    frame_id: Option<String>,
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

// Error types

#[derive(Debug)]
enum AulaCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoFrames,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for AulaCliError {
    fn from(e: io::Error) -> Self {
        AulaCliError::Io(e)
    }
}

impl From<EngineError> for AulaCliError {
    fn from(e: EngineError) -> Self {
        AulaCliError::Engine(e)
    }
}

impl From<serde_json::Error> for AulaCliError {
    fn from(e: serde_json::Error) -> Self {
        AulaCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AulaCliError> for CliError {
    fn from(e: AulaCliError) -> Self {
        match e {
            AulaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AulaCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches vision.frame.v1 and the roster is non-empty".to_string()),
            },
            AulaCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AulaCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frame records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            AulaCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            AulaCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}
