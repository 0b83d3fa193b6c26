//! PlayWell CLI - Command-line interface for the PlayWell engine
//!
//! Commands:
//! - score: Reduce raw game observations into session metrics (batch mode)
//! - recommend: Select coaching recommendations for a classification
//! - validate: Validate observation payload structure
//! - doctor: Diagnose engine health and configuration
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use playwell_engine::history::SessionHistoryStore;
use playwell_engine::types::{
    ClassificationResult, GameObservations, ReduceOutcome, StressLevel,
    OBSERVATIONS_SCHEMA_VERSION, OUTCOME_SCHEMA_VERSION,
};
use playwell_engine::{games, EngineError, SessionProcessor};
use playwell_engine::{GameKind, RecommendationEngine, SelectionPolicy};
use playwell_engine::{ENGINE_VERSION, PRODUCER_NAME};

/// PlayWell - Session scoring and recommendation engine for timed cognitive games
#[derive(Parser)]
#[command(name = "playwell")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score PlayWell game sessions and select recommendations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce raw game observations into session metrics (batch mode)
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Rolling history window in sessions per game
        #[arg(long, default_value = "5")]
        history_window: usize,

        /// Load session history from file
        #[arg(long)]
        load_history: Option<PathBuf>,

        /// Save session history to file after processing
        #[arg(long)]
        save_history: Option<PathBuf>,
    },

    /// Select coaching recommendations for a stress and cognitive classification
    Recommend {
        /// Classification JSON file path (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Stress level, when not reading a classification file
        #[arg(long, value_enum)]
        stress_level: Option<StressArg>,

        /// Cognitive score 0-100, when not reading a classification file
        #[arg(long)]
        score: Option<f64>,

        /// Selection policy
        #[arg(long, default_value = "all-matching")]
        policy: PolicyArg,

        /// Sample size for the sample-n policy
        #[arg(long, default_value = "2")]
        sample_size: usize,

        /// Output recommendations as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Validate observation payload structure
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

    /// Diagnose engine health and configuration
    Doctor {
        /// Check session history file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one observation payload per line)
    Ndjson,
    /// JSON array of observation payloads
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one outcome per line)
    Ndjson,
    /// JSON array of outcomes
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (playwell.observations.v1)
    Input,
    /// Output schema (playwell.outcome.v1)
    Output,
}

#[derive(Clone, Copy, ValueEnum)]
enum StressArg {
    Low,
    Medium,
    High,
    Unknown,
}

impl StressArg {
    fn into_level(self) -> StressLevel {
        match self {
            StressArg::Low => StressLevel::Low,
            StressArg::Medium => StressLevel::Medium,
            StressArg::High => StressLevel::High,
            StressArg::Unknown => StressLevel::Unknown,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Every matching recommendation, in rule-table order (deterministic)
    AllMatching,
    /// A random sample from the matching candidates
    SampleN,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PlaywellCliError> {
    match cli.command {
        Commands::Score {
            input,
            output,
            input_format,
            output_format,
            history_window,
            load_history,
            save_history,
        } => cmd_score(
            &input,
            &output,
            input_format,
            output_format,
            history_window,
            load_history.as_deref(),
            save_history.as_deref(),
        ),

        Commands::Recommend {
            input,
            stress_level,
            score,
            policy,
            sample_size,
            json,
        } => cmd_recommend(input.as_deref(), stress_level, score, policy, sample_size, json),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { history, json } => cmd_doctor(history.as_deref(), json),

        Commands::Schema { schema_type, json_schema } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_score(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    history_window: usize,
    load_history: Option<&Path>,
    save_history: Option<&Path>,
) -> Result<(), PlaywellCliError> {
    let input_data = read_input(input)?;

    let payloads = split_payloads(&input_data, &input_format)?;
    if payloads.is_empty() {
        return Err(PlaywellCliError::NoSessions);
    }

    let mut processor = SessionProcessor::with_history_window(history_window);

    // Load existing history if provided
    if let Some(history_path) = load_history {
        let history_json = fs::read_to_string(history_path)?;
        processor.load_history(&history_json)?;
    }

    let mut outcomes: Vec<ReduceOutcome> = Vec::new();
    for payload in &payloads {
        let outcome_json = processor.process(payload)?;
        let outcome: ReduceOutcome = serde_json::from_str(&outcome_json)?;
        outcomes.push(outcome);
    }

    // Save history if requested
    if let Some(history_path) = save_history {
        let history_json = processor.save_history()?;
        fs::write(history_path, history_json)?;
    }

    let output_data = format_output(&outcomes, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_recommend(
    input: Option<&Path>,
    stress_level: Option<StressArg>,
    score: Option<f64>,
    policy: PolicyArg,
    sample_size: usize,
    json: bool,
) -> Result<(), PlaywellCliError> {
    let classification = match input {
        Some(path) => {
            let data = read_input(path)?;
            serde_json::from_str::<ClassificationResult>(&data)?
        }
        None => {
            let stress = stress_level.ok_or_else(|| {
                PlaywellCliError::BadArgs("either --input or --stress-level is required".to_string())
            })?;
            ClassificationResult {
                stress_level: stress.into_level(),
                cognitive_score: score,
                recommendations: Vec::new(),
            }
        }
    };

    let engine = match policy {
        PolicyArg::AllMatching => RecommendationEngine::new(),
        PolicyArg::SampleN => {
            RecommendationEngine::with_policy(SelectionPolicy::SampleN { n: sample_size })
        }
    };
    let recommendations =
        engine.recommend(classification.stress_level, classification.cognitive_score);

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else if recommendations.is_empty() {
        println!("No recommendations for this classification.");
    } else {
        for text in &recommendations {
            println!("- {}", text);
        }
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), PlaywellCliError> {
    let input_data = read_input(input)?;
    let payloads = split_payloads(&input_data, &input_format)?;

    let mut report = ValidationReport {
        total_sessions: payloads.len(),
        valid_sessions: 0,
        invalid_sessions: 0,
        not_ready_sessions: 0,
        errors: Vec::new(),
    };

    for (index, payload) in payloads.iter().enumerate() {
        // Malformed JSON aborts the run; a payload that is JSON but not a
        // known game shape is reported per session
        let value: serde_json::Value = serde_json::from_str(payload)?;
        let game = value
            .get("gameType")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        if let Some(name) = &game {
            if GameKind::from_wire(name).is_none() {
                report.invalid_sessions += 1;
                report.errors.push(ValidationErrorDetail {
                    index,
                    game: game.clone(),
                    error: EngineError::UnsupportedGame(name.clone()).to_string(),
                });
                continue;
            }
        }

        let observations: GameObservations = match serde_json::from_value(value) {
            Ok(observations) => observations,
            Err(e) => {
                report.invalid_sessions += 1;
                report.errors.push(ValidationErrorDetail {
                    index,
                    game,
                    error: e.to_string(),
                });
                continue;
            }
        };

        match games::validate(&observations) {
            Ok(()) => {
                report.valid_sessions += 1;
                if !games::reduce(&observations).is_ready() {
                    report.not_ready_sessions += 1;
                }
            }
            Err(e) => {
                report.invalid_sessions += 1;
                report.errors.push(ValidationErrorDetail {
                    index,
                    game,
                    error: e.to_string(),
                });
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total sessions:     {}", report.total_sessions);
        println!("Valid sessions:     {}", report.valid_sessions);
        println!("Invalid sessions:   {}", report.invalid_sessions);
        println!("Not ready to score: {}", report.not_ready_sessions);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Session {} ({}): {}",
                    err.index,
                    err.game.as_deref().unwrap_or("unknown game"),
                    err.error
                );
            }
        }
    }

    if report.invalid_sessions > 0 {
        Err(PlaywellCliError::ValidationFailed(report.invalid_sessions))
    } else {
        Ok(())
    }
}

fn cmd_doctor(history: Option<&Path>, json: bool) -> Result<(), PlaywellCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    // Check engine version
    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Engine version {}", ENGINE_VERSION),
    });

    // Check schema versions
    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "Input schema: {}, output schema: {}",
            OBSERVATIONS_SCHEMA_VERSION, OUTCOME_SCHEMA_VERSION
        ),
    });

    // Check history file if provided
    if let Some(history_path) = history {
        if history_path.exists() {
            match fs::read_to_string(history_path) {
                Ok(content) => match SessionHistoryStore::from_json(&content) {
                    Ok(store) => {
                        let sessions: usize = GameKind::all()
                            .iter()
                            .map(|game| store.sessions_recorded(*game))
                            .sum();
                        checks.push(DoctorCheck {
                            name: "history".to_string(),
                            status: CheckStatus::Ok,
                            message: format!(
                                "History file valid ({} recorded sessions)",
                                sessions
                            ),
                        });
                    }
                    Err(e) => {
                        checks.push(DoctorCheck {
                            name: "history".to_string(),
                            status: CheckStatus::Error,
                            message: format!("Invalid history JSON: {}", e),
                        });
                    }
                },
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "history".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Cannot read history file: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "history".to_string(),
                status: CheckStatus::Warning,
                message: "History file does not exist".to_string(),
            });
        }
    }

    // Check stdin is available (for batch mode)
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
            message: "stdin is a pipe (batch mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("PlayWell Doctor Report");
        println!("======================");
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
        Err(PlaywellCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), PlaywellCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", OBSERVATIONS_SCHEMA_VERSION);
                println!();
                println!("Observation payloads are a tagged union keyed by gameType:");
                println!();
                println!("1. \"Reaction Test\" - raw_events, false_starts, input");
                println!("   - raw_events: [{{ trial, latency_ms }}] raw stimulus-to-press latencies");
                println!();
                println!("2. \"Stroop Test\" - rounds, false_starts");
                println!("   - rounds: [{{ latency_ms, correct }}] one entry per color-word round");
                println!();
                println!("3. \"Visual Search\" - raw_events, false_starts");
                println!("   - raw_events: one target-found latency per search grid");
                println!();
                println!("4. \"Memory Test\" - sequence, user_seq, input_latencies_ms");
                println!("   - target color sequence and the user's ordered recall");
                println!();
                println!("5. \"Pattern Memory\" - grid, user_grid, input_latencies_ms");
                println!("   - row-major boolean grids, 16 cells (4x4)");
                println!();
                println!("6. \"Dual Task\" - raw_events, memory_sequence, user_memory_input, false_starts");
                println!("   - number-press latencies plus a 1-9 digit recall task");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", OUTCOME_SCHEMA_VERSION);
                println!();
                println!("Reduce outcomes are tagged by status:");
                println!();
                println!("- status \"ready\": {{ metrics }}");
                println!("  - metrics.reaction_avg: trimmed, clamped, divisor-adjusted average (ms)");
                println!("  - metrics.memory_score: accuracy percentage, 0-100");
                println!("  - metrics.duration_ms: sum of raw latencies actually observed");
                println!("  - metrics.false_starts: premature responses (timed games only)");
                println!();
                println!("- status \"not_ready\": {{ reason }}");
                println!("  - reason.kind: \"no_timed_trials\" or \"incomplete_response\"");
                println!("  - incomplete_response carries expected and actual lengths");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, PlaywellCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn split_payloads(input_data: &str, format: &InputFormat) -> Result<Vec<String>, PlaywellCliError> {
    match format {
        InputFormat::Ndjson => Ok(input_data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        InputFormat::Json => {
            let values: Vec<serde_json::Value> = serde_json::from_str(input_data)?;
            let mut payloads = Vec::with_capacity(values.len());
            for value in &values {
                payloads.push(serde_json::to_string(value)?);
            }
            Ok(payloads)
        }
    }
}

fn format_output(outcomes: &[ReduceOutcome], format: &OutputFormat) -> Result<String, PlaywellCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for outcome in outcomes {
                lines.push(serde_json::to_string(outcome)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => {
            Ok(serde_json::to_string(outcomes)?)
        }
        OutputFormat::JsonPretty => {
            Ok(serde_json::to_string_pretty(outcomes)?)
        }
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://playwell.app/schemas/playwell.observations.v1.json",
        "title": OBSERVATIONS_SCHEMA_VERSION,
        "description": "PlayWell raw game observations schema",
        "type": "object",
        "required": ["gameType"],
        "properties": {
            "gameType": {
                "type": "string",
                "enum": [
                    "Reaction Test",
                    "Stroop Test",
                    "Visual Search",
                    "Memory Test",
                    "Pattern Memory",
                    "Dual Task"
                ]
            },
            "raw_events": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["trial", "latency_ms"],
                    "properties": {
                        "trial": { "type": "integer", "minimum": 0 },
                        "latency_ms": { "type": "integer", "minimum": 1 }
                    }
                }
            },
            "rounds": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["latency_ms", "correct"],
                    "properties": {
                        "latency_ms": { "type": "integer", "minimum": 1 },
                        "correct": { "type": "boolean" }
                    }
                }
            },
            "false_starts": { "type": "integer", "minimum": 0 },
            "input": { "type": "string" },
            "sequence": { "type": "array", "items": { "type": "string" } },
            "user_seq": { "type": "array", "items": { "type": "string" } },
            "grid": { "type": "array", "items": { "type": "boolean" } },
            "user_grid": { "type": "array", "items": { "type": "boolean" } },
            "memory_sequence": {
                "type": "array",
                "items": { "type": "integer", "minimum": 1, "maximum": 9 }
            },
            "user_memory_input": {
                "type": "array",
                "items": { "type": "integer", "minimum": 1, "maximum": 9 }
            },
            "input_latencies_ms": { "type": "array", "items": { "type": "integer" } }
        }
    }).to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://playwell.app/schemas/playwell.outcome.v1.json",
        "title": OUTCOME_SCHEMA_VERSION,
        "description": "PlayWell session reduce outcome schema",
        "type": "object",
        "required": ["status"],
        "properties": {
            "status": { "type": "string", "enum": ["ready", "not_ready"] },
            "metrics": {
                "type": "object",
                "required": ["reaction_avg", "memory_score", "duration_ms"],
                "properties": {
                    "reaction_avg": { "type": ["integer", "null"] },
                    "memory_score": { "type": ["integer", "null"], "minimum": 0, "maximum": 100 },
                    "duration_ms": { "type": "integer", "minimum": 0 },
                    "false_starts": { "type": "integer", "minimum": 0 }
                }
            },
            "reason": {
                "type": "object",
                "required": ["kind"],
                "properties": {
                    "kind": {
                        "type": "string",
                        "enum": ["no_timed_trials", "incomplete_response"]
                    },
                    "expected": { "type": "integer" },
                    "actual": { "type": "integer" }
                }
            }
        }
    }).to_string()
}

// Error types

#[derive(Debug)]
enum PlaywellCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoSessions,
    BadArgs(String),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for PlaywellCliError {
    fn from(e: io::Error) -> Self {
        PlaywellCliError::Io(e)
    }
}

impl From<EngineError> for PlaywellCliError {
    fn from(e: EngineError) -> Self {
        PlaywellCliError::Engine(e)
    }
}

impl From<serde_json::Error> for PlaywellCliError {
    fn from(e: serde_json::Error) -> Self {
        PlaywellCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PlaywellCliError> for CliError {
    fn from(e: PlaywellCliError) -> Self {
        match e {
            PlaywellCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PlaywellCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches the playwell.observations.v1 schema".to_string()),
            },
            PlaywellCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PlaywellCliError::NoSessions => CliError {
                code: "NO_SESSIONS".to_string(),
                message: "No observation payloads found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PlaywellCliError::BadArgs(msg) => CliError {
                code: "BAD_ARGS".to_string(),
                message: msg,
                hint: Some("Run 'playwell recommend --help' for usage".to_string()),
            },
            PlaywellCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} sessions failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            PlaywellCliError::DoctorFailed => CliError {
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
    total_sessions: usize,
    valid_sessions: usize,
    invalid_sessions: usize,
    not_ready_sessions: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    game: Option<String>,
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
