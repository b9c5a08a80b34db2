//! CLI entry point for the course rater.
//!
//! Provides subcommands for uploading a score sheet and listing its courses,
//! computing credit-weighted averages into a result sheet, and fetching a
//! result sheet.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use course_rater::analyzers::types::{Credit, RuleEntry};
use course_rater::config::RaterConfig;
use course_rater::output::print_json;
use course_rater::services::rater::{CalculateRequest, Rater};
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "course_rater")]
#[command(about = "A tool to compute credit-weighted student averages", long_about = None)]
struct Cli {
    /// JSON config file; without it, settings come from the environment
    #[arg(long, global = true)]
    config: Option<String>,

    /// S3 bucket to keep sheets in instead of local directories
    #[arg(long, global = true)]
    s3_bucket: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a score sheet and list its course columns
    Discover {
        /// CSV score sheet with a header row
        #[arg(value_name = "FILE")]
        file: String,
    },
    /// Compute weighted averages for an uploaded sheet
    Calculate {
        /// Stored sheet name printed by `discover`
        #[arg(short, long)]
        file: String,

        /// Course credit, repeatable; result columns follow this order
        #[arg(short, long = "rule", value_name = "COURSE=CREDIT", value_parser = parse_rule)]
        rules: Vec<RuleEntry>,

        /// JSON file holding a list of {"course": ..., "credit": ...} entries
        #[arg(long = "rules", value_name = "PATH")]
        rules_file: Option<String>,
    },
    /// Download a result sheet
    Fetch {
        /// Result sheet name printed by `calculate`
        #[arg(value_name = "NAME")]
        name: String,

        /// Path to write to (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/course_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("course_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            RaterConfig::load(path).with_context(|| format!("loading config '{path}'"))?
        }
        None => RaterConfig::from_env(),
    };
    if let Some(bucket) = cli.s3_bucket {
        config = config.with_bucket(bucket);
    }

    let rater = Rater::open(&config).await?;

    match cli.command {
        Commands::Discover { file } => {
            let bytes = std::fs::read(&file).with_context(|| format!("reading '{file}'"))?;
            let discovery = rater.discover(&file, &bytes).await?;
            print_json(&discovery)?;
        }
        Commands::Calculate {
            file,
            rules,
            rules_file,
        } => {
            let mut entries = match rules_file {
                Some(path) => load_rules(&path)?,
                None => Vec::new(),
            };
            entries.extend(rules);

            let calculation = rater
                .calculate(CalculateRequest {
                    file_name: Some(file),
                    rules: Some(entries),
                })
                .await?;
            print_json(&calculation)?;
        }
        Commands::Fetch { name, output } => {
            let bytes = rater.fetch(&name).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)
                        .with_context(|| format!("writing '{path}'"))?;
                    info!(path = %path, bytes = bytes.len(), "Result sheet saved");
                }
                None => std::io::stdout().write_all(&bytes)?,
            }
        }
    }

    Ok(())
}

/// Parses `COURSE=CREDIT`. The credit is checked when the rule is built.
fn parse_rule(s: &str) -> Result<RuleEntry> {
    let Some((course, credit)) = s.rsplit_once('=') else {
        bail!("expected COURSE=CREDIT, got '{s}'");
    };
    let course = course.trim();
    if course.is_empty() {
        bail!("course name is empty in '{s}'");
    }
    Ok(RuleEntry {
        course: course.to_string(),
        credit: Credit::Text(credit.to_string()),
    })
}

fn load_rules(path: &str) -> Result<Vec<RuleEntry>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading rules '{path}'"))?;
    serde_json::from_str(&content).with_context(|| format!("parsing rules '{path}'"))
}
