//! dm-outreach CLI
//!
//! Usage: dm-outreach -f messages.csv [--me "Your Name"] [--format json]
//!
//! Writes the report to stdout unless `-o` is given. Logs go to stderr.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use dm_outreach_lib::config::{load_config, validate_config, AnalyzerConfig};
use dm_outreach_lib::error::{AnalysisError, ValidationReport};
use dm_outreach_lib::ingest::{normalize, read_table};
use dm_outreach_lib::pipeline::{analyze_batch, resolve_identity, validate_only};
use dm_outreach_lib::report::{render_json, render_summary};
use dm_outreach_lib::sales::SalesClassifier;
use dm_outreach_lib::sentiment::LexiconSentiment;

#[derive(Parser, Debug)]
#[command(name = "dm-outreach", version, about = "Outbound direct-message performance report")]
struct Cli {
    /// Message export (.csv, .tsv, .xlsx)
    #[arg(short, long)]
    file: PathBuf,

    /// Your name as it appears in the FROM column
    #[arg(long)]
    me: Option<String>,

    /// Analyzer config JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Custom sales rules JSON
    #[arg(long)]
    rules: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of templates to rank
    #[arg(long)]
    top: Option<usize>,

    /// Merge near-identical templates at this similarity (0, 1]
    #[arg(long)]
    similarity: Option<f64>,

    /// Only check the export's structure and rows
    #[arg(long, default_value_t = false)]
    validate_only: bool,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = if cli.validate_only { run_validate(&cli) } else { run(&cli) };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if let Some(analysis) = err.downcast_ref::<AnalysisError>() {
                eprintln!("Hint: {}", analysis.recovery_suggestion());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = resolve_config(cli)?;
    let classifier = match &config.rules_path {
        Some(path) => SalesClassifier::load_rules(path)?,
        None => SalesClassifier::default_rules()?,
    };

    let table = read_table(&cli.file)?;
    let batch = normalize(&table)?;
    let identity = resolve_identity(config.self_identity.as_deref(), &batch.records)?;
    let report = analyze_batch(batch, &identity, &config, &classifier, &LexiconSentiment);

    let rendered = match cli.format {
        OutputFormat::Json => render_json(&report)?,
        OutputFormat::Markdown => render_summary(&report),
    };
    emit(cli.output.as_deref(), &rendered)?;
    Ok(ExitCode::SUCCESS)
}

fn run_validate(cli: &Cli) -> anyhow::Result<ExitCode> {
    let report = match read_table(&cli.file) {
        Ok(table) => validate_only(&table),
        Err(err) => {
            log::warn!("validate: could not read {}: {}", cli.file.display(), err);
            ValidationReport::from_error(&err)
        }
    };
    emit(cli.output.as_deref(), &serde_json::to_string_pretty(&report)?)?;
    Ok(if report.valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Config file (if any), then CLI overrides, then validation.
fn resolve_config(cli: &Cli) -> anyhow::Result<AnalyzerConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AnalyzerConfig::default(),
    };
    if let Some(me) = &cli.me {
        config.self_identity = Some(me.clone());
    }
    if let Some(top) = cli.top {
        config.top_templates = top;
    }
    if let Some(similarity) = cli.similarity {
        config.template_similarity = Some(similarity);
    }
    if let Some(rules) = &cli.rules {
        config.rules_path = Some(rules.clone());
    }
    validate_config(&config)?;
    Ok(config)
}

fn emit(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
