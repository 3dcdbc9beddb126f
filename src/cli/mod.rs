//! Evidentia CLI Module
//!
//! Command-line interface for scoring evidence, synthesizing the report and
//! inspecting input tables.

use clap::{Args, Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{LabelEncoding, PipelineConfig};
use crate::pipeline::{self, ScoringOutcome};
use crate::report::{ChartSpecRenderer, ReportDocument};
use crate::utils::DataLoader;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "evidentia")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Anomaly scoring and report synthesis for forensic evidence")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Detector overrides shared by `score` and `run`
#[derive(Args, Debug, Clone, Default)]
pub struct ScoringArgs {
    /// Expected proportion of anomalous records, in (0, 0.5]
    #[arg(long)]
    pub contamination: Option<f64>,

    /// Number of isolation trees
    #[arg(long)]
    pub n_estimators: Option<usize>,

    /// Rows sampled per tree
    #[arg(long)]
    pub max_samples: Option<usize>,

    /// RNG seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Label encoding (text, sign)
    #[arg(long, value_parser = ["text", "sign"])]
    pub label_encoding: Option<String>,

    /// Derive hour/day-of-week/weekend features from a timestamp column
    #[arg(long)]
    pub temporal_features: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score evidence records and write the labelled dataset
    Score {
        /// Evidence records (CSV)
        #[arg(short, long)]
        evidence: Option<PathBuf>,

        /// Scored dataset output (CSV)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        scoring: ScoringArgs,
    },

    /// Build the investigation report from a scored dataset
    Report {
        /// Scored dataset (CSV)
        #[arg(short, long)]
        scored: Option<PathBuf>,

        /// Extracted entity table (CSV)
        #[arg(short = 'n', long)]
        entities: Option<PathBuf>,

        /// Report output (Markdown)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory receiving chart artifacts
        #[arg(long)]
        artifact_dir: Option<PathBuf>,
    },

    /// Score and report in one pass
    Run {
        /// Evidence records (CSV)
        #[arg(short, long)]
        evidence: Option<PathBuf>,

        /// Extracted entity table (CSV)
        #[arg(short = 'n', long)]
        entities: Option<PathBuf>,

        /// Directory receiving every output
        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[command(flatten)]
        scoring: ScoringArgs,
    },

    /// Show the shape and columns of a table
    Info {
        /// Input data file (CSV)
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Base configuration: the JSON file if given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(p) => Ok(PipelineConfig::from_json_file(p)?),
        None => Ok(PipelineConfig::default()),
    }
}

/// Apply command-line detector overrides
pub fn apply_scoring_args(mut config: PipelineConfig, args: &ScoringArgs) -> PipelineConfig {
    let scoring = &mut config.scoring;
    if let Some(c) = args.contamination {
        scoring.contamination = c;
    }
    if let Some(n) = args.n_estimators {
        scoring.n_estimators = n;
    }
    if let Some(n) = args.max_samples {
        scoring.max_samples = n;
    }
    if let Some(seed) = args.seed {
        scoring.seed = seed;
    }
    match args.label_encoding.as_deref() {
        Some("sign") => scoring.label_encoding = LabelEncoding::Sign,
        Some("text") => scoring.label_encoding = LabelEncoding::Text,
        _ => {}
    }
    if args.temporal_features {
        scoring.temporal_features = true;
    }
    config
}

pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "csv" | "" => Ok(DataLoader::new().load_csv(path)?),
        _ => anyhow::bail!("Unsupported file format: {}", ext),
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_score(config: &PipelineConfig) -> anyhow::Result<()> {
    section("Score");

    step_run(&format!(
        "Scoring {} with {} trees",
        config.evidence_path.display(),
        config.scoring.n_estimators.to_string().cyan()
    ));
    let start = Instant::now();
    let outcome = pipeline::run_scoring(config)?;
    step_done(&format!("{} features in {:?}", outcome.feature_names.len(), start.elapsed()));

    print_outcome(config, &outcome);
    Ok(())
}

pub fn cmd_report(config: &PipelineConfig) -> anyhow::Result<()> {
    section("Report");

    step_run("Synthesizing report");
    let start = Instant::now();
    let renderer = ChartSpecRenderer::new(&config.artifact_dir);
    let report = pipeline::run_report(config, &renderer)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_report(config, &report);
    Ok(())
}

pub fn cmd_run(config: &PipelineConfig) -> anyhow::Result<()> {
    section("Run");

    step_run("Scoring and reporting");
    let start = Instant::now();
    let renderer = ChartSpecRenderer::new(&config.artifact_dir);
    let (outcome, report) = pipeline::run(config, &renderer)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_outcome(config, &outcome);
    print_report(config, &report);
    Ok(())
}

fn print_outcome(config: &PipelineConfig, outcome: &ScoringOutcome) {
    let anomalies = outcome.anomaly_count();
    let total = outcome.labels.len();
    let rate = if total == 0 { 0.0 } else { anomalies as f64 / total as f64 * 100.0 };

    println!();
    println!("  {:<16} {}", muted("Scored"), config.scored_path.display().to_string().white());
    println!("  {:<16} {}", muted("Records"), total.to_string().white());
    println!("  {:<16} {}", muted("Anomalies"), anomalies.to_string().white().bold());
    println!("  {:<16} {}", muted("Normal"), (total - anomalies).to_string().white());
    println!("  {:<16} {}", muted("Rate"), format!("{:.1}%", rate).white());
    println!();
}

fn print_report(config: &PipelineConfig, report: &ReportDocument) {
    println!();
    println!("  {:<16} {}", muted("Report"), config.report_path.display().to_string().white());
    println!("  {:<16} {}", muted("Sections"), report.sections().len().to_string().white());
    for artifact in report.artifacts() {
        let shown = artifact
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| artifact.link.clone());
        println!("  {:<16} {}", muted("Chart"), shown.white());
    }
    println!();
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = load_data(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!("  {:<24} {:<12} {:>6} {:>8}", muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"));
    println!("  {}", dim(&"─".repeat(54)));

    for col in df.get_columns() {
        println!(
            "  {:<24} {:<12} {:>6} {:>8}",
            col.name().as_str(),
            col.dtype().to_string().truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}

/// Resolve the configuration for a parsed command line and run it
pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let base = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Score { evidence, output, scoring } => {
            let mut config = apply_scoring_args(base, &scoring);
            if let Some(p) = evidence {
                config.evidence_path = p;
            }
            if let Some(p) = output {
                config.scored_path = p;
            }
            cmd_score(&config)
        }
        Commands::Report { scored, entities, output, artifact_dir } => {
            let mut config = base;
            if let Some(p) = scored {
                config.scored_path = p;
            }
            if let Some(p) = entities {
                config.entities_path = p;
            }
            if let Some(p) = output {
                config.report_path = p;
            }
            if let Some(p) = artifact_dir {
                config.artifact_dir = p;
            }
            cmd_report(&config)
        }
        Commands::Run { evidence, entities, out_dir, scoring } => {
            let mut config = apply_scoring_args(base, &scoring);
            if let Some(p) = evidence {
                config.evidence_path = p;
            }
            if let Some(p) = entities {
                config.entities_path = p;
            }
            if let Some(dir) = out_dir {
                config = config.with_output_dir(dir);
            }
            cmd_run(&config)
        }
        Commands::Info { data } => cmd_info(&data),
    }
}
