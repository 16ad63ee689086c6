mod config;
mod explain;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::ConfigMerger;
use recordfix_core::adapters::{FsDataset, FsIssueSource, FsWritePort, load_summary};
use recordfix_core::pipeline::{
    ToolError, run_apply, run_plan, run_rollback, run_snapshot, write_apply_artifacts,
    write_plan_artifacts, write_rollback_artifacts, write_snapshot_artifacts,
};
use recordfix_core::settings::PlanSettings;
use recordfix_domain::{lookup_rule, rule_keys};
use recordfix_snapshot::{FsSnapshotSink, SnapshotSink};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "recordfix",
    version,
    about = "Plan, apply and measure data quality remediations for judicial records."
)]
struct Cli {
    /// Path to recordfix.toml (default: ./recordfix.toml if present).
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a risk-assessed remediation plan from validator issues.
    Plan(PlanArgs),
    /// Execute auto-fixable issues against a dataset (default: dry-run).
    Apply(ApplyArgs),
    /// Measure data quality and persist an immutable snapshot.
    Snapshot(SnapshotArgs),
    /// Restore the values captured by a previous live apply (default: dry-run).
    Rollback(RollbackArgs),
    /// Explain what a remediation rule does and how risky it is.
    Explain(ExplainArgs),
    /// List all remediation rules.
    ListRules(ListRulesArgs),
}

#[derive(Debug, Parser)]
struct PlanArgs {
    /// Validator issues (JSON array or `{"issues": [...]}`).
    #[arg(long)]
    issues: Utf8PathBuf,

    /// Output directory for artifacts (default: artifacts/recordfix).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct ApplyArgs {
    /// Validator issues (JSON array or `{"issues": [...]}`).
    #[arg(long)]
    issues: Utf8PathBuf,

    /// Dataset file (`{"table": [records]}`) to remediate.
    #[arg(long)]
    dataset: Utf8PathBuf,

    /// Output directory for artifacts (default: artifacts/recordfix).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Write changes to the dataset. If omitted, runs a dry-run and only emits artifacts.
    #[arg(long, default_value_t = false)]
    apply: bool,

    /// Snapshot before and after the run and report the health delta.
    #[arg(long, default_value_t = false)]
    measure: bool,

    /// Priority for queued resync requests.
    #[arg(long)]
    resync_priority: Option<i64>,
}

#[derive(Debug, Parser)]
struct SnapshotArgs {
    /// Dataset file (`{"table": [records]}`) to measure.
    #[arg(long)]
    dataset: Utf8PathBuf,

    /// Output directory for artifacts (default: artifacts/recordfix).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Judges with fewer cached cases than this are counted as low-volume.
    #[arg(long)]
    case_volume_threshold: Option<u64>,

    /// Print the snapshot without persisting a snapshot file.
    #[arg(long, default_value_t = false)]
    no_persist: bool,
}

#[derive(Debug, Parser)]
struct RollbackArgs {
    /// Dataset file the summary was applied to.
    #[arg(long)]
    dataset: Utf8PathBuf,

    /// Apply summary to replay (default: <out_dir>/apply.json).
    #[arg(long)]
    summary: Option<Utf8PathBuf>,

    /// Output directory for artifacts (default: artifacts/recordfix).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Write restored values to the dataset. If omitted, only checks the records exist.
    #[arg(long, default_value_t = false)]
    apply: bool,
}

#[derive(Debug, Parser)]
struct ExplainArgs {
    /// Rule key to explain (e.g., "case-count", "temporal_overlap").
    rule_key: String,
}

#[derive(Debug, Parser)]
struct ListRulesArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match real_main(cli).await {
        Ok(()) => ExitCode::from(0),
        Err(ToolError::RemediationFailed) => {
            error!("one or more remediations failed; see the written artifacts");
            ExitCode::from(2)
        }
        Err(ToolError::Internal(e)) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

async fn real_main(cli: Cli) -> Result<(), ToolError> {
    let file_config = config::load_or_default(cli.config.as_deref(), Utf8Path::new("."))
        .context("load recordfix.toml config")?;
    let merger = ConfigMerger::new(file_config);

    match cli.cmd {
        Command::Plan(args) => cmd_plan(&merger, args),
        Command::Apply(args) => cmd_apply(&merger, args).await,
        Command::Snapshot(args) => cmd_snapshot(&merger, args).await,
        Command::Rollback(args) => cmd_rollback(&merger, args).await,
        Command::Explain(args) => cmd_explain(args).map_err(ToolError::from),
        Command::ListRules(args) => cmd_list_rules(args).map_err(ToolError::from),
    }
}

fn cmd_plan(merger: &ConfigMerger, args: PlanArgs) -> Result<(), ToolError> {
    let settings = PlanSettings {
        out_dir: merger.out_dir(args.out_dir.as_deref()),
    };
    let source = FsIssueSource::new(args.issues);

    let outcome = run_plan(&settings, &source)?;
    write_plan_artifacts(&outcome, &settings.out_dir, &FsWritePort)
        .with_context(|| format!("write plan artifacts to {}", settings.out_dir))?;

    for warning in &outcome.plan.risk_assessment.warnings {
        info!("{}", warning);
    }
    info!("wrote plan to {}", settings.out_dir);
    Ok(())
}

async fn cmd_apply(merger: &ConfigMerger, args: ApplyArgs) -> Result<(), ToolError> {
    let settings = merger.merge_apply_args(
        args.out_dir.as_deref(),
        args.apply,
        args.measure,
        args.resync_priority,
    );
    debug!(
        dry_run = settings.dry_run,
        measure = settings.measure,
        resync_priority = settings.resync_priority,
        "merged apply settings"
    );

    let dataset = FsDataset::new(args.dataset);
    let store = dataset.load()?;
    let source = FsIssueSource::new(args.issues);

    let outcome = run_apply(&settings, &source, &store).await?;
    if !settings.dry_run {
        dataset
            .save(&store, &FsWritePort)
            .with_context(|| format!("save dataset {}", dataset.path))?;
    }
    write_apply_artifacts(&outcome, &settings.out_dir, &FsWritePort)
        .with_context(|| format!("write apply artifacts to {}", settings.out_dir))?;

    let mode = if settings.dry_run { "dry-run" } else { "live" };
    println!(
        "{}: {} attempted, {} succeeded, {} failed, {} skipped",
        mode,
        outcome.summary.attempted,
        outcome.summary.successful,
        outcome.summary.failed,
        outcome.summary.skipped
    );
    if let Some(delta) = &outcome.delta {
        println!("health delta: {:+.2}", delta.health_delta);
    }
    info!("wrote apply artifacts to {}", settings.out_dir);

    if outcome.remediation_failed {
        return Err(ToolError::RemediationFailed);
    }
    Ok(())
}

async fn cmd_snapshot(merger: &ConfigMerger, args: SnapshotArgs) -> Result<(), ToolError> {
    let out_dir = merger.out_dir(args.out_dir.as_deref());
    let settings = merger.merge_snapshot_args(args.out_dir.as_deref(), args.case_volume_threshold);

    let store = FsDataset::new(args.dataset).load()?;
    let sink = FsSnapshotSink::new(settings.out_dir.clone());
    let sink: Option<&dyn SnapshotSink> = if args.no_persist { None } else { Some(&sink) };

    let outcome = run_snapshot(&settings, &store, sink).await?;
    write_snapshot_artifacts(&outcome, &out_dir, &FsWritePort)
        .with_context(|| format!("write snapshot artifacts to {}", out_dir))?;

    println!("health score: {:.2}", outcome.snapshot.health_score);
    if let Some(receipt) = &outcome.receipt {
        println!("snapshot: {} (sha256 {})", receipt.location, receipt.sha256);
    }
    Ok(())
}

async fn cmd_rollback(merger: &ConfigMerger, args: RollbackArgs) -> Result<(), ToolError> {
    let settings = merger.merge_rollback_args(args.out_dir.as_deref(), args.apply);
    let summary_path = args
        .summary
        .unwrap_or_else(|| settings.out_dir.join("apply.json"));
    let summary = load_summary(&summary_path)?;

    let dataset = FsDataset::new(args.dataset);
    let store = dataset.load()?;

    let outcome = run_rollback(&settings, &summary, &store).await?;
    if !settings.dry_run {
        dataset
            .save(&store, &FsWritePort)
            .with_context(|| format!("save dataset {}", dataset.path))?;
    }
    write_rollback_artifacts(&outcome, &settings.out_dir, &FsWritePort)
        .with_context(|| format!("write rollback artifacts to {}", settings.out_dir))?;

    println!(
        "rollback: {} attempted, {} restored, {} failed",
        outcome.report.attempted, outcome.report.restored, outcome.report.failed
    );
    if outcome.remediation_failed {
        return Err(ToolError::RemediationFailed);
    }
    Ok(())
}

fn cmd_explain(args: ExplainArgs) -> anyhow::Result<()> {
    let Some(rule) = lookup_rule(&args.rule_key) else {
        anyhow::bail!(
            "Unknown rule key: '{}'\n\nAvailable rules: {}",
            args.rule_key,
            rule_keys().join(", ")
        );
    };
    print!("{}", explain::render_explanation(rule));
    Ok(())
}

fn cmd_list_rules(args: ListRulesArgs) -> anyhow::Result<()> {
    match args.format {
        OutputFormat::Text => print!("{}", explain::render_rule_table()),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&explain::rules_json())?);
        }
    }
    Ok(())
}
