#![warn(missing_docs)]
//! PinBench CLI Library
//!
//! Command line surface, configuration layering and run orchestration.
//! Use `pinbench::run()` (or `pinbench_cli::run()`) from `main`.
//!
//! A run discovers every model file of the selected framework in one
//! directory, executes each query through the framework's engine under a
//! hard timeout and writes a result table, an overview log and a run log.

mod config;
mod formatting;
mod logging;
mod notify;
mod orchestrator;
mod planner;

pub use config::*;
pub use formatting::format_plan;
pub use notify::{DIRECTORY_PLACEHOLDER, notify_command, notify_completion};
pub use orchestrator::{
    ExclusionSet, FAILURE_THRESHOLD, FailureTracker, RunContext, RunStats, StatusCounters,
};
pub use planner::{ExecutionPlan, InputFile, SETTING_DELIMITER, build_plan, natural_cmp};

use anyhow::Context;
use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use pinbench_core::{AdapterError, EngineAdapter, ProcessRunner, RunOptions};
use pinbench_engines::{Framework, InferenceEngine, build_adapter};
use pinbench_report::{
    CsvTable, OutputFormat, OutputPaths, OverviewLog, RunSummary, format_human_summary,
    generate_json_summary,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// PinBench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "pinbench")]
#[command(
    author,
    version,
    about = "PinBench - benchmark driver for probabilistic inference engines"
)]
pub struct Cli {
    /// Optional subcommand (Run, List, InitConfig); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory containing the model files
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Framework to benchmark: forclift, gcfove, jt, alchemy, blog
    #[arg(short, long)]
    pub framework: Option<Framework>,

    /// Inference engine of the framework (e.g. fojt.LiftedJTEngine, ptpe)
    #[arg(short, long)]
    pub engine: Option<InferenceEngine>,

    /// Answer all queries of a file with one engine invocation
    #[arg(short = 'c', long, alias = "combinequeries")]
    pub combine_queries: bool,

    /// Maximum sampling steps for sampling engines
    #[arg(short = 'm', long, alias = "maxSampleSteps")]
    pub max_sample_steps: Option<u64>,

    /// Extra arguments passed to the engine verbatim (quotes are stripped)
    #[arg(
        short = 'p',
        long,
        alias = "passThroughArgs",
        default_value = "",
        allow_hyphen_values = true
    )]
    pub pass_through_args: String,

    /// Keep running larger models of a setting after repeated failures
    #[arg(short = 's', long)]
    pub no_timeout_skip: bool,

    /// Timeout per engine invocation in seconds (default: config or 300)
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Pass the JVM memory-limit flag to java based engines
    #[arg(short = 'x', long, alias = "java_xmx")]
    pub java_xmx: bool,

    /// Verbose output: raw engine output and extracted records
    #[arg(short, long)]
    pub verbose: bool,

    /// Summary format: human, json (default: config or human)
    #[arg(long)]
    pub format: Option<String>,

    /// Directory for run log, result table and overview log
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Dry run - list model files and queries without executing
    #[arg(long)]
    pub dry_run: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the benchmark (default)
    Run,
    /// List discovered model files and their queries
    List,
    /// Print a default pinbench.toml
    InitConfig,
}

/// Run the PinBench CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` on success, or an error if startup validation fails.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the PinBench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if let Some(Commands::InitConfig) = cli.command {
        print!("{}", PinConfig::default_toml());
        return Ok(());
    }

    // Discover pinbench.toml configuration (CLI flags override)
    let config = PinConfig::discover().unwrap_or_default();

    let framework = cli
        .framework
        .context("--framework is required (forclift, gcfove, jt, alchemy, blog)")?;
    let adapter = build_adapter(
        framework,
        cli.engine,
        config.executables.get(framework).map(Path::to_path_buf),
    )?;
    let options = resolve_options(&cli, &config)?;

    let plan = build_plan(&cli.directory, adapter.extension()).with_context(|| {
        format!("Could not read model directory '{}'", cli.directory.display())
    })?;

    if matches!(cli.command, Some(Commands::List)) || cli.dry_run {
        logging::init_console(cli.verbose);
        print!("{}", format_plan(&plan, adapter.as_ref()));
        return Ok(());
    }

    check_startup(adapter.as_ref(), &options)?;

    let format: OutputFormat = cli
        .format
        .as_deref()
        .unwrap_or(&config.output.format)
        .parse()
        .unwrap_or_default();
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    std::fs::create_dir_all(&output_dir)?;
    let outputs = output_paths(&output_dir, &adapter.tag());

    logging::init_with_file(&outputs.run_log, cli.verbose)?;
    info!(
        "Script call for reproducibility: > {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    debug!("Resolved options: {options:?}");
    info!("{}", adapter.start_message());
    info!(
        "Initialising output files: [{}] and [{}].",
        outputs.table.display(),
        outputs.overview.display()
    );

    let columns: Vec<String> = adapter
        .record_template(&options)
        .columns()
        .map(str::to_string)
        .collect();
    let table = CsvTable::create(&outputs.table, columns)?;
    let overview = OverviewLog::create(&outputs.overview)?;

    if plan.files.is_empty() {
        warn!(
            "No '.{}' files found in '{}'.",
            adapter.extension(),
            plan.directory.display()
        );
    }

    let started_at = Utc::now();
    let start = Instant::now();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let stats = runtime.block_on(async {
        let mut context = RunContext::new(Arc::clone(&adapter), options.clone(), table, overview);
        let stats = context.run(&plan.files).await?;
        context.into_sinks()?;

        if let Err(e) = adapter.cleanup() {
            warn!("Could not remove engine side files: {e}");
        }
        let notifier = ProcessRunner::new(options.timeout);
        notify_completion(&notifier, &config.notify.command, &plan.directory).await;
        anyhow::Ok(stats)
    })?;

    let summary = RunSummary {
        framework: adapter.name().to_string(),
        tag: adapter.tag(),
        directory: plan.directory.clone(),
        started_at,
        duration_secs: start.elapsed().as_secs_f64(),
        files_found: stats.files_found,
        files_processed: stats.files_processed,
        files_skipped: stats.files_skipped,
        successes: stats.totals.success,
        errors: stats.totals.errors,
        timeouts: stats.totals.timeouts,
        records_written: stats.records_written,
        excluded_prefixes: stats.excluded_prefixes,
        outputs,
    };
    match format {
        OutputFormat::Human => print!("{}", format_human_summary(&summary)),
        OutputFormat::Json => println!("{}", generate_json_summary(&summary)?),
    }

    Ok(())
}

/// Layer CLI flags over `pinbench.toml` into the options every component sees.
pub fn resolve_options(cli: &Cli, config: &PinConfig) -> anyhow::Result<RunOptions> {
    let timeout = match cli.timeout {
        Some(secs) => std::time::Duration::from_secs(secs),
        None => PinConfig::parse_duration(&config.runner.timeout)
            .context("Invalid [runner] timeout in pinbench.toml")?,
    };
    Ok(RunOptions {
        timeout,
        combine_queries: cli.combine_queries,
        verbose: cli.verbose,
        pass_through_args: cli.pass_through_args.clone(),
        memory_limit: cli
            .java_xmx
            .then(|| config.runner.memory_limit_flag.clone()),
        max_sample_steps: cli.max_sample_steps,
        timeout_skip: config.runner.timeout_skip && !cli.no_timeout_skip,
    })
}

/// Fatal checks before any file is touched.
pub fn check_startup(adapter: &dyn EngineAdapter, options: &RunOptions) -> Result<(), AdapterError> {
    if !adapter.executable().exists() {
        return Err(AdapterError::MissingExecutable(
            adapter.executable().display().to_string(),
        ));
    }
    if options.combine_queries && !adapter.supports_combined() {
        return Err(AdapterError::NotImplemented(format!(
            "Combined query mode for {}",
            adapter.name()
        )));
    }
    if !options.combine_queries && !adapter.supports_single() {
        return Err(AdapterError::NotImplemented(format!(
            "Single query mode for {} (use --combine-queries)",
            adapter.name()
        )));
    }
    adapter.validate(options)
}

/// Output file names: `<timestamp>_<tag>` plus `.log`, `_times.csv`, `_overview.log`.
pub fn output_paths(directory: &Path, tag: &str) -> OutputPaths {
    let stem = format!("{}_{tag}", Local::now().format("%Y_%m_%d-%H_%M"));
    OutputPaths {
        run_log: directory.join(format!("{stem}.log")),
        table: directory.join(format!("{stem}_times.csv")),
        overview: directory.join(format!("{stem}_overview.log")),
    }
}
