use crate::{
    client::{BkrClient, ReportSource},
    config::Config,
    document, extract,
    report::StatusReport,
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "reserve-check")]
#[command(about = "Beaker reservation status extractor (bkr job-results + XML + reservation policy)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./reserve-check.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the bkr client is available and configured.
    Doctor {},
    /// Resolve the reservation status of every system in a job.
    Status {
        /// Beaker taskspec, e.g. "J:123456".
        job: Option<String>,
        /// Read job-results XML from a file instead of invoking bkr.
        #[arg(long)]
        input: Option<PathBuf>,
        /// Write a timestamped JSON report here.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let _guard = init_logging(&args, &cfg)?;

    if cfg.debug.dump_effective_config {
        debug!("effective config:\n{}", toml::to_string(&cfg).unwrap_or_default());
    }

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Status { job, input, out } => {
            status(&cfg, job.as_deref(), input.as_deref(), out.as_deref())
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("reserve-check.toml");
    if default.exists() {
        return Some(default);
    }
    let example = PathBuf::from("reserve-check.example.toml");
    example.exists().then_some(example)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = resolve_log_path(cfg) {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(&path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("reserve-check.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let client = BkrClient::new(cfg)?;
    let diag = client.doctor()?;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn status(
    cfg: &Config,
    job: Option<&str>,
    input: Option<&Path>,
    out: Option<&Path>,
) -> Result<()> {
    let bytes = match (input, job) {
        (Some(path), _) => {
            info!("reading job results from {}", path.display());
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        (None, Some(job)) => {
            validate_taskspec(job)?;
            let client = BkrClient::new(cfg)?;
            client.job_results(job)?
        }
        (None, None) => {
            return Err(anyhow!("provide a job taskspec (e.g. 'J:123456') or --input FILE"));
        }
    };

    let doc = document::parse_bytes(&bytes).with_context(|| "parsing job results XML")?;
    let systems = extract::job_to_system_info(&doc)?;
    info!("resolved {} system(s)", systems.len());

    let rendered = if cfg.output.pretty {
        serde_json::to_string_pretty(&systems)?
    } else {
        serde_json::to_string(&systems)?
    };
    println!("{rendered}");

    let report_path = out
        .map(PathBuf::from)
        .or_else(|| {
            cfg.output
                .write_report_json
                .then(|| PathBuf::from(&cfg.output.report_filename))
        });
    if let Some(path) = report_path {
        let report = StatusReport {
            job: job.map(str::to_string),
            generated: now_rfc3339(),
            systems,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing report: {}", path.display()))?;
        info!("wrote report to {}", path.display());
    }

    Ok(())
}

fn validate_taskspec(job: &str) -> Result<()> {
    if job.trim().is_empty() {
        return Err(anyhow!("empty job taskspec"));
    }
    if !job.contains(':') {
        warn!("taskspec has no type prefix (expected e.g. 'J:123456'): {job}");
    }
    Ok(())
}
