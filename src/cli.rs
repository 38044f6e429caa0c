use crate::error::Result;
use crate::model::Report;
use crate::month::today_utc;
use crate::report::{output_json, output_ndjson, output_text, RunInfo};
use crate::scan::{progress_bar, run_scans, GitLog, ScanPlan, Targets};
use anyhow::Context;
use clap::{ArgAction, Parser};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_EXTENSIONS: &[&str] = &["swift", "yml", "java", "kt", "md", "php"];

#[derive(Parser, Debug)]
#[command(name = "monthstat")]
#[command(about = "Per-author, per-month line change statistics for git repositories")]
#[command(version)]
pub struct Cli {
    #[arg(
        short = 'm',
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Number of months to check backward (1 = current month only)"
    )]
    pub months: u32,

    #[arg(short = 'a', long, help = "Analyze every repository in the immediate subdirectories of the path")]
    pub all: bool,

    #[arg(short = 'p', long, default_value = ".", help = "Path for analysis")]
    pub path: PathBuf,

    #[arg(
        short = 'e',
        long = "ext",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()),
        help = "File extensions to include"
    )]
    pub extensions: Vec<String>,

    #[arg(long, help = "Output as JSON", conflicts_with = "ndjson")]
    pub json: bool,

    #[arg(long, help = "Output as NDJSON")]
    pub ndjson: bool,

    #[arg(long, help = "Hide the progress bar")]
    pub no_progress: bool,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn plan(&self) -> Result<ScanPlan> {
        ScanPlan::new(
            Targets::new(self.path.clone(), self.all),
            self.months,
            self.extensions.as_slice(),
        )
    }

    /// `RUST_LOG` wins over `-v` when set.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    pub fn execute(self) -> anyhow::Result<()> {
        let plan = self.plan().context("Invalid arguments")?;
        let machine_output = self.json || self.ndjson;
        let progress = progress_bar(!self.no_progress && !machine_output);

        let outcome = run_scans(&plan, today_utc(), &GitLog::new(), &progress)
            .context("Failed to collect change statistics")?;
        info!(
            scans = outcome.completed,
            failed = outcome.failures.len(),
            authors = outcome.aggregate.author_count(),
            "scans finished"
        );

        let report = Report::from_aggregate(&outcome.aggregate);
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        if self.json {
            let info = RunInfo {
                base_path: plan.targets().base().to_string_lossy().to_string(),
                all_repositories: self.all,
                months_back: plan.months(),
                extensions: plan.extensions(),
                failed_scans: outcome.failed_scans(),
            };
            output_json(&report, info, &mut out)?;
        } else if self.ndjson {
            output_ndjson(&report, &mut out)?;
        } else {
            output_text(&report, &mut out)?;
        }

        out.flush()?;
        Ok(())
    }
}
