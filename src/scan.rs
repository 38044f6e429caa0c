use crate::aggregate::Aggregate;
use crate::error::{Result, StatError};
use crate::model::{Attribution, FailedScan};
use crate::month::MonthWindow;
use crate::parse::parse_log;
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Produces raw `--pretty=%ae --shortstat` text for one directory and month.
pub trait HistorySource {
    fn scan(&self, dir: &Path, window: &MonthWindow, filters: &[String]) -> Result<String>;
}

/// Runs the `git` executable.
pub struct GitLog {
    program: OsString,
}

impl GitLog {
    pub fn new() -> Self {
        Self::with_program("git")
    }

    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, dir: &Path, window: &MonthWindow, filters: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--no-pager")
            .arg("-C")
            .arg(dir)
            .args(["log", "--pretty=%ae", "--shortstat"])
            .arg(format!("--since={}", window.since_arg()))
            .arg(format!("--until={}", window.until_arg()))
            .arg("--")
            .args(filters);
        cmd
    }
}

impl Default for GitLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HistorySource for GitLog {
    fn scan(&self, dir: &Path, window: &MonthWindow, filters: &[String]) -> Result<String> {
        let mut cmd = self.command(dir, window, filters);
        debug!(command = ?cmd, "running git log");

        let output = cmd.output().map_err(|e| {
            StatError::GitCommand(format!(
                "failed to run {}: {e}",
                self.program.to_string_lossy()
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StatError::GitCommand(format!(
                "{} ({})",
                stderr.trim(),
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// Scan the path itself. Any failed scan aborts the run.
    Single(PathBuf),
    /// Scan every immediate subdirectory. Failed scans are skipped.
    Subdirectories(PathBuf),
}

impl Targets {
    pub fn new(base: PathBuf, all: bool) -> Self {
        if all {
            Targets::Subdirectories(base)
        } else {
            Targets::Single(base)
        }
    }

    pub fn base(&self) -> &Path {
        match self {
            Targets::Single(p) | Targets::Subdirectories(p) => p,
        }
    }

    /// Directories to scan, sorted by name in subdirectory mode.
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        match self {
            Targets::Single(path) => Ok(vec![path.clone()]),
            Targets::Subdirectories(base) => {
                let listing = |source: std::io::Error| StatError::DirectoryListing {
                    path: base.clone(),
                    source,
                };
                let mut dirs = Vec::new();
                for entry in fs::read_dir(base).map_err(listing)? {
                    let entry = entry.map_err(listing)?;
                    if entry.file_type().map_err(listing)?.is_dir() {
                        dirs.push(entry.path());
                    }
                }
                dirs.sort();
                Ok(dirs)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanPlan {
    targets: Targets,
    months: u32,
    extensions: Vec<String>,
    filters: Vec<String>,
}

impl ScanPlan {
    pub fn new<S: AsRef<str>>(targets: Targets, months: u32, extensions: &[S]) -> Result<Self> {
        if months == 0 {
            return Err(StatError::InvalidPlan(
                "at least one month must be scanned".to_string(),
            ));
        }

        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = normalize_extension(ext.as_ref()).ok_or_else(|| {
                StatError::InvalidPlan(format!("invalid file extension '{}'", ext.as_ref()))
            })?;
            if !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }
        if normalized.is_empty() {
            return Err(StatError::InvalidPlan(
                "at least one file extension is required".to_string(),
            ));
        }

        let filters = normalized.iter().map(|ext| format!("*.{ext}")).collect();
        Ok(Self {
            targets,
            months,
            extensions: normalized,
            filters,
        })
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Pathspec globs handed to the history source.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }
}

// "md", ".md" and "*.md" all mean the same thing.
fn normalize_extension(raw: &str) -> Option<String> {
    let ext = raw.trim();
    let ext = ext.strip_prefix('*').unwrap_or(ext);
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    if ext.is_empty() || ext.contains(['/', '\\', '*', '?', '[']) || ext.chars().any(char::is_whitespace) {
        None
    } else {
        Some(ext.to_string())
    }
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub aggregate: Aggregate,
    pub completed: usize,
    pub failures: Vec<StatError>,
}

impl ScanOutcome {
    pub fn failed_scans(&self) -> Vec<FailedScan> {
        self.failures
            .iter()
            .filter_map(|err| match err {
                StatError::Scan { dir, month, source } => Some(FailedScan {
                    directory: dir.to_string_lossy().to_string(),
                    month: *month,
                    error: source.to_string(),
                }),
                _ => None,
            })
            .collect()
    }
}

pub fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

/// Scan every directory for every month of the plan and fold the results.
///
/// In [`Targets::Single`] mode the first failed scan is returned as the
/// error. In [`Targets::Subdirectories`] mode failures are logged, collected
/// in [`ScanOutcome::failures`] and the remaining scans still run. Directory
/// listing failures are always fatal.
pub fn run_scans(
    plan: &ScanPlan,
    today: NaiveDate,
    source: &dyn HistorySource,
    progress: &ProgressBar,
) -> Result<ScanOutcome> {
    let windows = MonthWindow::plan(today, plan.months)?;
    let dirs = plan.targets.resolve()?;
    progress.set_length((windows.len() * dirs.len()) as u64);

    let mut outcome = ScanOutcome::default();
    for window in &windows {
        let month = window.key();
        for dir in &dirs {
            progress.set_message(format!("{month} {}", dir.display()));

            match scan_one(source, dir, window, &plan.filters) {
                Ok(attributions) => {
                    info!(
                        dir = %dir.display(),
                        %month,
                        records = attributions.len(),
                        "scan complete"
                    );
                    outcome.aggregate.fold(&month, attributions);
                    outcome.completed += 1;
                }
                Err(e) => {
                    let err = StatError::scan(dir, month, e);
                    if let Targets::Single(_) = plan.targets {
                        progress.finish_and_clear();
                        return Err(err);
                    }
                    warn!(error = %err, "skipping repository");
                    outcome.failures.push(err);
                }
            }
            progress.inc(1);
        }
    }

    progress.finish_and_clear();
    Ok(outcome)
}

// Parse fully before folding so a failed scan contributes nothing.
fn scan_one(
    source: &dyn HistorySource,
    dir: &Path,
    window: &MonthWindow,
    filters: &[String],
) -> Result<Vec<Attribution>> {
    let raw = source.scan(dir, window, filters)?;
    parse_log(&raw)
}
