use crate::aggregate::Aggregate;
use crate::error::Result;
use crate::model::{
    AuthorKey, AuthorRow, ChangeCount, FailedScan, MonthAuthorRecord, MonthBlock, Report,
    ReportOutput, SCHEMA_VERSION,
};
use chrono::Utc;
use console::style;
use std::collections::HashMap;
use std::io::Write;

const RULE: &str = "-----------------------------";

/// Most insertions first; equal counts fall back to the author key.
fn rank(rows: &mut [AuthorRow]) {
    rows.sort_by(|a, b| {
        b.insertions
            .cmp(&a.insertions)
            .then_with(|| a.author.cmp(&b.author))
    });
}

impl Report {
    pub fn from_aggregate(aggregate: &Aggregate) -> Self {
        let mut by_month: HashMap<_, Vec<AuthorRow>> = HashMap::new();
        let mut by_author: HashMap<&AuthorKey, ChangeCount> = HashMap::new();

        for (author, month, counts) in aggregate.cells() {
            by_month.entry(*month).or_default().push(AuthorRow {
                author: author.clone(),
                insertions: counts.insertions,
                deletions: counts.deletions,
            });
            *by_author.entry(author).or_default() += *counts;
        }

        let months = aggregate
            .months()
            .into_iter()
            .map(|month| {
                let mut authors = by_month.remove(&month).unwrap_or_default();
                rank(&mut authors);
                MonthBlock {
                    month,
                    label: month.label(),
                    insertions: authors.iter().fold(0, |acc: u64, r| acc.saturating_add(r.insertions)),
                    deletions: authors.iter().fold(0, |acc: u64, r| acc.saturating_add(r.deletions)),
                    authors,
                }
            })
            .collect();

        let mut developers: Vec<AuthorRow> = by_author
            .into_iter()
            .map(|(author, counts)| AuthorRow {
                author: author.clone(),
                insertions: counts.insertions,
                deletions: counts.deletions,
            })
            .collect();
        rank(&mut developers);

        Report {
            months,
            developers,
            totals: aggregate.totals(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = MonthAuthorRecord> + '_ {
        self.months.iter().flat_map(|block| {
            block.authors.iter().map(move |row| MonthAuthorRecord {
                month: block.month,
                author: row.author.clone(),
                insertions: row.insertions,
                deletions: row.deletions,
            })
        })
    }
}

fn author_line(out: &mut dyn Write, row: &AuthorRow) -> std::io::Result<()> {
    writeln!(
        out,
        "  {:<30} {} lines {}",
        row.author.as_str(),
        style(format!("{:>5}", row.insertions)).green(),
        style(format!("(-{})", row.deletions)).dim()
    )
}

pub fn output_text(report: &Report, out: &mut dyn Write) -> Result<()> {
    if report.months.is_empty() {
        writeln!(out, "No changes found")?;
        return Ok(());
    }

    for block in &report.months {
        writeln!(out, "{RULE}")?;
        writeln!(out, "{}", style(&block.label).yellow())?;
        for row in &block.authors {
            author_line(out, row)?;
        }
        writeln!(
            out,
            "{} {} {} {}",
            style("Summary:").yellow(),
            style(block.insertions).green(),
            style("total lines").yellow(),
            style(format!("(-{})", block.deletions)).dim()
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).blue())?;
    writeln!(out, "{}", style("Total lines by developer:").blue())?;
    for row in &report.developers {
        author_line(out, row)?;
    }
    writeln!(out, "{}", style(RULE).blue())?;
    writeln!(
        out,
        "Total summary: {} total lines {}",
        style(report.totals.insertions).green(),
        style(format!("(-{})", report.totals.deletions)).dim()
    )?;
    Ok(())
}

pub struct RunInfo<'a> {
    pub base_path: String,
    pub all_repositories: bool,
    pub months_back: u32,
    pub extensions: &'a [String],
    pub failed_scans: Vec<FailedScan>,
}

pub fn output_json(report: &Report, info: RunInfo<'_>, out: &mut dyn Write) -> Result<()> {
    let output = ReportOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        base_path: info.base_path,
        all_repositories: info.all_repositories,
        months_back: info.months_back,
        extensions: info.extensions.to_vec(),
        months: report.months.clone(),
        developers: report.developers.clone(),
        total_insertions: report.totals.insertions,
        total_deletions: report.totals.deletions,
        failed_scans: info.failed_scans,
    };
    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}

pub fn output_ndjson(report: &Report, out: &mut dyn Write) -> Result<()> {
    for record in report.records() {
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
    }
    Ok(())
}
