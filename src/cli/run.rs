use std::process;

use clap::Parser;
use mdarrange::{Options, Restructurer, RunReport};
use serde_json::json;
use tracing::instrument;

use super::{
    OutputFormat, Workspace,
    terminal::{Colorize, heading, is_narrow},
};

#[derive(Debug, Parser)]
#[command(about = "Restructure the converted documentation")]
pub struct Run {
    /// Process only this version (repeatable)
    #[arg(long = "only", value_name = "VERSION")]
    versions: Vec<String>,

    /// Process versions in parallel
    #[arg(long)]
    parallel: bool,

    /// Report a digest of each version's output tree
    #[arg(long)]
    digest: bool,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Print a single summary line
    #[arg(long)]
    quiet: bool,
}

impl Run {
    #[instrument(level = "debug", skip(self, workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let policy = workspace.load_policy()?;
        let restructurer = Restructurer::new(policy, workspace.layout().clone());

        let options = Options {
            versions: (!self.versions.is_empty()).then_some(self.versions),
            parallel: self.parallel,
            digest: self.digest,
            cancel: None,
        };
        let report = restructurer.run(&options);

        match self.output {
            OutputFormat::Json => Self::output_json(&report)?,
            OutputFormat::Table if self.quiet => Self::output_quiet(&report),
            OutputFormat::Table => Self::output_table(&report),
        }

        // Completed, but something needs attention.
        if !report.is_clean() {
            process::exit(2);
        }
        Ok(())
    }

    fn output_json(report: &RunReport) -> anyhow::Result<()> {
        let versions: Vec<_> = report
            .versions
            .iter()
            .map(|version| {
                let sections: Vec<_> = version
                    .sections
                    .iter()
                    .map(|s| {
                        json!({
                            "name": s.name,
                            "written": s.written,
                            "issues": s.issues.iter().map(|i| json!({
                                "kind": i.kind(),
                                "message": i.to_string(),
                            })).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                json!({
                    "version": version.version,
                    "files_written": version.files_written(),
                    "sections": sections,
                    "static_files": version.assets.iter().map(|a| a.files).sum::<usize>(),
                    "issues": version.issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "digest": version.digest,
                })
            })
            .collect();

        let output = json!({
            "versions": versions,
            "files_written": report.files_written(),
            "shared_static_files": report.assets.iter().map(|a| a.files).sum::<usize>(),
            "data_files": report.data_files,
            "issues": report.issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "issue_count": report.issue_count(),
            "cancelled": report.cancelled,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_quiet(report: &RunReport) {
        println!(
            "versions={} files={} issues={} cancelled={}",
            report.versions.len(),
            report.files_written(),
            report.issue_count(),
            report.cancelled.len()
        );
    }

    fn output_table(report: &RunReport) {
        const MAX_ISSUE_DISPLAY: usize = 10;

        heading("Restructured versions");
        if is_narrow() {
            for version in &report.versions {
                println!(
                    "{}: {} files, {} issues",
                    version.version,
                    version.files_written(),
                    version.issues().count()
                );
            }
        } else {
            println!("{:<10} {:<9} {:<7} {:<7} Digest", "Version", "Sections", "Files", "Issues");
            for version in &report.versions {
                let digest = version
                    .digest
                    .as_deref()
                    .map_or_else(|| "–".dim(), |d| d[..12.min(d.len())].to_string());
                println!(
                    "{:<10} {:<9} {:<7} {:<7} {digest}",
                    version.version,
                    version.sections.len(),
                    version.files_written(),
                    version.issues().count(),
                );
            }
        }
        println!();

        if !report.assets.is_empty() || !report.data_files.is_empty() {
            for relocation in &report.assets {
                println!(
                    "{} {} ({} files)",
                    "static".info(),
                    relocation.to.display(),
                    relocation.files
                );
            }
            for path in &report.data_files {
                println!("{} {}", "data".info(), path.display());
            }
            println!();
        }

        if !report.cancelled.is_empty() {
            println!(
                "Cancelled: {} ⚠️",
                report.cancelled.join(", ").warning()
            );
            println!();
        }

        let issues: Vec<String> = report
            .versions
            .iter()
            .flat_map(|v| {
                v.issues().map(move |(section, issue)| match section {
                    Some(section) => format!("{}/{section}: {issue}", v.version),
                    None => format!("{}: {issue}", v.version),
                })
            })
            .chain(report.issues.iter().map(ToString::to_string))
            .collect();

        if issues.is_empty() {
            println!("Issues: {} ✅", "0".success());
            return;
        }

        println!("Issues: {} ⚠️", issues.len().failure());
        for issue in issues.iter().take(MAX_ISSUE_DISPLAY) {
            println!("  - {issue}");
        }
        if issues.len() > MAX_ISSUE_DISPLAY {
            println!("  - ... and {} more", issues.len() - MAX_ISSUE_DISPLAY);
        }
        println!("{}", "Run with --output json for the full report.".dim());
    }
}
