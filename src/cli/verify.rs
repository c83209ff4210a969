use std::process;

use clap::Parser;
use mdarrange::storage::{Verification, verify};
use serde_json::json;
use tracing::instrument;

use super::{
    OutputFormat, Workspace,
    terminal::{Colorize, heading},
};

#[derive(Debug, Parser)]
#[command(about = "Check that the output tree is complete")]
pub struct Verify {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Verify {
    #[instrument(level = "debug", skip(self, workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let policy = workspace.load_policy()?;
        let verification = verify(&policy, workspace.layout());

        match self.output {
            OutputFormat::Json => Self::output_json(&verification)?,
            OutputFormat::Table => Self::output_table(&verification, workspace),
        }

        if !verification.is_ok() {
            process::exit(2);
        }
        Ok(())
    }

    fn output_json(verification: &Verification) -> anyhow::Result<()> {
        let versions: Vec<_> = verification
            .versions
            .iter()
            .map(|v| {
                json!({
                    "version": v.version,
                    "present": v.present,
                    "sections": v.sections,
                    "missing_sections": v.missing_sections,
                })
            })
            .collect();
        let output = json!({
            "ok": verification.is_ok(),
            "content_exists": verification.content_exists,
            "markdown_files": verification.markdown_files,
            "versions": versions,
            "static_files": verification.static_files,
            "data_files": verification.data_files,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn output_table(verification: &Verification, workspace: &Workspace) {
        heading(&format!("Output {}", workspace.layout().content().display()));

        if !verification.content_exists {
            println!("{}", "content directory does not exist".failure());
            return;
        }

        println!("{:<10} {:<9} Missing", "Version", "Sections");
        for check in &verification.versions {
            let sections = if check.is_ok() {
                check.sections.to_string()
            } else {
                check.sections.failure()
            };
            let missing = if check.present {
                check.missing_sections.join(", ")
            } else {
                "version directory".to_string()
            };
            println!("{:<10} {sections:<9} {}", check.version, missing.warning());
        }
        println!();
        println!("Markdown files: {}", verification.markdown_files);
        println!("Static files:   {}", verification.static_files);
        println!("Data files:     {}", verification.data_files);
        println!();

        if verification.is_ok() {
            println!("{} ✅", "ok".success());
        } else {
            println!("{} ⚠️", "incomplete".failure());
        }
    }
}
