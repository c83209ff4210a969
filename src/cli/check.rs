use clap::Parser;
use mdarrange::{Policy, domain::Violation, storage::version_label};
use nonempty::NonEmpty;
use serde_json::json;
use tracing::instrument;

use super::{
    OutputFormat, Workspace,
    terminal::{Colorize, heading},
};

#[derive(Debug, Parser, Default)]
#[command(about = "Load the policy and report every problem in it")]
pub struct Check {
    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Check {
    #[instrument(level = "debug", skip(self, workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let policy = match Policy::load(workspace.policy_path()) {
            Ok(policy) => policy,
            Err(error) => {
                if let Some(violations) = error.violations() {
                    match self.output {
                        OutputFormat::Json => Self::violations_json(violations)?,
                        OutputFormat::Table => Self::violations_table(violations),
                    }
                }
                return Err(error.into());
            }
        };

        match self.output {
            OutputFormat::Json => Self::summary_json(&policy)?,
            OutputFormat::Table => Self::summary_table(&policy),
        }
        Ok(())
    }

    fn summary_json(policy: &Policy) -> anyhow::Result<()> {
        let output = json!({
            "policy": policy.origin(),
            "valid": true,
            "versions": policy.doc_versions(),
            "sections": policy.sections().iter().map(|s| &s.name).collect::<Vec<_>>(),
            "link_rules": policy.link_rewriter().rules().len(),
            "static_dirs": policy.static_dirs(),
            "special_files": policy.special_files().len(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn summary_table(policy: &Policy) {
        heading(&format!("Policy {}", policy.origin()));

        let versions: Vec<_> = policy
            .doc_versions()
            .iter()
            .map(|v| format!("{v} ({})", version_label(v)))
            .collect();
        println!("{:<14} {}", "Versions", versions.join(", "));
        println!("{:<14} {}", "Sections", policy.sections().len());
        println!("{:<14} {}", "Link rules", policy.link_rewriter().rules().len());
        println!("{:<14} {}", "Static dirs", policy.static_dirs().join(", "));
        println!("{:<14} {}", "Special files", policy.special_files().len());
        println!();
        println!("{} ✅", "valid".success());
    }

    fn violations_json(violations: &NonEmpty<Violation>) -> anyhow::Result<()> {
        let items: Vec<_> = violations
            .iter()
            .map(|v| json!({ "field": v.field, "message": v.message }))
            .collect();
        let output = json!({ "valid": false, "violations": items });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    fn violations_table(violations: &NonEmpty<Violation>) {
        heading("Policy violations");
        for violation in violations.iter() {
            println!("{}  {}", violation.field.warning(), violation.message);
        }
        println!();
    }
}
