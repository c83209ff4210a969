use clap::Parser;
use mdarrange::{Policy, Section, Strategy};
use serde_json::{Value, json};
use tracing::instrument;

use super::{
    OutputFormat, Workspace,
    terminal::{Colorize, heading},
};

#[derive(Debug, Parser)]
#[command(about = "List sections and the files each will produce")]
pub struct Sections {
    /// Show only this section
    name: Option<String>,

    /// Output format (table, json)
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Sections {
    #[instrument(level = "debug", skip(self, workspace))]
    pub fn run(self, workspace: &Workspace) -> anyhow::Result<()> {
        let policy = workspace.load_policy()?;

        let selected: Vec<_> = policy
            .sections()
            .iter()
            .enumerate()
            .filter(|(_, s)| self.name.as_ref().is_none_or(|name| &s.name == name))
            .collect();
        if selected.is_empty() {
            if let Some(name) = &self.name {
                anyhow::bail!("no section named '{name}' in {}", policy.origin());
            }
            println!("The policy declares no sections.");
            return Ok(());
        }

        match self.output {
            OutputFormat::Json => {
                let sections: Vec<_> = selected
                    .iter()
                    .map(|(position, section)| {
                        json!({
                            "name": section.name,
                            "title": section.title,
                            "weight": Policy::section_weight(*position),
                            "strategy": section.strategy.name(),
                            "outputs": planned(&policy, section),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&sections)?);
            }
            OutputFormat::Table => {
                for (position, section) in selected {
                    heading(&format!("{} ({})", section.name, section.title));
                    println!(
                        "{} {}, weight {}",
                        "strategy".dim(),
                        section.strategy.name(),
                        Policy::section_weight(position)
                    );
                    for output in planned(&policy, section) {
                        let weight = output["weight"]
                            .as_u64()
                            .map_or_else(|| "–".dim(), |w| w.to_string());
                        let file = output["file"].as_str().unwrap_or_default();
                        let source = output["source"].as_str().unwrap_or_default();
                        println!("  {weight:>5}  {file:<40} {}", source.dim());
                    }
                    println!();
                }
            }
        }
        Ok(())
    }
}

/// The files one section writes besides its index page.
fn planned(policy: &Policy, section: &Section) -> Vec<Value> {
    match &section.strategy {
        Strategy::Arrange { files } => files
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let weight = if policy.auto_weight() {
                    Some(policy.weight_for(section, index))
                } else {
                    entry.weight
                };
                json!({
                    "file": entry.output_path(),
                    "source": entry.src_file,
                    "weight": weight,
                })
            })
            .collect(),
        Strategy::SplitByHeading { src_file, splitter } => vec![json!({
            "file": format!("<one file per level {} heading>", splitter.depth()),
            "source": src_file,
            "weight": policy.weight_for(section, 0),
        })],
    }
}
