//! Rules command - List the built-in rules.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use sift_core::{DetectorRegistry, LintConfig, Severity};

use super::OutputFormat;
use crate::ExitCodes;

#[derive(Args)]
pub struct RulesArgs {
    /// Configuration file whose overrides are applied to the listing
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct RuleRow {
    name: &'static str,
    resource_type: &'static str,
    severity: Severity,
    enabled: bool,
    deep: bool,
    link: String,
}

fn rows(registry: &DetectorRegistry, config: &LintConfig) -> Result<Vec<RuleRow>> {
    registry
        .instantiate()
        .iter()
        .map(|detector| {
            let meta = detector.meta();
            Ok(RuleRow {
                name: meta.name,
                resource_type: meta.resource_type,
                severity: config.severity_override(meta.name)?.unwrap_or(meta.severity),
                enabled: config.is_rule_enabled(meta.name, meta.enabled),
                deep: meta.requires_oracle,
                link: meta.link(),
            })
        })
        .collect()
}

pub fn execute(args: RulesArgs) -> Result<u8> {
    let dir = std::env::current_dir()?;
    let config = LintConfig::discover(args.config.as_deref(), &dir)
        .context("Failed to read configuration")?;
    let rows = rows(&sift_rules::default_registry(), &config)?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&rows).context("Failed to serialize rules")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for row in &rows {
                let mut flags = Vec::new();
                if !row.enabled {
                    flags.push("disabled");
                }
                if row.deep {
                    flags.push("deep");
                }
                println!(
                    "{:<50} {:<8} {}",
                    row.name,
                    row.severity.as_str(),
                    flags.join(",")
                );
            }
        }
    }

    Ok(ExitCodes::SUCCESS)
}
