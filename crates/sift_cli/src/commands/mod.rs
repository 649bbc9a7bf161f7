//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};

pub mod check;
pub mod rules;

/// tfsift - find mistakes in Terraform configurations for AWS
#[derive(Parser)]
#[command(name = "tfsift")]
#[command(version, about = "tfsift - find mistakes in Terraform configurations for AWS")]
#[command(long_about = r#"
tfsift checks Terraform configurations for errors that `terraform plan`
does not catch: invalid instance types, references to resources that do
not exist, names that are already taken, and more.

COMMANDS:
  check   → Check a configuration directory and every module it calls
  rules   → List the built-in rules

EXIT CODES:
  0 - No issues found
  1 - General error
  2 - Invalid arguments or configuration
  3 - Issues found
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a configuration directory
    Check(check::CheckArgs),

    /// List the built-in rules
    Rules(rules::RulesArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_flags() {
        let cli = Cli::try_parse_from([
            "tfsift",
            "--debug",
            "check",
            "infra",
            "--deep",
            "--ignore-rule",
            "aws_instance_invalid_type,aws_instance_previous_type",
            "--var-file",
            "prod.tfvars",
            "--aws-region",
            "us-east-1",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(cli.debug);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.dir.to_str(), Some("infra"));
        assert!(args.deep);
        assert_eq!(args.ignore_rules.len(), 1);
        assert_eq!(args.var_files.len(), 1);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.credentials().region.as_deref(), Some("us-east-1"));
    }
}
