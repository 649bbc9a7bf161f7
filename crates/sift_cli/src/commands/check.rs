//! Check command - Run every rule over a configuration directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use sift_core::{
    provider_credentials, DeploymentState, LintConfig, RuleOutcome, RunReport, Runner, Severity,
};
use sift_loader::ModuleLoader;
use sift_oracle::{AwsCliOracle, AwsCredentials, Oracle};

use super::OutputFormat;
use crate::ExitCodes;

#[derive(Args)]
pub struct CheckArgs {
    /// Configuration directory to check
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Configuration file (defaults to ./.tfsift.yml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable rules that query AWS
    #[arg(long)]
    pub deep: bool,

    /// Rule names to ignore, comma separated
    #[arg(long = "ignore-rule")]
    pub ignore_rules: Vec<String>,

    /// Module sources to skip, comma separated
    #[arg(long = "ignore-module")]
    pub ignore_modules: Vec<String>,

    /// Variable files to load in addition to terraform.tfvars
    #[arg(long = "var-file")]
    pub var_files: Vec<PathBuf>,

    /// State file used to recognise already deployed resources
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// AWS access key
    #[arg(long)]
    pub aws_access_key: Option<String>,

    /// AWS secret key
    #[arg(long)]
    pub aws_secret_key: Option<String>,

    /// AWS shared credentials profile
    #[arg(long)]
    pub aws_profile: Option<String>,

    /// AWS shared credentials file
    #[arg(long)]
    pub aws_creds_file: Option<String>,

    /// AWS region
    #[arg(long)]
    pub aws_region: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl CheckArgs {
    /// Credentials given on the command line.
    pub fn credentials(&self) -> AwsCredentials {
        AwsCredentials {
            access_key: self.aws_access_key.clone(),
            secret_key: self.aws_secret_key.clone(),
            profile: self.aws_profile.clone(),
            shared_credentials_file: self.aws_creds_file.clone(),
            region: self.aws_region.clone(),
        }
    }

    /// Configuration file values with command line flags applied on top.
    pub fn lint_config(&self) -> Result<LintConfig> {
        let config = LintConfig::discover(self.config.as_deref(), &self.dir)
            .context("Failed to read configuration")?;

        Ok(config
            .with_deep_check(self.deep)
            .ignore_rules(&self.ignore_rules)
            .ignore_modules(&self.ignore_modules)
            .with_varfiles(self.var_files.iter().cloned())
            .with_state_file(self.state.clone())
            .with_credentials(self.credentials()))
    }
}

pub async fn execute(args: CheckArgs, quiet: bool) -> Result<u8> {
    info!("Checking configuration in {:?}", args.dir);

    let config = args.lint_config()?;
    let registry = sift_rules::default_registry();

    let root = ModuleLoader::new(config.loader_options())
        .load(&args.dir)
        .with_context(|| format!("Failed to load configuration from {}", args.dir.display()))?;
    let state = DeploymentState::load(&config.state_path(&args.dir));

    let oracle = if config.deep_check {
        let credentials = config.aws_credentials.clone().or(provider_credentials(&root));
        if credentials.region.is_none() {
            warn!("No AWS region configured; the AWS CLI default applies");
        }
        Some(Oracle::from_provider(Arc::new(AwsCliOracle::new(credentials))))
    } else {
        None
    };

    let mut runner = Runner::new(&registry, &config, &state);
    if let Some(oracle) = &oracle {
        runner = runner.with_oracle(oracle);
    }
    let report = runner.run(&root).await.context("Failed to run rules")?;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_text(&report, &args.dir, quiet),
    }

    for failure in report.failures() {
        if let RuleOutcome::Failed { error } = &failure.outcome {
            eprintln!(
                "{} could not complete in module {}: {}",
                failure.rule, failure.module, error
            );
        }
    }

    if report.has_issues() {
        Ok(ExitCodes::ISSUES_FOUND)
    } else {
        Ok(ExitCodes::SUCCESS)
    }
}

fn print_text(report: &RunReport, dir: &Path, quiet: bool) {
    for issue in &report.issues {
        println!("{}", issue);
    }
    if quiet {
        return;
    }

    if report.has_issues() {
        println!();
        println!(
            "{} issue(s) in {}: {} error(s), {} warning(s), {} notice(s)",
            report.issues.len(),
            dir.display(),
            report.count(Severity::Error),
            report.count(Severity::Warning),
            report.count(Severity::Notice)
        );
    } else {
        println!("No issues found in {} module(s).", report.modules);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(dir: &Path) -> CheckArgs {
        CheckArgs {
            dir: dir.to_path_buf(),
            config: None,
            deep: false,
            ignore_rules: Vec::new(),
            ignore_modules: Vec::new(),
            var_files: Vec::new(),
            state: None,
            aws_access_key: None,
            aws_secret_key: None,
            aws_profile: None,
            aws_creds_file: None,
            aws_region: None,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(".tfsift.yml"),
            "aws_credentials:\n  region: us-east-1\n  profile: default\nignore_rules:\n  - aws_instance_invalid_type\n",
        )
        .unwrap();

        let mut args = args(temp.path());
        args.aws_region = Some("eu-west-1".to_string());
        args.ignore_rules = vec!["aws_route_not_specified_target".to_string()];
        args.deep = true;

        let config = args.lint_config().unwrap();
        assert!(config.deep_check);
        assert_eq!(config.aws_credentials.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.aws_credentials.profile.as_deref(), Some("default"));
        assert_eq!(
            config.ignore_rules,
            vec!["aws_instance_invalid_type", "aws_route_not_specified_target"]
        );
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let temp = TempDir::new().unwrap();
        let mut args = args(temp.path());
        args.config = Some(temp.path().join("missing.yml"));
        assert!(args.lint_config().is_err());
    }

    #[tokio::test]
    async fn test_execute_reports_issues() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("main.tf"),
            "resource \"aws_instance\" \"web\" {\n  instance_type = \"t1.2xlarge\"\n}\n",
        )
        .unwrap();

        let code = execute(args(temp.path()), true).await.unwrap();
        assert_eq!(code, ExitCodes::ISSUES_FOUND);
    }

    #[tokio::test]
    async fn test_execute_clean_configuration() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("main.tf"),
            "resource \"aws_instance\" \"web\" {\n  instance_type = \"t2.micro\"\n}\n",
        )
        .unwrap();

        let code = execute(args(temp.path()), true).await.unwrap();
        assert_eq!(code, ExitCodes::SUCCESS);
    }
}
