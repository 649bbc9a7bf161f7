//! Lint configuration.
//!
//! Loaded from `.tfsift.yml` (or an explicit path) and then adjusted by
//! command line flags.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sift_loader::{LoaderOptions, Module};
use sift_oracle::AwsCredentials;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::issue::Severity;
use crate::registry::DetectorRegistry;
use crate::resolver::AttributeResolver;

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".tfsift.yml";

/// State file used when none is configured.
pub const DEFAULT_STATE_FILE: &str = "terraform.tfstate";

/// Per-rule overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub enabled: Option<bool>,
    pub severity: Option<String>,
}

/// Settings for one lint run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Run rules that query the cloud provider.
    pub deep_check: bool,
    pub aws_credentials: AwsCredentials,
    pub ignore_rules: Vec<String>,
    /// Module sources that are not inspected.
    pub ignore_modules: Vec<String>,
    pub varfiles: Vec<PathBuf>,
    pub state_file: Option<PathBuf>,
    pub rules: BTreeMap<String, RuleConfig>,
}

impl LintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        debug!("Loading config from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load `path` if given (it must exist), otherwise the default file in
    /// `dir` if present, otherwise defaults.
    pub fn discover(path: Option<&Path>, dir: &Path) -> CoreResult<Self> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(CoreError::Config(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                Self::load(path)
            }
            None => {
                let default = dir.join(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn with_deep_check(mut self, enabled: bool) -> Self {
        self.deep_check = self.deep_check || enabled;
        self
    }

    /// Add rules to ignore. Accepts comma-separated lists.
    pub fn ignore_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        extend_csv(&mut self.ignore_rules, rules);
        self
    }

    /// Add module sources to ignore. Accepts comma-separated lists.
    pub fn ignore_modules<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        extend_csv(&mut self.ignore_modules, sources);
        self
    }

    pub fn with_varfiles<I>(mut self, varfiles: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.varfiles.extend(varfiles);
        self
    }

    pub fn with_state_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.state_file = path;
        }
        self
    }

    /// Credentials passed here take precedence over the file's.
    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.aws_credentials = credentials.or(self.aws_credentials);
        self
    }

    pub fn state_path(&self, dir: &Path) -> PathBuf {
        match &self.state_file {
            Some(path) => path.clone(),
            None => dir.join(DEFAULT_STATE_FILE),
        }
    }

    pub fn is_rule_enabled(&self, name: &str, default: bool) -> bool {
        if self.ignore_rules.iter().any(|rule| rule == name) {
            return false;
        }
        self.rules
            .get(name)
            .and_then(|rule| rule.enabled)
            .unwrap_or(default)
    }

    pub fn severity_override(&self, name: &str) -> CoreResult<Option<Severity>> {
        self.rules
            .get(name)
            .and_then(|rule| rule.severity.as_deref())
            .map(str::parse)
            .transpose()
    }

    /// Check rule names and severities against the registry. Unknown rule
    /// names are reported as warnings; a bad severity is an error.
    pub fn validate(&self, registry: &DetectorRegistry) -> CoreResult<Vec<String>> {
        let mut warnings = Vec::new();
        for name in self.ignore_rules.iter().chain(self.rules.keys()) {
            if !registry.contains(name) {
                let message = format!("unknown rule: {}", name);
                warn!("{}", message);
                warnings.push(message);
            }
        }
        for name in self.rules.keys() {
            self.severity_override(name)?;
        }
        Ok(warnings)
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            varfiles: self.varfiles.clone(),
            ignore_modules: self.ignore_modules.clone(),
        }
    }
}

/// Credentials declared in the root module's `provider "aws"` block.
/// Attributes that cannot be evaluated are left unset.
pub fn provider_credentials(root: &Module) -> AwsCredentials {
    let Some(provider) = root.provider("aws") else {
        return AwsCredentials::default();
    };
    let resolver = AttributeResolver::new(&root.evaluator);
    let read = |name: &str| {
        provider
            .attribute(name)
            .and_then(|attr| resolver.resolve(&attr.token).ok())
    };

    AwsCredentials {
        access_key: read("access_key"),
        secret_key: read("secret_key"),
        profile: read("profile"),
        shared_credentials_file: read("shared_credentials_file"),
        region: read("region"),
    }
}

fn extend_csv<I, S>(target: &mut Vec<String>, values: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    for value in values {
        for item in value.as_ref().split(',') {
            let item = item.trim();
            if !item.is_empty() && !target.iter().any(|existing| existing == item) {
                target.push(item.to_string());
            }
        }
    }
}
