//! Detector trait and lifecycle.
//!
//! A detector checks one attribute of one resource type. It runs in two
//! phases per module scope: `pre_process` may query the oracle and build
//! lookup sets, then `detect` walks the scope and reports issues. `detect`
//! receives no oracle handle, so it cannot make provider calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sift_loader::{AttributeToken, Block, Module};
use sift_oracle::ScopedOracle;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::issue::{Issue, Severity};
use crate::resolver::AttributeResolver;
use crate::state::DeploymentState;

const DOCS_BASE: &str = "https://github.com/tfsift/tfsift/blob/main/docs/rules";

/// Static description of a detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorMeta {
    pub name: &'static str,
    pub resource_type: &'static str,
    pub attribute: &'static str,
    pub severity: Severity,
    pub requires_oracle: bool,
    pub enabled: bool,
}

impl DetectorMeta {
    pub fn new(
        name: &'static str,
        resource_type: &'static str,
        attribute: &'static str,
        severity: Severity,
    ) -> Self {
        Self {
            name,
            resource_type,
            attribute,
            severity,
            requires_oracle: false,
            enabled: true,
        }
    }

    pub fn requires_oracle(mut self) -> Self {
        self.requires_oracle = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Documentation page for the rule.
    pub fn link(&self) -> String {
        format!("{}/{}.md", DOCS_BASE, self.name)
    }
}

/// Everything `detect` may look at in one module scope.
pub struct DetectScope<'a> {
    pub module: &'a Module,
    pub resolver: AttributeResolver<'a>,
    pub state: &'a DeploymentState,
}

impl<'a> DetectScope<'a> {
    pub fn new(module: &'a Module, state: &'a DeploymentState) -> Self {
        Self {
            module,
            resolver: AttributeResolver::new(&module.evaluator),
            state,
        }
    }

    /// Resource blocks of the given type, in file then source order.
    pub fn resources(&self, resource_type: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.module.resources(resource_type)
    }
}

/// Collects the issues of one detector run.
#[derive(Debug)]
pub struct IssueSink {
    rule: String,
    severity: Severity,
    link: String,
    issues: Vec<Issue>,
}

impl IssueSink {
    pub fn new(meta: &DetectorMeta) -> Self {
        Self {
            rule: meta.name.to_string(),
            severity: meta.severity,
            link: meta.link(),
            issues: Vec::new(),
        }
    }

    /// Report with a different severity than the detector declares.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn emit(&mut self, message: impl Into<String>, file: &str, line: usize) {
        let issue = Issue::new(&self.rule, self.severity, message, file, line).with_link(&self.link);
        self.issues.push(issue);
    }

    /// Report at the position of a token.
    pub fn emit_at(&mut self, message: impl Into<String>, token: &AttributeToken) {
        self.emit(message, &token.file, token.line);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

/// Rule logic bound to one attribute of one resource type.
#[async_trait]
pub trait Detector: Send + Sync {
    fn meta(&self) -> &DetectorMeta;

    /// One-time setup per module scope. The only phase with oracle access.
    async fn pre_process(&mut self, _oracle: &mut ScopedOracle<'_>) -> CoreResult<()> {
        Ok(())
    }

    /// Check the scope and report issues. Must not mutate detector state.
    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink);
}

/// Lifecycle position of a detector within one module scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Unstarted,
    PreProcessed,
    Detected,
    Done,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::PreProcessed => "pre_processed",
            Self::Detected => "detected",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detector instance driven through its lifecycle for one scope.
pub struct DetectorRun {
    detector: Box<dyn Detector>,
    state: Lifecycle,
}

impl DetectorRun {
    pub fn new(detector: Box<dyn Detector>) -> Self {
        Self {
            detector,
            state: Lifecycle::Unstarted,
        }
    }

    pub fn meta(&self) -> &DetectorMeta {
        self.detector.meta()
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Run the pre-process phase. On failure the run is finished.
    pub async fn pre_process(&mut self, oracle: &mut ScopedOracle<'_>) -> CoreResult<()> {
        self.check_transition(Lifecycle::Unstarted, Lifecycle::PreProcessed)?;
        match self.detector.pre_process(oracle).await {
            Ok(()) => {
                self.state = Lifecycle::PreProcessed;
                Ok(())
            }
            Err(e) => {
                self.state = Lifecycle::Done;
                Err(e)
            }
        }
    }

    pub fn detect(&mut self, scope: &DetectScope<'_>, sink: &mut IssueSink) -> CoreResult<()> {
        self.check_transition(Lifecycle::PreProcessed, Lifecycle::Detected)?;
        self.detector.detect(scope, sink);
        debug!("{} reported {} issue(s)", self.meta().name, sink.issues().len());
        self.state = Lifecycle::Detected;
        Ok(())
    }

    pub fn finish(&mut self) -> CoreResult<()> {
        self.check_transition(Lifecycle::Detected, Lifecycle::Done)?;
        self.state = Lifecycle::Done;
        Ok(())
    }

    fn check_transition(&self, from: Lifecycle, to: Lifecycle) -> CoreResult<()> {
        if self.state == from {
            Ok(())
        } else {
            Err(CoreError::Lifecycle {
                rule: self.meta().name.to_string(),
                from: self.state.as_str(),
                to: to.as_str(),
            })
        }
    }
}
