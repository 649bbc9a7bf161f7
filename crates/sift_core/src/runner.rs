//! Drives every registered detector over every module scope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sift_loader::Module;
use sift_oracle::{Oracle, ScopedOracle};
use tracing::{debug, info, warn};

use crate::config::LintConfig;
use crate::detector::{DetectScope, DetectorRun, IssueSink};
use crate::error::CoreResult;
use crate::issue::{Issue, Severity};
use crate::registry::DetectorRegistry;
use crate::state::DeploymentState;

/// Why a rule did not run in a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    DeepCheckDisabled,
    NoTargetResources,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::DeepCheckDisabled => "deep check disabled",
            Self::NoTargetResources => "no target resources",
        }
    }
}

/// How one rule ended in one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    Completed { issues: usize },
    Failed { error: String },
    Skipped { reason: SkipReason },
}

/// Outcome of one rule in one module scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReport {
    pub rule: String,
    pub module: String,
    #[serde(flatten)]
    pub outcome: RuleOutcome,
}

/// Result of a full run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub issues: Vec<Issue>,
    pub outcomes: Vec<RuleReport>,
    pub modules: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl RunReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Rules that could not complete, with the scope they failed in.
    pub fn failures(&self) -> impl Iterator<Item = &RuleReport> {
        self.outcomes
            .iter()
            .filter(|report| matches!(report.outcome, RuleOutcome::Failed { .. }))
    }
}

/// Issues and rule outcomes of one module scope.
#[derive(Debug, Default)]
pub struct ScopeReport {
    pub issues: Vec<Issue>,
    pub outcomes: Vec<RuleReport>,
    /// Provider queries sent from this scope.
    pub round_trips: usize,
}

/// Runs the registry over a module tree.
pub struct Runner<'a> {
    registry: &'a DetectorRegistry,
    config: &'a LintConfig,
    state: &'a DeploymentState,
    oracle: Option<&'a Oracle>,
}

impl<'a> Runner<'a> {
    pub fn new(
        registry: &'a DetectorRegistry,
        config: &'a LintConfig,
        state: &'a DeploymentState,
    ) -> Self {
        Self {
            registry,
            config,
            state,
            oracle: None,
        }
    }

    pub fn with_oracle(mut self, oracle: &'a Oracle) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Check the root module and every module below it, depth first.
    pub async fn run(&self, root: &Module) -> CoreResult<RunReport> {
        self.config.validate(self.registry)?;
        let started_at = Utc::now();
        info!("Running {} rule(s)", self.registry.len());

        let mut issues = Vec::new();
        let mut outcomes = Vec::new();
        let mut modules = 0;

        let mut pending = vec![root];
        while let Some(module) = pending.pop() {
            let scope = self.run_scope(module).await?;
            issues.extend(scope.issues);
            outcomes.extend(scope.outcomes);
            modules += 1;
            pending.extend(module.children.iter().rev());
        }

        let report = RunReport {
            issues,
            outcomes,
            modules,
            started_at,
            completed_at: Utc::now(),
        };
        info!(
            "Checked {} module(s): {} issue(s), {} failed rule run(s)",
            report.modules,
            report.issues.len(),
            report.failures().count()
        );
        Ok(report)
    }

    /// Check a single module scope with fresh detector instances.
    pub async fn run_scope(&self, module: &Module) -> CoreResult<ScopeReport> {
        let module_name = module.display_name().to_string();
        debug!("Checking module {}", module_name);

        let scope = DetectScope::new(module, self.state);
        let mut oracle = match self.oracle {
            Some(oracle) if self.config.deep_check => ScopedOracle::new(oracle),
            _ => ScopedOracle::offline(),
        };
        let mut report = ScopeReport::default();

        for detector in self.registry.instantiate() {
            let meta = detector.meta().clone();
            let record = |outcome| RuleReport {
                rule: meta.name.to_string(),
                module: module_name.clone(),
                outcome,
            };

            let skip = if !self.config.is_rule_enabled(meta.name, meta.enabled) {
                Some(SkipReason::Disabled)
            } else if meta.requires_oracle && !oracle.is_available() {
                Some(SkipReason::DeepCheckDisabled)
            } else if !module.has_resources(meta.resource_type) {
                Some(SkipReason::NoTargetResources)
            } else {
                None
            };
            if let Some(reason) = skip {
                report.outcomes.push(record(RuleOutcome::Skipped { reason }));
                continue;
            }

            let mut run = DetectorRun::new(detector);
            if let Err(e) = run.pre_process(&mut oracle).await {
                warn!("{} failed in module {}: {}", meta.name, module_name, e);
                report.outcomes.push(record(RuleOutcome::Failed {
                    error: e.to_string(),
                }));
                continue;
            }

            let severity = self
                .config
                .severity_override(meta.name)?
                .unwrap_or(meta.severity);
            let mut sink = IssueSink::new(&meta).with_severity(severity);
            run.detect(&scope, &mut sink)?;
            run.finish()?;

            let issues: Vec<Issue> = sink
                .into_issues()
                .into_iter()
                .filter(|issue| !is_annotated(module, issue))
                .collect();
            report.outcomes.push(record(RuleOutcome::Completed {
                issues: issues.len(),
            }));
            report.issues.extend(issues);
        }

        report.round_trips = oracle.round_trips();
        Ok(report)
    }
}

fn is_annotated(module: &Module, issue: &Issue) -> bool {
    let ignored = module
        .file(&issue.file)
        .is_some_and(|file| file.is_ignored(&issue.rule, issue.line));
    if ignored {
        debug!("{}:{} {} ignored by annotation", issue.file, issue.line, issue.rule);
    }
    ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{Detector, DetectorMeta};
    use async_trait::async_trait;
    use sift_loader::{ConfigFile, Evaluator};
    use sift_oracle::{MockOracle, Query};
    use std::sync::Arc;

    /// Flags every `aws_instance` `ami` whose value is not a known image.
    struct UnknownAmi {
        meta: DetectorMeta,
        known: Vec<String>,
    }

    fn unknown_ami() -> Box<dyn Detector> {
        Box::new(UnknownAmi {
            meta: DetectorMeta::new("unknown_ami", "aws_instance", "ami", Severity::Error)
                .requires_oracle(),
            known: Vec::new(),
        })
    }

    #[async_trait]
    impl Detector for UnknownAmi {
        fn meta(&self) -> &DetectorMeta {
            &self.meta
        }

        async fn pre_process(&mut self, oracle: &mut ScopedOracle<'_>) -> CoreResult<()> {
            assert!(self.known.is_empty(), "detector state leaked between scopes");
            self.known = oracle.fetch(Query::ImageIds).await?.iter().cloned().collect();
            Ok(())
        }

        fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
            for block in scope.resources(self.meta.resource_type) {
                let Some(attr) = block.attribute(self.meta.attribute) else {
                    continue;
                };
                if let Ok(value) = scope.resolver.resolve(&attr.token) {
                    if !self.known.contains(&value) {
                        sink.emit_at(format!("\"{}\" is unknown.", value), &attr.token);
                    }
                }
            }
        }
    }

    struct MissingName(DetectorMeta);

    fn missing_name() -> Box<dyn Detector> {
        Box::new(MissingName(DetectorMeta::new(
            "missing_name",
            "aws_instance",
            "name",
            Severity::Notice,
        )))
    }

    impl Detector for MissingName {
        fn meta(&self) -> &DetectorMeta {
            &self.0
        }

        fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
            for block in scope.resources(self.0.resource_type) {
                if !block.has_attribute(self.0.attribute) {
                    sink.emit("name is not specified.", &block.file, block.line);
                }
            }
        }
    }

    fn module(key: &str, file: &str, source: &str) -> Module {
        let file = ConfigFile::parse(file, source).unwrap();
        Module::from_files(key, vec![file], Evaluator::new())
    }

    fn tree() -> Module {
        module(
            "",
            "main.tf",
            "resource \"aws_instance\" \"web\" {\n  ami = \"ami-root\"\n}\n",
        )
        .with_child(module(
            "app",
            "app/main.tf",
            "resource \"aws_instance\" \"app\" {\n  ami = \"ami-app\"\n  name = \"app\"\n}\n",
        ))
    }

    fn registry() -> DetectorRegistry {
        DetectorRegistry::new().with(unknown_ami).with(missing_name)
    }

    #[tokio::test]
    async fn test_run_visits_every_module_in_order() {
        let mock = MockOracle::new().with_response(Query::ImageIds, ["ami-app"]);
        let oracle = Oracle::from_provider(Arc::new(mock.clone()));
        let registry = registry();
        let config = LintConfig::new().with_deep_check(true);
        let state = DeploymentState::empty();

        let report = Runner::new(&registry, &config, &state)
            .with_oracle(&oracle)
            .run(&tree())
            .await
            .unwrap();

        assert_eq!(report.modules, 2);
        let rendered: Vec<_> = report.issues.iter().map(|i| (i.rule.as_str(), i.file.as_str())).collect();
        assert_eq!(
            rendered,
            vec![("unknown_ami", "main.tf"), ("missing_name", "main.tf")]
        );
        // One query per scope.
        assert_eq!(mock.calls_for(Query::ImageIds), 2);
    }

    #[tokio::test]
    async fn test_oracle_rules_skipped_without_deep_check() {
        let mock = MockOracle::new();
        let oracle = Oracle::from_provider(Arc::new(mock.clone()));
        let registry = registry();
        let config = LintConfig::new();
        let state = DeploymentState::empty();

        let report = Runner::new(&registry, &config, &state)
            .with_oracle(&oracle)
            .run(&tree())
            .await
            .unwrap();

        assert_eq!(mock.call_count(), 0);
        assert!(report.outcomes.iter().any(|o| o.rule == "unknown_ami"
            && o.outcome
                == RuleOutcome::Skipped {
                    reason: SkipReason::DeepCheckDisabled
                }));
        assert_eq!(report.issues.len(), 1);
    }

    #[tokio::test]
    async fn test_oracle_failure_is_isolated() {
        let mock = MockOracle::new().simulate_failure(Query::ImageIds, "AccessDenied");
        let oracle = Oracle::from_provider(Arc::new(mock));
        let registry = registry();
        let config = LintConfig::new().with_deep_check(true);
        let state = DeploymentState::empty();

        let report = Runner::new(&registry, &config, &state)
            .with_oracle(&oracle)
            .run(&tree())
            .await
            .unwrap();

        assert_eq!(report.failures().count(), 2);
        assert!(report.issues.iter().all(|i| i.rule == "missing_name"));
        assert_eq!(report.issues.len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_rules_and_severity_override() {
        let registry = registry();
        let config = LintConfig::from_yaml(
            "ignore_rules: [unknown_ami]\nrules:\n  missing_name:\n    severity: warning\n",
        )
        .unwrap();
        let state = DeploymentState::empty();

        let report = Runner::new(&registry, &config, &state).run(&tree()).await.unwrap();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].severity, Severity::Warning);
        assert_eq!(report.count(Severity::Warning), 1);
    }

    #[tokio::test]
    async fn test_no_target_resources_means_no_query() {
        let mock = MockOracle::new();
        let oracle = Oracle::from_provider(Arc::new(mock.clone()));
        let registry = registry();
        let config = LintConfig::new().with_deep_check(true);
        let state = DeploymentState::empty();
        let empty = module("", "main.tf", "resource \"aws_s3_bucket\" \"b\" {}\n");

        let scope = Runner::new(&registry, &config, &state)
            .with_oracle(&oracle)
            .run_scope(&empty)
            .await
            .unwrap();
        assert_eq!(scope.round_trips, 0);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_annotation_suppresses_issue() {
        let registry = DetectorRegistry::new().with(missing_name);
        let config = LintConfig::new();
        let state = DeploymentState::empty();
        let root = module(
            "",
            "main.tf",
            "# tfsift-ignore: missing_name\nresource \"aws_instance\" \"web\" {\n}\n",
        );

        let report = Runner::new(&registry, &config, &state).run(&root).await.unwrap();
        assert!(!report.has_issues());
    }
}
