//! Rules that report names already taken in the provider account.
//!
//! A live name is not a conflict when the deployment state shows the same
//! resource was deployed from this configuration. The recorded entry must
//! still agree with the candidate: a renamed resource is replaced on the
//! next apply, so its new name can collide.

use std::sync::Arc;

use async_trait::async_trait;
use sift_core::{
    CoreResult, DeploymentState, DetectScope, Detector, DetectorMeta, IssueSink,
    RecordedResource, Severity, ValueShape,
};
use sift_loader::Block;
use sift_oracle::{Query, ResourceSet, ScopedOracle};
use tracing::{debug, warn};

/// Reports values of a name attribute that are already in use.
pub struct DuplicateDetector {
    meta: DetectorMeta,
    query: Query,
    noun: &'static str,
    /// Attribute that scopes the name, such as `vpc_id`. Live names are
    /// then keyed `<scope>.<name>`.
    scope_attribute: Option<&'static str>,
    live: Arc<ResourceSet>,
    /// Default VPC lookup, kept as an error message when it failed. Only
    /// resources that omit the scope attribute depend on it.
    default_scope: Result<Option<String>, String>,
}

impl DuplicateDetector {
    pub fn new(meta: DetectorMeta, query: Query, noun: &'static str) -> Self {
        Self {
            meta: meta.requires_oracle(),
            query,
            noun,
            scope_attribute: None,
            live: Arc::default(),
            default_scope: Ok(None),
        }
    }

    /// Names are unique per value of `attribute`. When a resource omits it
    /// the provider's default VPC is assumed.
    pub fn scoped_by(mut self, attribute: &'static str) -> Self {
        self.scope_attribute = Some(attribute);
        self
    }

    /// Comparison key for a candidate name, or `None` if its scope cannot
    /// be determined.
    fn key(&self, scope: &DetectScope<'_>, block: &Block, name: &str) -> Option<String> {
        let Some(scope_attribute) = self.scope_attribute else {
            return Some(name.to_string());
        };
        match block.attribute(scope_attribute) {
            Some(attr) => match scope.resolver.resolve(&attr.token) {
                Ok(vpc) => Some(format!("{}.{}", vpc, name)),
                Err(e) => {
                    debug!("Skipping {}: {}", name, e);
                    None
                }
            },
            // EC2-Classic groups have an empty scope.
            None => match &self.default_scope {
                Ok(vpc) => Some(format!("{}.{}", vpc.as_deref().unwrap_or_default(), name)),
                Err(e) => {
                    warn!(
                        "Skipping {} without {}: default VPC unavailable: {}",
                        name, scope_attribute, e
                    );
                    None
                }
            },
        }
    }

    fn is_deployed(&self, state: &DeploymentState, block: &Block, value: &str) -> bool {
        let Some(local_name) = block.resource_name() else {
            return false;
        };
        let attribute = self.meta.attribute;
        state.exists_with(self.meta.resource_type, local_name, |recorded: &RecordedResource| {
            recorded.attribute(attribute).map_or(true, |v| v == value) || recorded.id == value
        })
    }
}

#[async_trait]
impl Detector for DuplicateDetector {
    fn meta(&self) -> &DetectorMeta {
        &self.meta
    }

    async fn pre_process(&mut self, oracle: &mut ScopedOracle<'_>) -> CoreResult<()> {
        self.live = oracle.fetch(self.query).await?;
        if self.scope_attribute.is_some() {
            self.default_scope = oracle.default_vpc().await.map_err(|e| e.to_string());
            debug!("Default VPC: {:?}", self.default_scope);
        }
        Ok(())
    }

    fn detect(&self, scope: &DetectScope<'_>, sink: &mut IssueSink) {
        for block in scope.resources(self.meta.resource_type) {
            let Some(attr) = block.attribute(self.meta.attribute) else {
                continue;
            };
            for resolved in scope.resolver.values(attr, ValueShape::Scalar) {
                let Some(key) = self.key(scope, block, &resolved.value) else {
                    continue;
                };
                if !self.live.contains(&key) {
                    continue;
                }
                if self.is_deployed(scope.state, block, &resolved.value) {
                    debug!(
                        "{} \"{}\" is recorded in state, not a duplicate",
                        self.meta.resource_type, resolved.value
                    );
                    continue;
                }
                sink.emit_at(
                    format!("\"{}\" is duplicate {}. It must be unique.", resolved.value, self.noun),
                    &resolved.token,
                );
            }
        }
    }
}

fn duplicate_rule(
    name: &'static str,
    resource_type: &'static str,
    attribute: &'static str,
    query: Query,
    noun: &'static str,
) -> DuplicateDetector {
    DuplicateDetector::new(
        DetectorMeta::new(name, resource_type, attribute, Severity::Error),
        query,
        noun,
    )
}

pub fn aws_security_group_duplicate_name() -> Box<dyn Detector> {
    Box::new(
        duplicate_rule(
            "aws_security_group_duplicate_name",
            "aws_security_group",
            "name",
            Query::SecurityGroupNames,
            "name",
        )
        .scoped_by("vpc_id"),
    )
}

pub fn aws_db_instance_duplicate_identifier() -> Box<dyn Detector> {
    Box::new(duplicate_rule(
        "aws_db_instance_duplicate_identifier",
        "aws_db_instance",
        "identifier",
        Query::DbInstanceIdentifiers,
        "identifier",
    ))
}

pub fn aws_elasticache_cluster_duplicate_id() -> Box<dyn Detector> {
    Box::new(duplicate_rule(
        "aws_elasticache_cluster_duplicate_id",
        "aws_elasticache_cluster",
        "cluster_id",
        Query::CacheClusterIds,
        "Cluster ID",
    ))
}

pub fn aws_elb_duplicate_name() -> Box<dyn Detector> {
    Box::new(duplicate_rule(
        "aws_elb_duplicate_name",
        "aws_elb",
        "name",
        Query::ClassicLoadBalancerNames,
        "name",
    ))
}

pub fn aws_alb_duplicate_name() -> Box<dyn Detector> {
    Box::new(duplicate_rule(
        "aws_alb_duplicate_name",
        "aws_alb",
        "name",
        Query::LoadBalancerNames,
        "name",
    ))
}

pub fn aws_ecs_cluster_duplicate_name() -> Box<dyn Detector> {
    Box::new(duplicate_rule(
        "aws_ecs_cluster_duplicate_name",
        "aws_ecs_cluster",
        "name",
        Query::EcsClusterNames,
        "name",
    ))
}
