//! Read-only view of a persisted deployment state file.
//!
//! Two layouts are understood: the legacy one with a `modules` list whose
//! `resources` map is keyed by `<type>.<name>`, and the newer one with a
//! flat `resources` list of `{mode, type, name, instances}` entries.
//! Unknown fields are ignored.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};

/// A resource recorded as deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResource {
    pub resource_type: String,
    pub name: String,
    pub id: String,
    pub attributes: BTreeMap<String, String>,
}

impl RecordedResource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Snapshot of deployed resources, keyed by type and local name.
#[derive(Debug, Clone, Default)]
pub struct DeploymentState {
    resources: HashMap<(String, String), RecordedResource>,
}

#[derive(Debug, Deserialize)]
struct RawState {
    #[serde(default)]
    modules: Vec<LegacyModule>,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct LegacyModule {
    #[serde(default)]
    resources: HashMap<String, LegacyResource>,
}

#[derive(Debug, Deserialize)]
struct LegacyResource {
    #[serde(rename = "type")]
    resource_type: String,
    #[serde(default)]
    primary: LegacyPrimary,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyPrimary {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(default)]
    mode: Option<String>,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    instances: Vec<RawInstance>,
}

#[derive(Debug, Deserialize)]
struct RawInstance {
    #[serde(default)]
    attributes: serde_json::Map<String, Value>,
}

impl DeploymentState {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse state file content.
    pub fn parse(content: &str) -> CoreResult<Self> {
        let raw: RawState =
            serde_json::from_str(content).map_err(|e| CoreError::StateParse(e.to_string()))?;
        let mut state = Self::empty();

        for module in raw.modules {
            for (key, resource) in module.resources {
                // `data.` entries are reads, not deployments.
                if key.starts_with("data.") {
                    continue;
                }
                let Some(name) = key.split('.').nth(1) else {
                    continue;
                };
                let recorded = RecordedResource {
                    resource_type: resource.resource_type,
                    name: name.to_string(),
                    id: resource.primary.id,
                    attributes: resource.primary.attributes.into_iter().collect(),
                };
                state.insert(recorded);
            }
        }

        for resource in raw.resources {
            if resource.mode.as_deref().is_some_and(|mode| mode != "managed") {
                continue;
            }
            for instance in resource.instances {
                let attributes: BTreeMap<String, String> = instance
                    .attributes
                    .iter()
                    .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
                    .collect();
                let recorded = RecordedResource {
                    resource_type: resource.resource_type.clone(),
                    name: resource.name.clone(),
                    id: attributes.get("id").cloned().unwrap_or_default(),
                    attributes,
                };
                state.insert(recorded);
            }
        }

        Ok(state)
    }

    /// Load a state file. A missing file is an empty state; a malformed one
    /// is reported and treated as empty.
    pub fn load(path: &Path) -> Self {
        if !path.is_file() {
            debug!("No state file at {:?}", path);
            return Self::empty();
        }

        let parsed = fs::read_to_string(path)
            .map_err(CoreError::from)
            .and_then(|content| Self::parse(&content));
        match parsed {
            Ok(state) => {
                info!("Loaded {} resource(s) from state {:?}", state.len(), path);
                state
            }
            Err(e) => {
                warn!("Ignoring state file {:?}: {}", path, e);
                Self::empty()
            }
        }
    }

    pub fn with_resource(mut self, resource: RecordedResource) -> Self {
        self.insert(resource);
        self
    }

    pub fn insert(&mut self, resource: RecordedResource) {
        let key = (resource.resource_type.clone(), resource.name.clone());
        self.resources.insert(key, resource);
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&RecordedResource> {
        self.resources
            .get(&(resource_type.to_string(), name.to_string()))
    }

    /// Whether a resource with this type and local name is recorded.
    pub fn exists(&self, resource_type: &str, name: &str) -> bool {
        self.get(resource_type, name).is_some()
    }

    /// Like [`exists`](Self::exists), but the recorded entry must also pass
    /// `check`.
    pub fn exists_with<F>(&self, resource_type: &str, name: &str, check: F) -> bool
    where
        F: Fn(&RecordedResource) -> bool,
    {
        self.get(resource_type, name).is_some_and(check)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LEGACY: &str = r#"{
  "version": 3,
  "terraform_version": "0.9.11",
  "serial": 1,
  "modules": [
    {
      "path": ["root"],
      "outputs": {},
      "resources": {
        "aws_elasticache_cluster.cache": {
          "type": "aws_elasticache_cluster",
          "depends_on": [],
          "primary": {
            "id": "demo",
            "attributes": {
              "cluster_id": "demo",
              "node_type": "cache.m4.large"
            }
          }
        },
        "data.aws_ami.ubuntu": {
          "type": "aws_ami",
          "primary": {"id": "ami-1234", "attributes": {}}
        }
      }
    }
  ]
}"#;

    const CURRENT: &str = r#"{
  "version": 4,
  "resources": [
    {
      "mode": "managed",
      "type": "aws_db_instance",
      "name": "db",
      "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
      "instances": [
        {"schema_version": 1, "attributes": {"id": "db-abc", "identifier": "production", "port": 5432}}
      ]
    },
    {
      "mode": "data",
      "type": "aws_vpc",
      "name": "default",
      "instances": [{"attributes": {"id": "vpc-1"}}]
    }
  ]
}"#;

    #[test]
    fn test_parse_legacy_layout() {
        let state = DeploymentState::parse(LEGACY).unwrap();
        assert_eq!(state.len(), 1);
        assert!(state.exists("aws_elasticache_cluster", "cache"));
        assert!(!state.exists("aws_ami", "ubuntu"));

        let cache = state.get("aws_elasticache_cluster", "cache").unwrap();
        assert_eq!(cache.id, "demo");
        assert_eq!(cache.attribute("node_type"), Some("cache.m4.large"));
    }

    #[test]
    fn test_parse_current_layout() {
        let state = DeploymentState::parse(CURRENT).unwrap();
        assert_eq!(state.len(), 1);
        let db = state.get("aws_db_instance", "db").unwrap();
        assert_eq!(db.id, "db-abc");
        assert_eq!(db.attribute("identifier"), Some("production"));
        assert_eq!(db.attribute("port"), Some("5432"));
        assert!(!state.exists("aws_vpc", "default"));
    }

    #[test]
    fn test_exists_with_identity_check() {
        let state = DeploymentState::parse(LEGACY).unwrap();
        assert!(state.exists_with("aws_elasticache_cluster", "cache", |r| {
            r.attribute("cluster_id") == Some("demo")
        }));
        assert!(!state.exists_with("aws_elasticache_cluster", "cache", |r| {
            r.attribute("cluster_id") == Some("renamed")
        }));
        assert!(!state.exists_with("aws_elasticache_cluster", "other", |_| true));
    }

    #[test]
    fn test_malformed_state_is_parse_error() {
        let err = DeploymentState::parse("{ not json").unwrap_err();
        assert!(matches!(err, CoreError::StateParse(_)));
    }

    #[test]
    fn test_load_degrades_to_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("terraform.tfstate");

        assert!(DeploymentState::load(&path).is_empty());

        std::fs::write(&path, "[1, 2").unwrap();
        assert!(DeploymentState::load(&path).is_empty());

        std::fs::write(&path, LEGACY).unwrap();
        assert_eq!(DeploymentState::load(&path).len(), 1);
    }
}
