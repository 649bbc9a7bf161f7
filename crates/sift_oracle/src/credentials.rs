//! AWS transport configuration.

use serde::{Deserialize, Serialize};

/// Credentials and region used to reach the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsCredentials {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub profile: Option<String>,
    pub shared_credentials_file: Option<String>,
    pub region: Option<String>,
}

impl AwsCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static_keys(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_shared_credentials_file(mut self, path: impl Into<String>) -> Self {
        self.shared_credentials_file = Some(path.into());
        self
    }

    /// Fill every unset field from `fallback`.
    pub fn or(self, fallback: AwsCredentials) -> Self {
        Self {
            access_key: self.access_key.or(fallback.access_key),
            secret_key: self.secret_key.or(fallback.secret_key),
            profile: self.profile.or(fallback.profile),
            shared_credentials_file: self
                .shared_credentials_file
                .or(fallback.shared_credentials_file),
            region: self.region.or(fallback.region),
        }
    }

    pub fn has_static_keys(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }

    /// Environment variables handed to the AWS CLI.
    pub fn environment(&self) -> Vec<(&'static str, String)> {
        let mut env = Vec::new();
        if let (Some(access_key), Some(secret_key)) = (&self.access_key, &self.secret_key) {
            env.push(("AWS_ACCESS_KEY_ID", access_key.clone()));
            env.push(("AWS_SECRET_ACCESS_KEY", secret_key.clone()));
        }
        if let Some(path) = &self.shared_credentials_file {
            env.push((
                "AWS_SHARED_CREDENTIALS_FILE",
                shellexpand::tilde(path).into_owned(),
            ));
        }
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_prefers_explicit_values() {
        let explicit = AwsCredentials::new().with_region("us-east-1");
        let provider = AwsCredentials::new()
            .with_region("eu-west-1")
            .with_profile("production");

        let merged = explicit.or(provider);
        assert_eq!(merged.region.as_deref(), Some("us-east-1"));
        assert_eq!(merged.profile.as_deref(), Some("production"));
    }

    #[test]
    fn test_environment_requires_both_keys() {
        let partial = AwsCredentials {
            access_key: Some("AKIA".to_string()),
            ..Default::default()
        };
        assert!(partial.environment().is_empty());
        assert!(!partial.has_static_keys());

        let full = AwsCredentials::new().with_static_keys("AKIA", "secret");
        let env = full.environment();
        assert_eq!(env.len(), 2);
        assert_eq!(env[0], ("AWS_ACCESS_KEY_ID", "AKIA".to_string()));
    }

    #[test]
    fn test_credentials_file_tilde_expanded() {
        let creds = AwsCredentials::new().with_shared_credentials_file("~/.aws/creds");
        let env = creds.environment();
        assert_eq!(env[0].0, "AWS_SHARED_CREDENTIALS_FILE");
        assert!(!env[0].1.starts_with('~'));
        assert!(env[0].1.ends_with(".aws/creds"));
    }

    #[test]
    fn test_deserialize_partial_yaml_like_json() {
        let creds: AwsCredentials = serde_json::from_str(r#"{"profile":"dev"}"#).unwrap();
        assert_eq!(creds.profile.as_deref(), Some("dev"));
        assert!(creds.region.is_none());
    }
}
