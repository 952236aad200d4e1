//! Connection configuration handling
//!
//! A scenario's configuration is resolved in two layers: the built-in
//! defaults, then the scenario file's `defaults` section, then the scenario's
//! own `configuration` overrides. Each of the seven documented keys falls back
//! to the layer below only when the layer above leaves it unset. Keys outside
//! the documented set are carried along untouched in `extra`.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

/// Pass-through key selecting a custom endpoint URL
pub const ENDPOINT_KEY: &str = "endpoint";

/// Endpoint value selecting the in-memory connector
pub const MEMORY_ENDPOINT: &str = "memory://";

/// Optional configuration values as written in the scenario file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ConfigOverrides {
    /// Access key
    pub access: Option<String>,
    /// Secret key
    pub secret: Option<String>,
    /// Bucket region
    pub region: Option<String>,
    /// Bucket name
    pub bucket: Option<String>,
    /// Signature method ("v4" or "v2")
    pub signature: Option<String>,
    /// Use the dual-stack (IPv4 + IPv6) endpoint
    pub dualstack: Option<bool>,
    /// Use legacy path-style access instead of virtual hosting
    pub path_access: Option<bool>,
    /// Anything else, passed through unvalidated
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Fully resolved configuration shared by every entry point of a scenario
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResolvedConfiguration {
    pub access: String,
    pub secret: String,
    pub region: String,
    pub bucket: String,
    pub signature: String,
    pub dualstack: bool,
    pub path_access: bool,
    #[serde(flatten)]
    pub extra: Mapping,
}

impl Default for ResolvedConfiguration {
    fn default() -> Self {
        Self {
            access: String::new(),
            secret: String::new(),
            region: default_region(),
            bucket: String::new(),
            signature: default_signature(),
            dualstack: false,
            path_access: false,
            extra: Mapping::new(),
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_signature() -> String {
    "v4".to_string()
}

impl ResolvedConfiguration {
    /// Layer `overrides` on top of this configuration
    ///
    /// Keys present in `overrides` win verbatim; absent keys keep the value
    /// already held here.
    pub fn merged_with(&self, overrides: &ConfigOverrides) -> Self {
        let mut extra = self.extra.clone();
        for (key, value) in &overrides.extra {
            extra.insert(key.clone(), value.clone());
        }

        Self {
            access: pick(&overrides.access, &self.access),
            secret: pick(&overrides.secret, &self.secret),
            region: pick(&overrides.region, &self.region),
            bucket: pick(&overrides.bucket, &self.bucket),
            signature: pick(&overrides.signature, &self.signature),
            dualstack: overrides.dualstack.unwrap_or(self.dualstack),
            path_access: overrides.path_access.unwrap_or(self.path_access),
            extra,
        }
    }

    /// Look up a pass-through value by key
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Look up a pass-through string value by key
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra(key).and_then(Value::as_str)
    }

    /// Custom endpoint URL, if one was configured
    pub fn endpoint(&self) -> Option<&str> {
        self.extra_str(ENDPOINT_KEY).filter(|e| !e.is_empty())
    }

    /// Whether the scenario targets the in-memory connector
    pub fn uses_memory_endpoint(&self) -> bool {
        self.endpoint() == Some(MEMORY_ENDPOINT)
    }
}

fn pick(value: &Option<String>, fallback: &str) -> String {
    value.clone().unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides(yaml: &str) -> ConfigOverrides {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_absent_keys_keep_defaults() {
        let base = ResolvedConfiguration::default().merged_with(&overrides(
            "access: AK\nsecret: SK\nbucket: defaults-bucket\n",
        ));
        let resolved = base.merged_with(&ConfigOverrides::default());
        assert_eq!(resolved, base);
        assert_eq!(resolved.region, "us-east-1");
        assert_eq!(resolved.signature, "v4");
    }

    #[test]
    fn test_present_keys_override_exactly() {
        let base = ResolvedConfiguration::default();
        let resolved = base.merged_with(&overrides(
            "access: A\nsecret: S\nregion: eu-west-1\nbucket: b\nsignature: v2\ndualstack: true\npath_access: true\n",
        ));
        assert_eq!(resolved.access, "A");
        assert_eq!(resolved.secret, "S");
        assert_eq!(resolved.region, "eu-west-1");
        assert_eq!(resolved.bucket, "b");
        assert_eq!(resolved.signature, "v2");
        assert!(resolved.dualstack);
        assert!(resolved.path_access);
    }

    #[test]
    fn test_explicit_false_overrides_true_default() {
        let base = ResolvedConfiguration::default().merged_with(&overrides("path_access: true\n"));
        let resolved = base.merged_with(&overrides("path_access: false\n"));
        assert!(!resolved.path_access);
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let base = ResolvedConfiguration::default()
            .merged_with(&overrides("endpoint: https://a.example\ncolour: blue\n"));
        let resolved = base.merged_with(&overrides("endpoint: memory://\nretries: 3\n"));
        assert_eq!(resolved.endpoint(), Some(MEMORY_ENDPOINT));
        assert!(resolved.uses_memory_endpoint());
        assert_eq!(resolved.extra_str("colour"), Some("blue"));
        assert_eq!(resolved.extra("retries").and_then(Value::as_u64), Some(3));
    }

    #[test]
    fn test_empty_endpoint_is_ignored() {
        let resolved = ResolvedConfiguration::default().merged_with(&overrides("endpoint: ''\n"));
        assert_eq!(resolved.endpoint(), None);
    }
}
