//! Request and response types for the container lifecycle facade.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RuntimeError;

/// Options for creating (not starting) a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContainerRequest {
    /// Image reference, e.g. `redis:latest`.
    pub image: String,
    /// Optional container name.
    #[serde(default)]
    pub name: Option<String>,
    /// Command override.
    #[serde(default)]
    pub command: Vec<String>,
    /// `KEY=value` environment entries.
    #[serde(default)]
    pub env: Vec<String>,
    /// Exposed ports (`"6379/tcp"` or `"6379"`) mapped to an optional host port.
    #[serde(default)]
    pub ports: BTreeMap<String, Option<u16>>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl CreateContainerRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    /// Reject requests the runtime would refuse anyway.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.image.trim().is_empty() {
            return Err(RuntimeError::InvalidRequest(
                "image is required to create a container".to_string(),
            ));
        }
        for key in self.ports.keys() {
            normalize_port(key)?;
        }
        Ok(())
    }

    /// Port bindings keyed by normalized `port/proto`.
    pub fn port_bindings(&self) -> Result<BTreeMap<String, Option<u16>>, RuntimeError> {
        self.ports
            .iter()
            .map(|(key, host)| Ok((normalize_port(key)?, *host)))
            .collect()
    }
}

/// Normalize `"80"` to `"80/tcp"` and validate `"80/udp"`-style keys.
fn normalize_port(key: &str) -> Result<String, RuntimeError> {
    let (port, proto) = match key.split_once('/') {
        Some((port, proto)) => (port, proto),
        None => (key, "tcp"),
    };

    let valid_port = port.parse::<u16>().map(|p| p != 0).unwrap_or(false);
    let valid_proto = matches!(proto, "tcp" | "udp" | "sctp");
    if !valid_port || !valid_proto {
        return Err(RuntimeError::InvalidRequest(format!(
            "invalid port specification '{key}'"
        )));
    }
    Ok(format!("{port}/{proto}"))
}

/// Handle to a created, not yet started container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHandle {
    pub id: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Point-in-time container state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub id: String,
    pub name: String,
    pub image: String,
    /// Runtime status string (`created`, `running`, `exited`, ...).
    pub status: String,
    pub running: bool,
    /// Creation options as reported by the runtime.
    pub config: Value,
    /// Network settings as reported by the runtime.
    pub network: Value,
}

/// Image summary as listed by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: String,
    pub repo_tags: Vec<String>,
    pub size: i64,
    /// Creation time, seconds since the epoch.
    pub created: i64,
}

/// One event from an image pull's progress stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullProgress {
    pub status: Option<String>,
    /// Layer id the event refers to.
    pub id: Option<String>,
    pub progress: Option<String>,
    /// Set when the runtime reports a terminal failure inside the stream.
    pub error: Option<String>,
}

impl PullProgress {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_image() {
        let err = CreateContainerRequest::new("  ").validate().unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidRequest(_)));
    }

    #[test]
    fn test_port_bindings_are_normalized() {
        let mut request = CreateContainerRequest::new("redis:latest");
        request.ports.insert("6379".to_string(), Some(16379));
        request.ports.insert("53/udp".to_string(), None);

        request.validate().unwrap();
        let bindings = request.port_bindings().unwrap();
        assert_eq!(bindings.get("6379/tcp"), Some(&Some(16379)));
        assert_eq!(bindings.get("53/udp"), Some(&None));
    }

    #[test]
    fn test_invalid_port_keys_rejected() {
        for key in ["http", "0", "80/icmp", "99999"] {
            let mut request = CreateContainerRequest::new("nginx");
            request.ports.insert(key.to_string(), None);
            assert!(request.validate().is_err(), "{key} should be rejected");
        }
    }

    #[test]
    fn test_create_request_from_minimal_json() {
        let request: CreateContainerRequest =
            serde_json::from_str(r#"{"image": "redis:latest"}"#).unwrap();
        assert_eq!(request, CreateContainerRequest::new("redis:latest"));
    }
}
