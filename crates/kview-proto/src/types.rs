//! Workload object types for the cluster snapshot schema.
//!
//! Field names mirror the publisher's JSON exactly. Child collections on a
//! [`NamespaceView`] are `Option<Vec<_>>`: `None` means the publisher did not
//! report that collection in this update, while `Some(vec![])` means it was
//! reported and is empty. The two are never conflated.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single namespace and the workload objects reported for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceView {
    /// Namespace name, unique within a snapshot.
    pub name: String,
    /// Creation timestamp as published (ISO-8601 text).
    pub created_at: String,
    /// Opaque identifier, stable across snapshots for the same namespace.
    pub unique_id: String,
    /// Pods in this namespace, if reported.
    #[serde(default)]
    pub pods: Option<Vec<Pod>>,
    /// Deployments in this namespace, if reported.
    #[serde(default)]
    pub deployments: Option<Vec<Deployment>>,
    /// Services in this namespace, if reported.
    #[serde(default)]
    pub services: Option<Vec<Service>>,
    /// Secrets in this namespace, if reported. Absent in older payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<Secret>>,
    /// Config maps in this namespace, if reported. Absent in older payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_maps: Option<Vec<ConfigMap>>,
}

/// A pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pod {
    /// Pod name.
    pub name: String,
    /// Lifecycle phase (e.g. "Running", "Pending").
    pub status: String,
    /// Creation timestamp as published.
    pub created_at: String,
    /// Opaque identifier, unique within the parent collection.
    pub unique_id: String,
    /// Node the pod is scheduled on.
    pub node_name: String,
    /// Pod IP address.
    pub ip: String,
}

/// A deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment name.
    pub name: String,
    /// Rollout status.
    pub status: String,
    /// Creation timestamp as published.
    pub created_at: String,
    /// Opaque identifier, unique within the parent collection.
    pub unique_id: String,
    /// Label selector map. The publisher may send `null` for no labels.
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: HashMap<String, String>,
}

/// A service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service name.
    pub name: String,
    /// Service kind (wire field `type`, e.g. "ClusterIP", "NodePort").
    #[serde(rename = "type")]
    pub kind: String,
    /// Creation timestamp as published.
    pub created_at: String,
    /// Opaque identifier, unique within the parent collection.
    pub unique_id: String,
}

/// A secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// Secret name.
    pub name: String,
    /// Secret kind (wire field `type`, e.g. "Opaque").
    #[serde(rename = "type")]
    pub kind: String,
    /// Creation timestamp as published.
    pub created_at: String,
    /// Opaque identifier, unique within the parent collection.
    pub unique_id: String,
    /// Secret payload. The publisher may send `null` for no entries.
    #[serde(default, deserialize_with = "null_as_default")]
    pub secret_map: HashMap<String, String>,
}

/// A config map. The publisher reports only the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMap {
    /// Config map name.
    pub name: String,
}

/// Parse a published `created_at` value.
///
/// The publisher is loose about timestamp formatting: current payloads carry
/// RFC 3339 text, older ones carry Go's default rendering
/// (`2021-07-01 00:00:00 +0000 UTC`). Returns `None` for anything else.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }
    // Go wire format, with the trailing zone name stripped.
    let trimmed = text.trim_end_matches(" UTC");
    DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
