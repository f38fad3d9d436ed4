//! Snapshot frame encoding, decoding, and validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;
use crate::types::NamespaceView;

/// The complete set of namespace/workload data valid as of one frame.
///
/// A snapshot is always replaced wholesale: consumers never merge two frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterSnapshot {
    /// Namespaces in this snapshot, in publisher order.
    pub namespaces: Vec<NamespaceView>,
}

/// One decoded frame: either the current array schema or the earlier
/// single-namespace form, which the original publisher emits per namespace.
#[derive(Deserialize)]
#[serde(untagged)]
enum Frame {
    Full(Vec<NamespaceView>),
    Single(NamespaceView),
}

impl ClusterSnapshot {
    /// Create a snapshot from a list of namespaces.
    ///
    /// # Errors
    ///
    /// Returns an error if identifiers repeat within any collection.
    pub fn new(namespaces: Vec<NamespaceView>) -> Result<Self, ProtoError> {
        let snapshot = Self { namespaces };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Decode a single text frame into a validated snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not match the schema or fails
    /// identifier-uniqueness validation.
    pub fn from_frame(text: &str) -> Result<Self, ProtoError> {
        let frame: Frame =
            serde_json::from_str(text).map_err(|e| ProtoError::Decoding(e.to_string()))?;
        let snapshot = match frame {
            Frame::Full(namespaces) => Self { namespaces },
            Frame::Single(ns) => Self {
                namespaces: vec![ns],
            },
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Serialize the snapshot to its wire form.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Number of namespaces in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Whether the snapshot contains no namespaces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Look up a namespace by name.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&NamespaceView> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    /// Check identifier uniqueness within every collection.
    ///
    /// Namespace names and ids must be unique across the snapshot; each child
    /// collection's ids must be unique within that collection. Presentation
    /// keys off these ids for stable identity across re-renders.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::DuplicateId`] naming the offending collection.
    pub fn validate(&self) -> Result<(), ProtoError> {
        check_unique("namespaces", self.namespaces.iter().map(|ns| ns.unique_id.as_str()))?;
        check_unique("namespaces", self.namespaces.iter().map(|ns| ns.name.as_str()))?;

        for ns in &self.namespaces {
            let scope = |kind: &str| format!("{kind} of namespace `{}`", ns.name);
            if let Some(pods) = &ns.pods {
                check_unique(&scope("pods"), pods.iter().map(|p| p.unique_id.as_str()))?;
            }
            if let Some(deployments) = &ns.deployments {
                check_unique(
                    &scope("deployments"),
                    deployments.iter().map(|d| d.unique_id.as_str()),
                )?;
            }
            if let Some(services) = &ns.services {
                check_unique(&scope("services"), services.iter().map(|s| s.unique_id.as_str()))?;
            }
            if let Some(secrets) = &ns.secrets {
                check_unique(&scope("secrets"), secrets.iter().map(|s| s.unique_id.as_str()))?;
            }
            if let Some(config_maps) = &ns.config_maps {
                check_unique(&scope("config maps"), config_maps.iter().map(|c| c.name.as_str()))?;
            }
        }
        Ok(())
    }
}

fn check_unique<'a>(
    scope: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ProtoError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ProtoError::DuplicateId {
                scope: scope.to_string(),
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
