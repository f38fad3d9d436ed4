//! Authoritative snapshot store for presentation.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use kview_proto::ClusterSnapshot;

use crate::bus::HandlerId;
use crate::client::StreamClient;
use crate::events::{ClientEvent, EventCategory};

/// Whether the store has received its first snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// No snapshot yet; presentation should show a waiting indicator.
    Loading,
    /// At least one snapshot has been applied.
    Ready,
}

/// Owns the single authoritative [`ClusterSnapshot`] visible to presentation.
///
/// Each decoded frame replaces the held snapshot entirely; two payloads are
/// never merged. Once Ready, the store stays Ready through disconnects and
/// errors: stale-but-present data is preferred over blanking the view.
#[derive(Debug)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<ClusterSnapshot>>>,
    revision: watch::Sender<u64>,
}

impl SnapshotStore {
    /// Create an empty store in the Loading state.
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            current: RwLock::new(None),
            revision,
        }
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> StoreStatus {
        if self.current.read().is_some() {
            StoreStatus::Ready
        } else {
            StoreStatus::Loading
        }
    }

    /// The last applied snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<ClusterSnapshot>> {
        self.current.read().clone()
    }

    /// Replace the held snapshot wholesale and bump the revision.
    pub fn replace(&self, snapshot: Arc<ClusterSnapshot>) {
        *self.current.write() = Some(snapshot);
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Subscribe to revision changes for pull-based refresh.
    ///
    /// The receiver yields a monotonically increasing revision; readers call
    /// [`Self::snapshot`] after each change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Register this store's message handler on `client`.
    ///
    /// Returns the registration id so the store can later be detached with
    /// `client.off(EventCategory::Message, id)`.
    pub fn attach(self: &Arc<Self>, client: &StreamClient) -> HandlerId {
        let store = Arc::clone(self);
        client.on(EventCategory::Message, move |event| {
            if let ClientEvent::Message(snapshot) = event {
                store.replace(Arc::clone(snapshot));
            }
            Ok(())
        })
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kview_proto::NamespaceView;

    fn snapshot_with(names: &[&str]) -> Arc<ClusterSnapshot> {
        let namespaces = names
            .iter()
            .enumerate()
            .map(|(i, name)| NamespaceView {
                name: (*name).to_string(),
                created_at: "2021-07-01T00:00:00Z".to_string(),
                unique_id: format!("ns-{i}"),
                pods: None,
                deployments: None,
                services: None,
                secrets: None,
                config_maps: None,
            })
            .collect();
        Arc::new(ClusterSnapshot { namespaces })
    }

    #[test]
    fn test_starts_loading_with_no_snapshot() {
        let store = SnapshotStore::new();
        assert_eq!(store.status(), StoreStatus::Loading);
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_replace_flips_to_ready() {
        let store = SnapshotStore::new();
        store.replace(snapshot_with(&["default"]));

        assert_eq!(store.status(), StoreStatus::Ready);
        assert!(store.snapshot().unwrap().namespace("default").is_some());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let store = SnapshotStore::new();
        store.replace(snapshot_with(&["default", "kube-system"]));
        store.replace(snapshot_with(&["prod"]));

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.namespace("default").is_none());
        assert!(snapshot.namespace("prod").is_some());
    }

    #[test]
    fn test_revision_bumps_on_each_replace() {
        let store = SnapshotStore::new();
        let rx = store.subscribe();
        assert_eq!(*rx.borrow(), 0);

        store.replace(snapshot_with(&["a"]));
        store.replace(snapshot_with(&["b"]));
        assert_eq!(*rx.borrow(), 2);
    }
}
