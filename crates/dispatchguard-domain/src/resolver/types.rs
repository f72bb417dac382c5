//! Types for check resolution.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Per-request bookkeeping shared by every dispatch of one top-level check.
///
/// A single instance is created for the top-level request and shared through
/// `Arc` with every sub-request it spawns, so all counters are atomic.
#[derive(Debug, Default)]
pub struct RequestMetadata {
    /// Number of dispatches issued so far by the whole recursion tree.
    dispatch_counter: AtomicU32,
    /// Number of datastore queries issued so far.
    datastore_query_count: AtomicU32,
    /// Set once any stage has delayed this request.
    was_throttled: AtomicBool,
}

impl RequestMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current dispatch count. Other dispatches may be racing with this read.
    pub fn dispatch_count(&self) -> u32 {
        self.dispatch_counter.load(Ordering::Relaxed)
    }

    /// Records one more dispatch and returns the new count.
    pub fn increment_dispatch(&self) -> u32 {
        self.dispatch_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn datastore_query_count(&self) -> u32 {
        self.datastore_query_count.load(Ordering::Relaxed)
    }

    /// Adds `queries` to the datastore query count and returns the new total.
    pub fn add_datastore_queries(&self, queries: u32) -> u32 {
        self.datastore_query_count
            .fetch_add(queries, Ordering::Relaxed)
            + queries
    }

    pub fn was_throttled(&self) -> bool {
        self.was_throttled.load(Ordering::Relaxed)
    }

    /// Flags the request as throttled. Setting it again is harmless.
    pub fn mark_throttled(&self) {
        self.was_throttled.store(true, Ordering::Relaxed);
    }
}

/// An `object#relation@user` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleKey {
    /// The object identifier (e.g., "document:readme").
    pub object: String,
    /// The relation (e.g., "viewer").
    pub relation: String,
    /// The user identifier (e.g., "user:alice").
    pub user: String,
}

impl TupleKey {
    pub fn new(
        object: impl Into<String>,
        relation: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            object: object.into(),
            relation: relation.into(),
            user: user.into(),
        }
    }
}

/// Request handed from one resolver stage to the next.
#[derive(Debug, Clone)]
pub struct ResolveCheckRequest {
    /// The store ID to check against.
    pub store_id: String,
    /// Authorization model the check is evaluated under.
    pub authorization_model_id: String,
    /// The tuple being checked.
    pub tuple_key: TupleKey,
    /// Dispatch depth; 0 for the top-level request.
    pub depth: u32,
    /// Shared with every request dispatched from the same top-level check.
    pub request_metadata: Arc<RequestMetadata>,
}

impl ResolveCheckRequest {
    /// Creates a top-level request with fresh metadata.
    pub fn new(
        store_id: impl Into<String>,
        authorization_model_id: impl Into<String>,
        tuple_key: TupleKey,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            authorization_model_id: authorization_model_id.into(),
            tuple_key,
            depth: 0,
            request_metadata: Arc::new(RequestMetadata::new()),
        }
    }

    /// Uses `metadata` instead of the request's own.
    pub fn with_request_metadata(mut self, metadata: Arc<RequestMetadata>) -> Self {
        self.request_metadata = metadata;
        self
    }

    /// Builds the sub-request for one recursive dispatch.
    ///
    /// The child shares this request's metadata, sits one level deeper, and the
    /// shared dispatch counter is incremented.
    pub fn dispatch(&self, tuple_key: TupleKey) -> Self {
        self.request_metadata.increment_dispatch();
        Self {
            store_id: self.store_id.clone(),
            authorization_model_id: self.authorization_model_id.clone(),
            tuple_key,
            depth: self.depth + 1,
            request_metadata: Arc::clone(&self.request_metadata),
        }
    }
}

/// Bookkeeping returned alongside a check result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionMetadata {
    /// Datastore queries issued while resolving this (sub-)check.
    pub datastore_query_count: u32,
    /// Whether resolution hit a cycle in the relation graph.
    pub cycle_detected: bool,
}

/// Result of a check produced by a resolver stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveCheckResponse {
    /// Whether the check is allowed.
    pub allowed: bool,
    pub resolution_metadata: ResolutionMetadata,
}

impl ResolveCheckResponse {
    pub fn allowed(allowed: bool) -> Self {
        Self {
            allowed,
            resolution_metadata: ResolutionMetadata::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ResolveCheckRequest {
        ResolveCheckRequest::new(
            "store1",
            "model1",
            TupleKey::new("document:readme", "viewer", "user:alice"),
        )
    }

    #[test]
    fn test_new_request_starts_with_clean_metadata() {
        let req = request();
        assert_eq!(req.depth, 0);
        assert_eq!(req.request_metadata.dispatch_count(), 0);
        assert_eq!(req.request_metadata.datastore_query_count(), 0);
        assert!(!req.request_metadata.was_throttled());
    }

    #[test]
    fn test_dispatch_shares_metadata_and_counts() {
        let parent = request();
        let child = parent.dispatch(TupleKey::new("folder:root", "viewer", "user:alice"));
        let grandchild = child.dispatch(TupleKey::new("folder:home", "viewer", "user:alice"));

        assert_eq!(child.depth, 1);
        assert_eq!(grandchild.depth, 2);
        assert!(Arc::ptr_eq(
            &parent.request_metadata,
            &grandchild.request_metadata
        ));
        assert_eq!(parent.request_metadata.dispatch_count(), 2);
        assert_eq!(grandchild.store_id, "store1");
        assert_eq!(grandchild.authorization_model_id, "model1");
    }

    #[test]
    fn test_throttled_flag_is_visible_through_every_dispatch() {
        let parent = request();
        let child = parent.dispatch(TupleKey::new("folder:root", "viewer", "user:alice"));

        child.request_metadata.mark_throttled();
        child.request_metadata.mark_throttled();

        assert!(parent.request_metadata.was_throttled());
    }

    #[test]
    fn test_datastore_queries_accumulate() {
        let metadata = RequestMetadata::new();
        assert_eq!(metadata.add_datastore_queries(3), 3);
        assert_eq!(metadata.add_datastore_queries(2), 5);
        assert_eq!(metadata.datastore_query_count(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dispatch_increments_are_not_lost() {
        let metadata = Arc::new(RequestMetadata::new());
        let tasks = 32;
        let per_task = 500;

        let handles: Vec<_> = (0..tasks)
            .map(|_| {
                let metadata = Arc::clone(&metadata);
                tokio::spawn(async move {
                    for _ in 0..per_task {
                        metadata.increment_dispatch();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(metadata.dispatch_count(), tasks * per_task);
    }
}
