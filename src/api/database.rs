use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::api::query::Query;
use crate::api::reference::{CollectionReference, DocumentReference};
use crate::api::snapshot::Document;
use crate::api::subscription::{DocumentSubscription, QuerySubscription};
use crate::api::write_batch::WriteBatch;
use crate::error::StoreResult;
use crate::local::collection::{CollectionState, DocumentTable};
use crate::model::Timestamp;
use crate::query_evaluator::QueryPlan;
use crate::value::FieldMap;

/// Abstract store contract shared by the in-memory emulator and any live
/// backend adapter, so higher layers can be tested against either.
///
/// Streams never carry errors: a failed write surfaces only through its
/// commit result, while affected subscriptions keep emitting the
/// last-committed state.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Resolves a collection path (root or nested, odd number of segments).
    fn collection(&self, path: &str) -> StoreResult<CollectionReference>;

    /// Live ordered snapshots of the documents matching `query`.
    fn observe_query(&self, query: &Query) -> BoxStream<'static, Vec<Document>>;

    /// Live state of one document; `None` while absent.
    fn observe_document(&self, reference: &DocumentReference)
        -> BoxStream<'static, Option<Document>>;

    /// Applies a write batch, grouped per collection; resolves with the
    /// first error, if any.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}

/// In-memory document store emulator.
///
/// Collections are created lazily on first reference to their path string
/// and live for the lifetime of the store. Handles are cheap clones sharing
/// one registry.
#[derive(Clone, Default)]
pub struct StubStore {
    inner: Arc<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    collections: StdMutex<HashMap<String, Arc<CollectionState>>>,
}

impl StubStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with the given collections, keyed by
    /// collection path string.
    pub fn with_collections<I>(collections: I) -> Self
    where
        I: IntoIterator<Item = (String, BTreeMap<String, FieldMap>)>,
    {
        let store = Self::new();
        {
            let mut registry = store
                .inner
                .collections
                .lock()
                .expect("collection registry lock poisoned");
            for (path, documents) in collections {
                let table: DocumentTable = documents.into_iter().collect();
                registry.insert(path.clone(), Arc::new(CollectionState::new(path, table)));
            }
        }
        store
    }

    /// Resolves a collection path, e.g. `"channels"` or
    /// `"channels/C1/messages"`.
    pub fn collection(&self, path: &str) -> StoreResult<CollectionReference> {
        CollectionReference::from_string(path)
    }

    /// Resolves a document path, e.g. `"channels/C1"`.
    pub fn doc(&self, path: &str) -> StoreResult<DocumentReference> {
        DocumentReference::from_string(path)
    }

    /// Subscribes to a query; the first emission is the complete current
    /// result.
    pub fn subscribe_query(&self, query: &Query) -> QuerySubscription {
        let state = self.collection_state(&query.collection_path().canonical_string());
        QuerySubscription::new(state.subscribe(), QueryPlan::for_query(query))
    }

    /// Subscribes to a single document's state.
    pub fn subscribe_document(&self, reference: &DocumentReference) -> DocumentSubscription {
        let state = self.collection_state(&reference.parent().path().canonical_string());
        DocumentSubscription::new(state.subscribe(), reference.id().to_string())
    }

    /// Builds and commits a write batch in one call.
    ///
    /// The builder may fail, in which case the whole write fails before any
    /// action is applied. Otherwise actions are grouped per collection and
    /// each group commits atomically; the write resolves with the first
    /// group error and later groups are not attempted.
    pub async fn write<F>(&self, build: F) -> StoreResult<()>
    where
        F: FnOnce(&mut WriteBatch) -> StoreResult<()>,
    {
        let mut batch = WriteBatch::new();
        build(&mut batch)?;
        self.commit_batch(batch).await
    }

    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    async fn commit_batch(&self, batch: WriteBatch) -> StoreResult<()> {
        for (collection_path, actions) in batch.into_groups() {
            let state = self.collection_state(&collection_path);
            state.apply(actions, Timestamp::now()).await?;
        }
        Ok(())
    }

    fn collection_state(&self, path: &str) -> Arc<CollectionState> {
        let mut registry = self
            .inner
            .collections
            .lock()
            .expect("collection registry lock poisoned");
        Arc::clone(registry.entry(path.to_string()).or_insert_with(|| {
            log::debug!("creating collection state for '{path}'");
            Arc::new(CollectionState::new(path.to_string(), DocumentTable::new()))
        }))
    }
}

impl Debug for StubStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubStore").finish()
    }
}

#[async_trait]
impl DataStore for StubStore {
    fn collection(&self, path: &str) -> StoreResult<CollectionReference> {
        StubStore::collection(self, path)
    }

    fn observe_query(&self, query: &Query) -> BoxStream<'static, Vec<Document>> {
        self.subscribe_query(query).boxed()
    }

    fn observe_document(
        &self,
        reference: &DocumentReference,
    ) -> BoxStream<'static, Option<Document>> {
        self.subscribe_document(reference).boxed()
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        self.commit_batch(batch).await
    }
}
