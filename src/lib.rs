//! In-memory stand-in for a cloud document database.
//!
//! The emulator reproduces the query semantics, cross-type ordering rules,
//! and per-collection write-conflict behavior of the hosted backend closely
//! enough that higher layers can run their tests against either one: build
//! chained filter/order queries, subscribe for push-on-change snapshots, and
//! submit atomic per-collection write batches with placeholder resolution
//! (field deletion, server timestamp).
//!
//! ```no_run
//! use docstore_emulator::{FilterOperator, OrderDirection, StubStore};
//! use docstore_emulator::value::fields_from_json;
//! use serde_json::json;
//!
//! # async fn demo() -> docstore_emulator::StoreResult<()> {
//! let store = StubStore::new();
//! let channels = store.collection("channels")?;
//! let query = channels
//!     .where_field("public", FilterOperator::EqualTo, true)
//!     .order_by("name", OrderDirection::Ascending);
//! let mut subscription = store.subscribe_query(&query);
//!
//! let general = channels.doc(Some("C1"))?;
//! store
//!     .write(|batch| {
//!         batch.set(&general, fields_from_json(json!({
//!             "name": "general",
//!             "public": true,
//!         }))?)?;
//!         Ok(())
//!     })
//!     .await?;
//!
//! let snapshot = subscription.next_snapshot().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod model;
pub mod value;

mod local;
mod query_evaluator;

pub use api::{
    CollectionReference, DataStore, Document, DocumentReference, DocumentSubscription,
    FilterOperator, OrderDirection, Query, QuerySubscription, StubStore, WriteBatch,
};
pub use error::{StoreError, StoreErrorCode, StoreResult};
pub use model::{DocumentKey, ResourcePath, Timestamp};
pub use value::{FieldMap, Value};
