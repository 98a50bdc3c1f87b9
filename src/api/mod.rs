mod database;
pub(crate) mod query;
mod reference;
pub(crate) mod snapshot;
mod subscription;
pub(crate) mod write_batch;

pub use database::{DataStore, StubStore};
pub use query::{FilterOperator, OrderDirection, Query};
pub use reference::{CollectionReference, DocumentReference};
pub use snapshot::Document;
pub use subscription::{DocumentSubscription, QuerySubscription};
pub use write_batch::WriteBatch;
