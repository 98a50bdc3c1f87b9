use std::fmt::{Display, Formatter};

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

use crate::api::query::{FilterOperator, OrderDirection, Query};
use crate::error::{invalid_argument, StoreResult};
use crate::model::{DocumentKey, ResourcePath};
use crate::value::Value;

/// Pure path handle for a collection. Carries no store state; the canonical
/// path string is the only identity that matters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectionReference {
    path: ResourcePath,
}

impl CollectionReference {
    pub fn new(path: ResourcePath) -> StoreResult<Self> {
        if path.is_empty() || path.len() % 2 == 0 {
            return Err(invalid_argument(
                "Collection references must point to a collection (odd number of segments)",
            ));
        }
        Ok(Self { path })
    }

    pub fn from_string(path: &str) -> StoreResult<Self> {
        Self::new(ResourcePath::from_string(path)?)
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// The last segment of the collection path.
    pub fn id(&self) -> &str {
        self.path
            .last_segment()
            .expect("Collection path always has an id")
    }

    /// Returns the document that logically contains this collection, if any.
    pub fn parent(&self) -> Option<DocumentReference> {
        self.path.pop_last().and_then(|parent_path| {
            if parent_path.is_empty() {
                return None;
            }
            DocumentReference::new(parent_path).ok()
        })
    }

    /// Returns a reference to the document identified by `document_id`.
    ///
    /// When `document_id` is `None`, a fresh auto-ID is generated.
    pub fn doc(&self, document_id: Option<&str>) -> StoreResult<DocumentReference> {
        let id = document_id
            .map(|id| id.to_string())
            .unwrap_or_else(generate_auto_id);
        if id.is_empty() || id.contains('/') {
            return Err(invalid_argument("Document ID must be a single segment"));
        }
        DocumentReference::new(self.path.child([id]))
    }

    /// Creates a query rooted at this collection.
    pub fn query(&self) -> Query {
        Query::new(self.path.clone())
    }

    /// Shorthand for `query().where_field(..)`.
    pub fn where_field(
        &self,
        field: impl Into<String>,
        op: FilterOperator,
        operand: impl Into<Value>,
    ) -> Query {
        self.query().where_field(field, op, operand)
    }

    /// Shorthand for `query().order_by(..)`.
    pub fn order_by(&self, field: impl Into<String>, direction: OrderDirection) -> Query {
        self.query().order_by(field, direction)
    }
}

impl Display for CollectionReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "CollectionReference({})", self.path.canonical_string())
    }
}

/// Pure path handle for a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentReference {
    key: DocumentKey,
}

impl DocumentReference {
    pub fn new(path: ResourcePath) -> StoreResult<Self> {
        let key = DocumentKey::from_path(path)?;
        Ok(Self { key })
    }

    pub fn from_string(path: &str) -> StoreResult<Self> {
        Ok(Self {
            key: DocumentKey::from_string(path)?,
        })
    }

    /// The document identifier (the last segment of its path).
    pub fn id(&self) -> &str {
        self.key.id()
    }

    pub fn path(&self) -> &ResourcePath {
        self.key.path()
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// The parent collection containing this document.
    pub fn parent(&self) -> CollectionReference {
        CollectionReference::new(self.key.collection_path())
            .expect("Document parent path is always a collection")
    }

    /// Returns a sub-collection rooted at this document.
    pub fn collection(&self, id: &str) -> StoreResult<CollectionReference> {
        if id.is_empty() || id.contains('/') {
            return Err(invalid_argument("Collection ID must be a single segment"));
        }
        CollectionReference::new(self.key.path().child([id]))
    }
}

impl Display for DocumentReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentReference({})", self.key.path().canonical_string())
    }
}

fn generate_auto_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(20)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_and_document_roundtrip() {
        let collection = CollectionReference::from_string("channels").unwrap();
        assert_eq!(collection.id(), "channels");
        let document = collection.doc(Some("C1")).unwrap();
        assert_eq!(document.id(), "C1");
        assert_eq!(document.parent().id(), "channels");
    }

    #[test]
    fn sub_collection_path_string() {
        let collection = CollectionReference::from_string("channels").unwrap();
        let messages = collection
            .doc(Some("C1"))
            .unwrap()
            .collection("messages")
            .unwrap();
        assert_eq!(
            messages.path().canonical_string(),
            "channels/C1/messages"
        );
        assert_eq!(messages.parent().unwrap().id(), "C1");
    }

    #[test]
    fn auto_id_generation() {
        let collection = CollectionReference::from_string("channels").unwrap();
        let document = collection.doc(None).unwrap();
        assert_eq!(document.id().len(), 20);
        assert_eq!(document.parent().id(), "channels");
    }

    #[test]
    fn rejects_slash_in_document_id() {
        let collection = CollectionReference::from_string("channels").unwrap();
        let err = collection.doc(Some("a/b")).unwrap_err();
        assert_eq!(err.code_str(), "docstore/invalid-argument");
    }

    #[test]
    fn rejects_document_path_as_collection() {
        let err = CollectionReference::from_string("channels/C1").unwrap_err();
        assert_eq!(err.code_str(), "docstore/invalid-argument");
    }

    #[test]
    fn root_collection_has_no_parent() {
        let collection = CollectionReference::from_string("channels").unwrap();
        assert!(collection.parent().is_none());
    }
}
