use std::collections::HashMap;

use crate::api::reference::DocumentReference;
use crate::error::{resource_exhausted, StoreResult};
use crate::value::FieldMap;

const MAX_BATCH_ACTIONS: usize = 500;

/// One pending mutation, addressed by document id within its group's
/// collection.
#[derive(Clone, Debug)]
pub(crate) enum WriteAction {
    /// Replaces the document with exactly `data`.
    Set { document_id: String, data: FieldMap },
    /// Overwrites the given keys of an existing document.
    Update {
        document_id: String,
        fields: FieldMap,
    },
    /// Like `Update`, but creates the document when absent.
    Merge {
        document_id: String,
        fields: FieldMap,
    },
    /// Removes the document outright.
    Delete { document_id: String },
}

/// Ordered batch of write actions, committed as one submission.
///
/// Actions are applied grouped by owning collection; each group is an atomic
/// transition over that collection's state. Groups are applied in the order
/// their collections first appear in the batch.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    actions: Vec<(String, WriteAction)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a full replacement of the referenced document.
    pub fn set(&mut self, reference: &DocumentReference, data: FieldMap) -> StoreResult<&mut Self> {
        let document_id = reference.id().to_string();
        self.push(reference, WriteAction::Set { document_id, data })?;
        Ok(self)
    }

    /// Queues a partial update; fails at commit time when the document does
    /// not exist.
    pub fn update(
        &mut self,
        reference: &DocumentReference,
        fields: FieldMap,
    ) -> StoreResult<&mut Self> {
        let document_id = reference.id().to_string();
        self.push(reference, WriteAction::Update {
            document_id,
            fields,
        })?;
        Ok(self)
    }

    /// Queues a merge: shallow-overwrites when the document exists, creates
    /// it otherwise.
    pub fn merge(
        &mut self,
        reference: &DocumentReference,
        fields: FieldMap,
    ) -> StoreResult<&mut Self> {
        let document_id = reference.id().to_string();
        self.push(reference, WriteAction::Merge {
            document_id,
            fields,
        })?;
        Ok(self)
    }

    /// Queues an unconditional deletion.
    pub fn delete(&mut self, reference: &DocumentReference) -> StoreResult<&mut Self> {
        let document_id = reference.id().to_string();
        self.push(reference, WriteAction::Delete { document_id })?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    fn push(&mut self, reference: &DocumentReference, action: WriteAction) -> StoreResult<()> {
        if self.actions.len() >= MAX_BATCH_ACTIONS {
            return Err(resource_exhausted(format!(
                "WriteBatch cannot contain more than {MAX_BATCH_ACTIONS} actions"
            )));
        }
        let collection_path = reference.parent().path().canonical_string();
        self.actions.push((collection_path, action));
        Ok(())
    }

    /// Splits the batch into per-collection groups, preserving submission
    /// order within each group and first-seen order across groups.
    pub(crate) fn into_groups(self) -> Vec<(String, Vec<WriteAction>)> {
        let mut groups: Vec<(String, Vec<WriteAction>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (collection_path, action) in self.actions {
            match index.get(&collection_path) {
                Some(&position) => groups[position].1.push(action),
                None => {
                    index.insert(collection_path.clone(), groups.len());
                    groups.push((collection_path, vec![action]));
                }
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::reference::CollectionReference;
    use crate::value::fields_from_json;
    use serde_json::json;

    fn doc(path: &str) -> DocumentReference {
        DocumentReference::from_string(path).unwrap()
    }

    #[test]
    fn groups_by_collection_in_first_seen_order() {
        let mut batch = WriteBatch::new();
        batch
            .set(&doc("channels/C1"), FieldMap::new())
            .unwrap()
            .set(&doc("users/U1"), FieldMap::new())
            .unwrap()
            .delete(&doc("channels/C2"))
            .unwrap();

        let groups = batch.into_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "channels");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "users");
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn preserves_order_within_a_group() {
        let mut batch = WriteBatch::new();
        batch
            .set(
                &doc("channels/C1"),
                fields_from_json(json!({"step": 1})).unwrap(),
            )
            .unwrap()
            .merge(
                &doc("channels/C1"),
                fields_from_json(json!({"step": 2})).unwrap(),
            )
            .unwrap();

        let groups = batch.into_groups();
        assert!(matches!(groups[0].1[0], WriteAction::Set { .. }));
        assert!(matches!(groups[0].1[1], WriteAction::Merge { .. }));
    }

    #[test]
    fn enforces_the_capacity_limit() {
        let collection = CollectionReference::from_string("channels").unwrap();
        let mut batch = WriteBatch::new();
        for index in 0..MAX_BATCH_ACTIONS {
            let reference = collection.doc(Some(&format!("D{index}"))).unwrap();
            batch.delete(&reference).unwrap();
        }
        let overflow = collection.doc(Some("overflow")).unwrap();
        let err = batch.delete(&overflow).unwrap_err();
        assert_eq!(err.code_str(), "docstore/resource-exhausted");
    }
}
