use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex as StdMutex;

use async_lock::Mutex;

use crate::api::write_batch::WriteAction;
use crate::error::{invalid_placeholder, not_found, StoreResult};
use crate::model::Timestamp;
use crate::value::{FieldMap, SentinelValue, Value, ValueKind};

/// Committed documents of one collection, keyed by document id.
pub(crate) type DocumentTable = BTreeMap<String, FieldMap>;

/// Authoritative state of a single collection plus its broadcast channel.
///
/// Writes commit eagerly under the table lock, so write-batches targeting the
/// same collection are serialized in arrival order and a write is never
/// dropped for lack of an observer. Every committed (or failed) group
/// publishes a full snapshot; new subscribers are seeded with the latest one.
pub(crate) struct CollectionState {
    path: String,
    documents: Mutex<DocumentTable>,
    broadcast: StdMutex<Broadcast>,
}

struct Broadcast {
    latest: DocumentTable,
    senders: Vec<async_channel::Sender<DocumentTable>>,
}

impl CollectionState {
    pub(crate) fn new(path: String, initial: DocumentTable) -> Self {
        Self {
            path,
            documents: Mutex::new(initial.clone()),
            broadcast: StdMutex::new(Broadcast {
                latest: initial,
                senders: Vec::new(),
            }),
        }
    }

    /// Registers a subscriber; the latest committed snapshot is delivered
    /// immediately, followed by every subsequent publication in commit order.
    pub(crate) fn subscribe(&self) -> async_channel::Receiver<DocumentTable> {
        let (sender, receiver) = async_channel::unbounded();
        let mut broadcast = self.broadcast.lock().expect("broadcast lock poisoned");
        let _ = sender.try_send(broadcast.latest.clone());
        broadcast.senders.push(sender);
        receiver
    }

    /// Applies one write group as a single atomic transition.
    ///
    /// On failure all of the group's changes are discarded and the previous
    /// snapshot is re-published, so subscribers observe no gap.
    pub(crate) async fn apply(&self, actions: Vec<WriteAction>, commit_time: Timestamp) -> StoreResult<()> {
        let mut documents = self.documents.lock().await;
        let mut next = documents.clone();

        let mut failure = None;
        for action in actions {
            if let Err(err) = apply_action(&mut next, &self.path, action, commit_time) {
                failure = Some(err);
                break;
            }
        }

        match failure {
            Some(err) => {
                log::debug!("write group for '{}' rejected: {err}", self.path);
                self.publish(documents.clone());
                Err(err)
            }
            None => {
                *documents = next.clone();
                log::debug!("committed write group for '{}' ({} documents)", self.path, next.len());
                self.publish(next);
                Ok(())
            }
        }
    }

    fn publish(&self, snapshot: DocumentTable) {
        let mut broadcast = self.broadcast.lock().expect("broadcast lock poisoned");
        broadcast.latest = snapshot.clone();
        let before = broadcast.senders.len();
        broadcast
            .senders
            .retain(|sender| sender.try_send(snapshot.clone()).is_ok());
        let dropped = before - broadcast.senders.len();
        if dropped > 0 {
            log::debug!("pruned {dropped} detached subscribers from '{}'", self.path);
        }
    }
}

fn apply_action(
    table: &mut DocumentTable,
    collection_path: &str,
    action: WriteAction,
    commit_time: Timestamp,
) -> StoreResult<()> {
    match action {
        WriteAction::Set { document_id, data } => {
            let (resolved, deletions) = resolve_placeholders(data, commit_time);
            if !deletions.is_empty() {
                return Err(delete_placeholder_error("set", &deletions));
            }
            table.insert(document_id, resolved);
        }
        WriteAction::Update {
            document_id,
            fields,
        } => {
            let (resolved, deletions) = resolve_placeholders(fields, commit_time);
            match table.get_mut(&document_id) {
                Some(existing) => {
                    for key in &deletions {
                        existing.remove(key);
                    }
                    existing.extend(resolved);
                }
                None => {
                    return Err(not_found(format!(
                        "No document to update: {collection_path}/{document_id}"
                    )));
                }
            }
        }
        WriteAction::Merge {
            document_id,
            fields,
        } => {
            let (resolved, deletions) = resolve_placeholders(fields, commit_time);
            if !deletions.is_empty() {
                return Err(delete_placeholder_error("merge", &deletions));
            }
            match table.get_mut(&document_id) {
                Some(existing) => existing.extend(resolved),
                None => {
                    table.insert(document_id, resolved);
                }
            }
        }
        WriteAction::Delete { document_id } => {
            table.remove(&document_id);
        }
    }
    Ok(())
}

/// Replaces sentinels in a pending field map: server-timestamp sentinels
/// resolve to `commit_time`, delete sentinels are split out by key for the
/// action to interpret.
fn resolve_placeholders(
    fields: FieldMap,
    commit_time: Timestamp,
) -> (FieldMap, BTreeSet<String>) {
    let mut resolved = FieldMap::new();
    let mut deletions = BTreeSet::new();
    for (key, value) in fields {
        match value.kind() {
            ValueKind::Sentinel(SentinelValue::DeleteField) => {
                deletions.insert(key);
            }
            ValueKind::Sentinel(SentinelValue::ServerTimestamp) => {
                resolved.insert(key, Value::from_timestamp(commit_time));
            }
            _ => {
                resolved.insert(key, value);
            }
        }
    }
    (resolved, deletions)
}

fn delete_placeholder_error(operation: &str, keys: &BTreeSet<String>) -> crate::error::StoreError {
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    invalid_placeholder(format!(
        "Delete sentinel cannot be used in a {operation} write (fields: {})",
        keys.join(", ")
    ))
}
