use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

use crate::api::snapshot::Document;
use crate::local::collection::DocumentTable;
use crate::query_evaluator::QueryPlan;

/// Live sequence of query snapshots.
///
/// Emits the full current result immediately on subscription, then a freshly
/// re-derived ordered sequence after every committed change to the underlying
/// collection. Dropping the subscription detaches it; the collection is
/// unaffected.
pub struct QuerySubscription {
    receiver: async_channel::Receiver<DocumentTable>,
    plan: QueryPlan,
}

impl QuerySubscription {
    pub(crate) fn new(receiver: async_channel::Receiver<DocumentTable>, plan: QueryPlan) -> Self {
        Self { receiver, plan }
    }

    /// Awaits the next snapshot; `None` once the collection is gone.
    pub async fn next_snapshot(&mut self) -> Option<Vec<Document>> {
        let table = self.receiver.recv().await.ok()?;
        Some(self.plan.apply(&table))
    }
}

impl Stream for QuerySubscription {
    type Item = Vec<Document>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll_next(cx) {
            Poll::Ready(Some(table)) => Poll::Ready(Some(this.plan.apply(&table))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Live sequence of one document's committed state; `None` items mean the
/// document is currently absent.
pub struct DocumentSubscription {
    receiver: async_channel::Receiver<DocumentTable>,
    document_id: String,
}

impl DocumentSubscription {
    pub(crate) fn new(
        receiver: async_channel::Receiver<DocumentTable>,
        document_id: String,
    ) -> Self {
        Self {
            receiver,
            document_id,
        }
    }

    pub async fn next_snapshot(&mut self) -> Option<Option<Document>> {
        let table = self.receiver.recv().await.ok()?;
        Some(self.project(&table))
    }

    fn project(&self, table: &DocumentTable) -> Option<Document> {
        table
            .get(&self.document_id)
            .map(|fields| Document::new(self.document_id.clone(), fields.clone()))
    }
}

impl Stream for DocumentSubscription {
    type Item = Option<Document>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll_next(cx) {
            Poll::Ready(Some(table)) => Poll::Ready(Some(this.project(&table))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
