use std::sync::Arc;

use crate::model::ResourcePath;
use crate::value::Value;

/// Single-field predicate operators supported by `where_field`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    EqualTo,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

/// Immutable, chainable query over one collection.
///
/// A query is a persistently linked chain of nodes: the root names a
/// collection, and each `where_field`/`order_by` call wraps the previous
/// node in a new filter or order node without mutating it. Cloning a query
/// shares the chain.
#[derive(Clone, Debug)]
pub struct Query {
    node: Arc<QueryNode>,
}

#[derive(Debug)]
pub(crate) enum QueryNode {
    Collection {
        path: ResourcePath,
    },
    Filter {
        base: Arc<QueryNode>,
        field: String,
        op: FilterOperator,
        operand: Value,
    },
    Order {
        base: Arc<QueryNode>,
        field: String,
        direction: OrderDirection,
    },
}

impl Query {
    pub(crate) fn new(path: ResourcePath) -> Self {
        Self {
            node: Arc::new(QueryNode::Collection { path }),
        }
    }

    /// Returns a new query that additionally requires `field op operand`.
    ///
    /// All predicates in a chain are combined with logical AND.
    pub fn where_field(
        &self,
        field: impl Into<String>,
        op: FilterOperator,
        operand: impl Into<Value>,
    ) -> Query {
        Query {
            node: Arc::new(QueryNode::Filter {
                base: Arc::clone(&self.node),
                field: field.into(),
                op,
                operand: operand.into(),
            }),
        }
    }

    /// Returns a new query ordered by `field`.
    ///
    /// The newest order clause takes precedence; the wrapped query's order
    /// (or the default ascending document-id order) breaks ties.
    pub fn order_by(&self, field: impl Into<String>, direction: OrderDirection) -> Query {
        Query {
            node: Arc::new(QueryNode::Order {
                base: Arc::clone(&self.node),
                field: field.into(),
                direction,
            }),
        }
    }

    /// Path of the collection this query chain is rooted at.
    pub fn collection_path(&self) -> &ResourcePath {
        let mut node = self.node.as_ref();
        loop {
            match node {
                QueryNode::Collection { path } => return path,
                QueryNode::Filter { base, .. } => node = base.as_ref(),
                QueryNode::Order { base, .. } => node = base.as_ref(),
            }
        }
    }

    pub(crate) fn node(&self) -> &Arc<QueryNode> {
        &self.node
    }
}
