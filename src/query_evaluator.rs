use std::cmp::Ordering;

use crate::api::query::{FilterOperator, OrderDirection, Query, QueryNode};
use crate::api::snapshot::Document;
use crate::local::collection::DocumentTable;
use crate::value::{FieldMap, Value};

/// Flattened form of a query chain, ready to run against a document table.
///
/// Order keys are kept outermost-first: the newest `order_by` in the chain is
/// the primary sort key, and each wrapped clause only breaks ties, down to
/// the default ascending document-id order at the root.
#[derive(Clone, Debug)]
pub(crate) struct QueryPlan {
    filters: Vec<FieldFilter>,
    order_by: Vec<OrderKey>,
}

#[derive(Clone, Debug)]
struct FieldFilter {
    field: String,
    op: FilterOperator,
    operand: Value,
}

#[derive(Clone, Debug)]
struct OrderKey {
    field: String,
    direction: OrderDirection,
}

impl QueryPlan {
    pub(crate) fn for_query(query: &Query) -> Self {
        let mut filters = Vec::new();
        let mut order_by = Vec::new();

        let mut node = query.node().as_ref();
        loop {
            match node {
                QueryNode::Collection { .. } => break,
                QueryNode::Filter {
                    base,
                    field,
                    op,
                    operand,
                } => {
                    filters.push(FieldFilter {
                        field: field.clone(),
                        op: *op,
                        operand: operand.clone(),
                    });
                    node = base.as_ref();
                }
                QueryNode::Order {
                    base,
                    field,
                    direction,
                } => {
                    order_by.push(OrderKey {
                        field: field.clone(),
                        direction: *direction,
                    });
                    node = base.as_ref();
                }
            }
        }

        Self { filters, order_by }
    }

    /// Re-derives the full ordered result from the current table.
    ///
    /// Evaluation is not incremental: every call filters and sorts the whole
    /// document set and returns a complete snapshot.
    pub(crate) fn apply(&self, table: &DocumentTable) -> Vec<Document> {
        let mut result: Vec<Document> = table
            .iter()
            .filter(|(_, fields)| self.matches(fields))
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .collect();

        result.sort_by(|left, right| self.compare_documents(left, right));
        result
    }

    fn matches(&self, fields: &FieldMap) -> bool {
        self.filters.iter().all(|filter| {
            let null = Value::null();
            let value = fields.get(&filter.field).unwrap_or(&null);
            let ordering = value.compare(&filter.operand);
            match filter.op {
                FilterOperator::EqualTo => ordering == Ordering::Equal,
                FilterOperator::LessThan => ordering == Ordering::Less,
                FilterOperator::LessThanOrEqualTo => {
                    matches!(ordering, Ordering::Less | Ordering::Equal)
                }
                FilterOperator::GreaterThan => ordering == Ordering::Greater,
                FilterOperator::GreaterThanOrEqualTo => {
                    matches!(ordering, Ordering::Greater | Ordering::Equal)
                }
            }
        })
    }

    fn compare_documents(&self, left: &Document, right: &Document) -> Ordering {
        let null = Value::null();
        for key in &self.order_by {
            let left_value = left.field(&key.field).unwrap_or(&null);
            let right_value = right.field(&key.field).unwrap_or(&null);
            let mut ordering = left_value.compare(right_value);
            if key.direction == OrderDirection::Descending {
                ordering = ordering.reverse();
            }
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        left.id().cmp(right.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ResourcePath, Timestamp};
    use crate::value::fields_from_json;
    use serde_json::json;

    fn channels() -> Query {
        Query::new(ResourcePath::from_string("channels").unwrap())
    }

    fn table(entries: &[(&str, serde_json::Value)]) -> DocumentTable {
        entries
            .iter()
            .map(|(id, fields)| {
                (
                    id.to_string(),
                    fields_from_json(fields.clone()).unwrap(),
                )
            })
            .collect()
    }

    fn ids(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(Document::id).collect()
    }

    #[test]
    fn filters_are_combined_with_and() {
        let query = channels()
            .where_field("public", FilterOperator::EqualTo, true)
            .where_field("members", FilterOperator::GreaterThan, 2i64);
        let plan = QueryPlan::for_query(&query);

        let table = table(&[
            ("C1", json!({"public": true, "members": 5})),
            ("C2", json!({"public": true, "members": 1})),
            ("C3", json!({"public": false, "members": 9})),
        ]);

        assert_eq!(ids(&plan.apply(&table)), ["C1"]);
    }

    #[test]
    fn missing_field_is_filtered_as_null() {
        let query = channels().where_field("flag", FilterOperator::LessThan, 0i64);
        let plan = QueryPlan::for_query(&query);

        // null(0) < integer(1), so a document without the field matches "< 0".
        let table = table(&[("C1", json!({})), ("C2", json!({"flag": 1}))]);
        assert_eq!(ids(&plan.apply(&table)), ["C1"]);
    }

    #[test]
    fn default_order_is_ascending_document_id() {
        let plan = QueryPlan::for_query(&channels());
        let table = table(&[
            ("zulu", json!({})),
            ("alpha", json!({})),
            ("mike", json!({})),
        ]);
        assert_eq!(ids(&plan.apply(&table)), ["alpha", "mike", "zulu"]);
    }

    #[test]
    fn newest_order_clause_wins_and_older_breaks_ties() {
        let query = channels()
            .order_by("a", OrderDirection::Ascending)
            .order_by("b", OrderDirection::Ascending);
        let plan = QueryPlan::for_query(&query);

        let table = table(&[
            ("D1", json!({"a": 1, "b": 2})),
            ("D2", json!({"a": 2, "b": 1})),
            ("D3", json!({"a": 1, "b": 1})),
        ]);

        // b is primary (outermost clause), a breaks ties.
        assert_eq!(ids(&plan.apply(&table)), ["D3", "D2", "D1"]);
    }

    #[test]
    fn descending_order_reverses_within_the_field() {
        let query = channels().order_by("name", OrderDirection::Descending);
        let plan = QueryPlan::for_query(&query);

        let table = table(&[
            ("C1", json!({"name": "general"})),
            ("C2", json!({"name": "random"})),
        ]);
        assert_eq!(ids(&plan.apply(&table)), ["C2", "C1"]);
    }

    #[test]
    fn mixed_types_sort_by_type_rank() {
        let query = channels().order_by("v", OrderDirection::Ascending);
        let plan = QueryPlan::for_query(&query);

        let mut table = table(&[
            ("string", json!({"v": "text"})),
            ("int", json!({"v": 12})),
            ("bool", json!({"v": true})),
            ("double", json!({"v": 0.5})),
            ("missing", json!({})),
        ]);
        table.insert(
            "timestamp".into(),
            [(
                "v".to_string(),
                Value::from_timestamp(Timestamp::new(5, 0)),
            )]
            .into_iter()
            .collect(),
        );

        assert_eq!(
            ids(&plan.apply(&table)),
            ["missing", "int", "timestamp", "bool", "string", "double"]
        );
    }

    #[test]
    fn equality_across_types_never_matches() {
        let query = channels().where_field("v", FilterOperator::EqualTo, 1i64);
        let plan = QueryPlan::for_query(&query);

        let table = table(&[("C1", json!({"v": 1.0})), ("C2", json!({"v": 1}))]);
        assert_eq!(ids(&plan.apply(&table)), ["C2"]);
    }
}
