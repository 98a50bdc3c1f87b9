use crate::value::{FieldMap, Value};

/// Committed state of a single document: its identifier plus field mapping.
///
/// Query subscriptions emit full ordered sequences of these; document
/// subscriptions emit `Option<Document>` (absent documents are `None`).
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    id: String,
    fields: FieldMap,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Returns the named field, or `None` when absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_fields_by_name() {
        let mut fields = FieldMap::new();
        fields.insert("name".into(), Value::from_string("general"));
        let document = Document::new("C1", fields);
        assert_eq!(document.id(), "C1");
        assert_eq!(document.field("name"), Some(&Value::from_string("general")));
        assert_eq!(document.field("missing"), None);
    }
}
