use std::{cmp::Ordering, collections::HashMap, fs, path::Path};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::{
    output::json_to_value,
    query::{Condition, Direction, Filter, OrderBy, Query},
    statements::lower_first,
    value::Value,
};

use super::{FieldKind, RecordStore, Schema, StoreError};

/// JSON fixture file: `{ "schema": {...}, "data": { "customer": [ ... ] } }`.
#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    schema: Option<Schema>,
    #[serde(default)]
    data: serde_json::Map<String, serde_json::Value>,
}

/// Record store over rows held in memory.
///
/// Filters are evaluated with the interpreter's own comparison rules.
/// To-one relation paths are followed through embedded objects first, then
/// through schema foreign keys, then through the `<relation>Id` naming
/// convention.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    schema: Option<Schema>,
    data: HashMap<String, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Adds rows to a model, creating it if needed.
    pub fn insert(&mut self, model: &str, rows: impl IntoIterator<Item = Value>) {
        self.data
            .entry(lower_first(model))
            .or_default()
            .extend(rows);
    }

    pub fn from_fixture_str(text: &str) -> Result<Self, StoreError> {
        let fixture: Fixture = serde_json::from_str(text)?;
        let mut store = MemoryStore {
            schema: fixture.schema,
            data: HashMap::new(),
        };
        for (model, rows) in fixture.data {
            let serde_json::Value::Array(rows) = rows else {
                return Err(StoreError::InvalidRows(model));
            };
            let rows: Vec<Value> = rows.into_iter().map(json_to_value).collect();
            if rows.iter().any(|r| !matches!(r, Value::Object(_))) {
                return Err(StoreError::InvalidRows(model));
            }
            store.insert(&model, rows);
        }
        debug!(models = store.data.len(), "loaded fixture");
        Ok(store)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let text = fs::read_to_string(path)?;
        Self::from_fixture_str(&text)
    }

    fn rows(&self, model: &str) -> &[Value] {
        self.data
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(model))
            .map(|(_, rows)| rows.as_slice())
            .unwrap_or(&[])
    }

    fn matches(&self, model: &str, row: &Value, filter: &Filter) -> bool {
        match filter {
            Filter::And(items) => items.iter().all(|f| self.matches(model, row, f)),
            Filter::Or(items) => items.iter().any(|f| self.matches(model, row, f)),
            Filter::Condition(Condition {
                path,
                comparator,
                value,
            }) => comparator.matches(&self.resolve(model, row, path), value),
        }
    }

    /// Follows `path` from `row`. Missing segments yield null.
    fn resolve(&self, model: &str, row: &Value, path: &[String]) -> Value {
        let Some((head, rest)) = path.split_first() else {
            return row.clone();
        };
        let direct = field(row, head);
        if rest.is_empty() {
            return direct;
        }
        match direct {
            Value::Object(_) => {
                let next_model = self.related_model(model, head).unwrap_or(head.as_str());
                self.resolve(next_model, &direct, rest)
            }
            _ => match self.follow(model, row, head) {
                Some((next_model, related)) => self.resolve(&next_model, &related, rest),
                None => Value::Null,
            },
        }
    }

    fn related_model<'s>(&'s self, model: &str, relation: &str) -> Option<&'s str> {
        let schema = self.schema.as_ref()?;
        match &schema.model(model)?.field(relation)?.kind {
            FieldKind::Relation(rel) => Some(rel.model.as_str()),
            FieldKind::Scalar => None,
        }
    }

    /// Looks up the row a to-one relation points at.
    fn follow(&self, model: &str, row: &Value, relation: &str) -> Option<(String, Value)> {
        if let Some(schema) = &self.schema
            && let Some(FieldKind::Relation(rel)) =
                schema.model(model).and_then(|m| m.field(relation)).map(|f| &f.kind)
        {
            let related = if !rel.fields.is_empty() {
                // This row holds the key
                let keys: Vec<(String, Value)> = rel
                    .references
                    .iter()
                    .zip(&rel.fields)
                    .map(|(remote, local)| (remote.clone(), field(row, local)))
                    .collect();
                self.find_by(&rel.model, &keys)
            } else {
                // The related row holds the key
                let back = schema
                    .model(&rel.model)
                    .and_then(|m| m.relation_to(model))
                    .map(|(_, r)| r)?;
                let keys: Vec<(String, Value)> = back
                    .fields
                    .iter()
                    .zip(&back.references)
                    .map(|(remote, local)| (remote.clone(), field(row, local)))
                    .collect();
                self.find_by(&rel.model, &keys)
            };
            return related.map(|r| (rel.model.clone(), r));
        }

        let key = field(row, &format!("{}Id", relation));
        if key.is_null() {
            return None;
        }
        self.find_by(relation, &[("id".to_string(), key)])
            .map(|r| (relation.to_string(), r))
    }

    fn find_by(&self, model: &str, keys: &[(String, Value)]) -> Option<Value> {
        self.rows(model)
            .iter()
            .find(|r| keys.iter().all(|(k, v)| field(r, k).loose_equals(v)))
            .cloned()
    }

    fn compare_rows(&self, model: &str, a: &Value, b: &Value, order: &[OrderBy]) -> Ordering {
        for key in order {
            let left = self.resolve(model, a, &key.path);
            let right = self.resolve(model, b, &key.path);
            let ord = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => left.compare(&right).unwrap_or(Ordering::Equal),
            };
            let ord = match key.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

fn field(row: &Value, name: &str) -> Value {
    match row {
        Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

#[async_trait(?Send)]
impl RecordStore for MemoryStore {
    fn has_delegate(&self, delegate: &str) -> bool {
        self.data.keys().any(|k| k.eq_ignore_ascii_case(delegate))
            || self
                .schema
                .as_ref()
                .is_some_and(|s| s.model(delegate).is_some())
    }

    fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    async fn find_many(&self, delegate: &str, query: &Query) -> Result<Vec<Value>, StoreError> {
        if !self.has_delegate(delegate) {
            return Err(StoreError::UnknownModel(delegate.to_string()));
        }
        let mut rows: Vec<Value> = self
            .rows(delegate)
            .iter()
            .filter(|row| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|f| self.matches(delegate, row, f))
            })
            .cloned()
            .collect();
        if !query.order_by.is_empty() {
            // Stable: ties keep insertion order
            rows.sort_by(|a, b| self.compare_rows(delegate, a, b, &query.order_by));
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::query::Comparator;

    const FIXTURE: &str = r#"{
        "data": {
            "customer": [
                { "id": 1, "name": "Ann" },
                { "id": 2, "name": "Bob" }
            ],
            "order": [
                { "id": 10, "customerId": 2, "total": 5 },
                { "id": 11, "customerId": 1, "total": 50 },
                { "id": 12, "customerId": 2, "total": 20 }
            ]
        }
    }"#;

    #[test]
    fn test_filter_through_conventional_relation() {
        let store = MemoryStore::from_fixture_str(FIXTURE).unwrap();
        let query = Query {
            filter: Some(Filter::condition(
                vec!["customer".into(), "name".into()],
                Comparator::Equals,
                Value::from("Bob"),
            )),
            order_by: vec![OrderBy {
                path: vec!["total".into()],
                direction: Direction::Desc,
            }],
        };
        let rows = block_on(store.find_many("order", &query)).unwrap();
        let ids: Vec<Value> = rows.iter().map(|r| field(r, "id")).collect();
        assert_eq!(ids, vec![Value::Integer(12), Value::Integer(10)]);
    }

    #[test]
    fn test_rejects_non_list_rows() {
        let err = MemoryStore::from_fixture_str(r#"{ "data": { "customer": {} } }"#).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRows(_)));
    }

    #[test]
    fn test_unknown_delegate() {
        let store = MemoryStore::from_fixture_str(FIXTURE).unwrap();
        assert!(!store.has_delegate("invoice"));
        assert!(block_on(store.find_many("invoice", &Query::default())).is_err());
    }
}
