//! Record-store boundary.
//!
//! FOR EACH and FIND talk to a [`RecordStore`] through a per-model
//! [`Delegate`]. The store receives a compiled [`Query`] and returns rows
//! as [`Value::Object`]s. It may describe its models with a [`Schema`], in
//! which case field paths are validated before any query is issued.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{query::Query, value::Value};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record store has no model named {0}")]
    UnknownModel(String),

    #[error("Invalid fixture: {0}")]
    Fixture(#[from] serde_json::Error),

    #[error("Fixture data for {0} must be a list of objects")]
    InvalidRows(String),

    #[error("Cannot read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record store failure: {0}")]
    Backend(String),
}

/// Abstract data source for record iteration.
///
/// Calls are awaited one at a time; implementations need not be `Send`.
#[async_trait(?Send)]
pub trait RecordStore {
    /// True when `delegate` names a model this store serves.
    fn has_delegate(&self, delegate: &str) -> bool;

    /// Model descriptions, when the store can provide them.
    fn schema(&self) -> Option<&Schema> {
        None
    }

    async fn find_many(&self, delegate: &str, query: &Query) -> Result<Vec<Value>, StoreError>;

    async fn find_first(&self, delegate: &str, query: &Query) -> Result<Option<Value>, StoreError> {
        Ok(self.find_many(delegate, query).await?.into_iter().next())
    }
}

/// One model's slice of a store.
pub struct Delegate<'a> {
    store: &'a dyn RecordStore,
    name: String,
}

impl<'a> Delegate<'a> {
    /// Looks up the delegate for a buffer name, e.g. `Customer` → `customer`.
    pub fn resolve(store: &'a dyn RecordStore, buffer: &str) -> Result<Self, StoreError> {
        let name = crate::statements::lower_first(buffer);
        if !store.has_delegate(&name) {
            return Err(StoreError::UnknownModel(buffer.to_string()));
        }
        Ok(Delegate { store, name })
    }

    pub async fn find_many(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        debug!(model = %self.name, query = %query.to_json(), "findMany");
        self.store.find_many(&self.name, query).await
    }

    pub async fn find_first(&self, query: &Query) -> Result<Option<Value>, StoreError> {
        debug!(model = %self.name, query = %query.to_json(), "findFirst");
        self.store.find_first(&self.name, query).await
    }
}

/// Model descriptions used to validate and resolve field paths.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub models: Vec<ModelSchema>,
}

impl Schema {
    /// Case-insensitive model lookup.
    pub fn model(&self, name: &str) -> Option<&ModelSchema> {
        self.models
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl ModelSchema {
    /// Case-insensitive field lookup.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// First relation field pointing at `model`.
    pub fn relation_to(&self, model: &str) -> Option<(&FieldSchema, &RelationSchema)> {
        self.fields.iter().find_map(|f| match &f.kind {
            FieldKind::Relation(rel) if rel.model.eq_ignore_ascii_case(model) => Some((f, rel)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(default)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Scalar,
    Relation(RelationSchema),
}

/// A relation field. When `fields` is non-empty this side holds the
/// foreign key: `fields[i]` here matches `references[i]` on `model`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelationSchema {
    pub model: String,
    #[serde(default)]
    pub list: bool,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
}
