use tracing::trace;

use crate::{
    statements::lower_first,
    store::{RelationSchema, Schema},
    value::Value,
};

use super::{
    QueryError,
    filter::{Comparator, Filter},
};

/// Builds the filter that ties `target` rows to the active `parent` record
/// for `FOR EACH target OF parent` and `FIND target OF parent`.
///
/// With a schema the foreign key comes from relation metadata, whichever
/// side holds it. Without one (or when the models are not related) the
/// usual naming applies: `id = parent.targetId` when the parent carries the
/// key, else `parentId = parent.id`.
pub fn relation_where(
    schema: Option<&Schema>,
    target: &str,
    parent: &str,
    parent_record: &Value,
) -> Result<Filter, QueryError> {
    if let Some(schema) = schema
        && let Some(filter) = from_schema(schema, target, parent, parent_record)?
    {
        trace!(model = target, parent, "relation clause from schema");
        return Ok(filter);
    }

    let target_key = format!("{}Id", lower_first(target));
    let parent_key_value = field(parent_record, &target_key);
    if !parent_key_value.is_null() {
        return Ok(Filter::condition(
            vec!["id".to_string()],
            Comparator::Equals,
            parent_key_value,
        ));
    }

    Ok(Filter::condition(
        vec![format!("{}Id", lower_first(parent))],
        Comparator::Equals,
        field(parent_record, "id"),
    ))
}

fn from_schema(
    schema: &Schema,
    target: &str,
    parent: &str,
    parent_record: &Value,
) -> Result<Option<Filter>, QueryError> {
    let child_model = schema
        .model(target)
        .ok_or_else(|| QueryError::UnknownModel(target.to_string()))?;
    let parent_model = schema
        .model(parent)
        .ok_or_else(|| QueryError::UnknownModel(parent.to_string()))?;

    // Child row holds the key: child.fields[i] = parent.references[i]
    if let Some((_, rel)) = child_model.relation_to(&parent_model.name)
        && holds_key(rel)
    {
        return Ok(Some(join(rel.fields.iter().zip(&rel.references).map(
            |(local, remote)| (local.clone(), field(parent_record, remote)),
        ))));
    }

    // Parent row holds the key: child.references[i] = parent.fields[i]
    if let Some((_, rel)) = parent_model.relation_to(&child_model.name)
        && holds_key(rel)
    {
        return Ok(Some(join(rel.references.iter().zip(&rel.fields).map(
            |(remote, local)| (remote.clone(), field(parent_record, local)),
        ))));
    }

    Ok(None)
}

fn holds_key(rel: &RelationSchema) -> bool {
    !rel.fields.is_empty() && rel.fields.len() == rel.references.len()
}

fn join(pairs: impl Iterator<Item = (String, Value)>) -> Filter {
    let mut conditions: Vec<Filter> = pairs
        .map(|(name, value)| Filter::condition(vec![name], Comparator::Equals, value))
        .collect();
    if conditions.len() == 1 {
        conditions.remove(0)
    } else {
        Filter::And(conditions)
    }
}

fn field(record: &Value, name: &str) -> Value {
    match record {
        Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
