//! WHERE/BY compilation.
//!
//! A WHERE expression is never executed against rows. It is translated into
//! a [`Filter`] tree of `field <op> value` leaves that a record store can
//! evaluate however it likes, and BY clauses become [`OrderBy`] keys.

use thiserror::Error;

use crate::{
    ast::{Expr, SortKey},
    evaluator::{Env, EvalError, Evaluator},
};

pub mod compiler;
pub mod filter;
pub mod relation;

pub use compiler::{QueryCompiler, normalize_field_name};
pub use filter::{Comparator, Condition, Direction, Filter, OrderBy, Query};
pub use relation::relation_where;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("WHERE clause compares field {left} to field {right}; one side must be a value")]
    FieldToField { left: String, right: String },

    #[error("WHERE comparison needs a field of {target} on one side")]
    NoField { target: String },

    #[error("Cannot compare field {field} to a record")]
    RecordOperand { field: String },

    #[error("Unknown field {field} on {model}. Valid fields: {valid}")]
    UnknownField {
        field: String,
        model: String,
        valid: String,
    },

    #[error("Field {field} on {model} is not a relation")]
    NotARelation { field: String, model: String },

    #[error("Field {field} on {model} is a relation; use one of its fields")]
    RelationField { field: String, model: String },

    #[error("Field {field} on {model} is a list relation and cannot be filtered or sorted on")]
    ListRelation { field: String, model: String },

    #[error("Unknown model {0}")]
    UnknownModel(String),

    #[error("Unsupported WHERE expression: {0}")]
    Unsupported(String),

    #[error("No active record for {parent} to satisfy {statement} {target} OF {parent}")]
    NoActiveRecord {
        statement: String,
        target: String,
        parent: String,
    },
}

/// Everything FOR EACH and FIND need to compile before fetching.
pub struct QuerySpec<'a> {
    /// `FOR EACH` or `FIND`, for messages
    pub statement: &'static str,
    pub target: &'a str,
    pub relation: Option<&'a str>,
    pub where_clause: Option<&'a Expr>,
    pub order_by: &'a [SortKey],
}

/// Compiles WHERE, the `OF parent` relation clause and BY keys into one
/// query. The relation clause is AND-ed onto the WHERE filter.
pub fn compile_query(ev: &Evaluator, env: &Env, spec: &QuerySpec<'_>) -> Result<Query, EvalError> {
    let store = env.context().store();
    let schema = store.and_then(|s| s.schema());
    let compiler = QueryCompiler::new(ev, env, spec.target, schema);

    let mut filter = compiler.build_where(spec.where_clause)?;

    if let Some(parent) = spec.relation {
        let parent_record = env
            .context()
            .record(parent)
            .filter(|r| !r.is_null())
            .ok_or_else(|| QueryError::NoActiveRecord {
                statement: spec.statement.to_string(),
                target: spec.target.to_string(),
                parent: parent.to_string(),
            })?;
        let clause = relation_where(schema, spec.target, parent, &parent_record)?;
        filter = Some(match filter {
            Some(existing) => Filter::and(existing, clause),
            None => clause,
        });
    }

    let order_by = spec
        .order_by
        .iter()
        .map(|key| compiler.build_order_by(key))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Query { filter, order_by })
}
