use crate::{
    ast::{Expr, LogicalOp, SortKey, UnaryOp},
    evaluator::{Env, EvalError, Evaluator},
    store::{FieldKind, Schema},
    value::Value,
};

use super::{
    QueryError,
    filter::{Comparator, Direction, Filter, OrderBy},
};

/// One side of a WHERE comparison after classification.
#[derive(Debug)]
enum Operand {
    Field(Vec<String>),
    Value(Value),
}

/// Turns WHERE expressions and BY keys for one target model into store
/// filters and sort keys.
///
/// A comparison must have exactly one field side. A side counts as a field
/// when it is
/// - a dotted path starting with the target name (the name is dropped),
/// - a dotted path whose base is not a bound variable or buffer (a relation
///   path such as `customer.name` inside `FOR EACH order`), or
/// - a bare identifier that is not a bound variable.
///
/// The last rule means a misspelled variable silently becomes a field
/// reference; with a schema it is still caught as an unknown field.
pub struct QueryCompiler<'a> {
    evaluator: &'a Evaluator,
    env: &'a Env,
    target: String,
    schema: Option<&'a Schema>,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(
        evaluator: &'a Evaluator,
        env: &'a Env,
        target: &str,
        schema: Option<&'a Schema>,
    ) -> Self {
        QueryCompiler {
            evaluator,
            env,
            target: target.to_ascii_lowercase(),
            schema,
        }
    }

    pub fn build_where(&self, expr: Option<&Expr>) -> Result<Option<Filter>, EvalError> {
        expr.map(|e| self.compile(e)).transpose()
    }

    fn compile(&self, expr: &Expr) -> Result<Filter, EvalError> {
        match expr {
            Expr::Logical { op, left, right } => {
                let left = self.compile(left)?;
                let right = self.compile(right)?;
                Ok(match op {
                    LogicalOp::And => Filter::and(left, right),
                    LogicalOp::Or => Filter::or(left, right),
                })
            }
            Expr::Binary { op, left, right } => {
                let comparator = Comparator::from_binop(*op).ok_or_else(|| {
                    QueryError::Unsupported(format!("operator {} is not a comparison", op))
                })?;
                self.compile_comparison(comparator, left, right)
            }
            other => Err(QueryError::Unsupported(format!(
                "{} must be a comparison joined by AND/OR",
                describe(other)
            ))
            .into()),
        }
    }

    fn compile_comparison(
        &self,
        comparator: Comparator,
        left: &Expr,
        right: &Expr,
    ) -> Result<Filter, EvalError> {
        let (path, value, comparator) = match (self.classify(left)?, self.classify(right)?) {
            (Operand::Field(path), Operand::Value(value)) => (path, value, comparator),
            (Operand::Value(value), Operand::Field(path)) => (path, value, comparator.flip()),
            (Operand::Field(left), Operand::Field(right)) => {
                return Err(QueryError::FieldToField {
                    left: left.join("."),
                    right: right.join("."),
                }
                .into());
            }
            (Operand::Value(_), Operand::Value(_)) => {
                return Err(QueryError::NoField {
                    target: self.target.clone(),
                }
                .into());
            }
        };

        if matches!(value, Value::Object(_) | Value::Array(_)) {
            return Err(QueryError::RecordOperand {
                field: path.join("."),
            }
            .into());
        }

        let path = self.resolve_path(&path)?;
        Ok(Filter::condition(path, comparator, value))
    }

    fn is_bound(&self, name: &str) -> bool {
        self.env.has(name) || self.env.context().record(name).is_some()
    }

    fn classify(&self, expr: &Expr) -> Result<Operand, EvalError> {
        match expr {
            Expr::Field(path) if path[0].eq_ignore_ascii_case(&self.target) => {
                Ok(Operand::Field(path[1..].to_vec()))
            }
            Expr::Field(path) if !self.is_bound(&path[0]) => Ok(Operand::Field(path.clone())),
            Expr::Var(name) if !self.is_bound(name) => Ok(Operand::Field(vec![name.clone()])),
            other => Ok(Operand::Value(self.evaluator.eval_expr(other, self.env)?)),
        }
    }

    /// Validates a path against the schema and returns the schema's
    /// spelling of each segment. Without a schema the segments are only
    /// normalized.
    pub fn resolve_path(&self, path: &[String]) -> Result<Vec<String>, QueryError> {
        if path.is_empty() {
            return Err(QueryError::NoField {
                target: self.target.clone(),
            });
        }

        let Some(schema) = self.schema else {
            return Ok(path.iter().map(|s| normalize_field_name(s)).collect());
        };
        let mut model = schema
            .model(&self.target)
            .ok_or_else(|| QueryError::UnknownModel(self.target.clone()))?;

        let mut resolved = Vec::with_capacity(path.len());
        for (i, segment) in path.iter().enumerate() {
            let is_last = i + 1 == path.len();
            let field = model
                .field(segment)
                .ok_or_else(|| QueryError::UnknownField {
                    field: segment.clone(),
                    model: model.name.clone(),
                    valid: model.field_names().join(", "),
                })?;

            match &field.kind {
                FieldKind::Scalar if is_last => resolved.push(field.name.clone()),
                FieldKind::Scalar => {
                    return Err(QueryError::NotARelation {
                        field: field.name.clone(),
                        model: model.name.clone(),
                    });
                }
                FieldKind::Relation(rel) => {
                    if rel.list {
                        return Err(QueryError::ListRelation {
                            field: field.name.clone(),
                            model: model.name.clone(),
                        });
                    }
                    if is_last {
                        return Err(QueryError::RelationField {
                            field: field.name.clone(),
                            model: model.name.clone(),
                        });
                    }
                    resolved.push(field.name.clone());
                    model = schema
                        .model(&rel.model)
                        .ok_or_else(|| QueryError::UnknownModel(rel.model.clone()))?;
                }
            }
        }
        Ok(resolved)
    }

    /// `BY path [DESCENDING]`. Only scalar fields can be sorted on.
    pub fn build_order_by(&self, key: &SortKey) -> Result<OrderBy, QueryError> {
        let path = match key.path.split_first() {
            Some((base, rest)) if !rest.is_empty() && base.eq_ignore_ascii_case(&self.target) => {
                rest.to_vec()
            }
            _ => key.path.clone(),
        };
        Ok(OrderBy {
            path: self.resolve_path(&path)?,
            direction: if key.descending {
                Direction::Desc
            } else {
                Direction::Asc
            },
        })
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Var(name) => format!("bare identifier {}", name),
        Expr::Field(path) => format!("bare field {}", path.join(".")),
        Expr::Unary { op: UnaryOp::Not, .. } => "NOT expression".to_string(),
        Expr::Unary { .. } => "signed expression".to_string(),
        Expr::Call { name, .. } => format!("call to {}", name),
        _ => "literal".to_string(),
    }
}

/// Best-effort field naming when no schema is known: `created_at`,
/// `created-at`, `created at` and `CREATEDAT` style spellings become
/// camel case. Mixed-case names are left alone.
pub fn normalize_field_name(name: &str) -> String {
    let parts: Vec<&str> = name
        .split(['_', '-', ' '])
        .filter(|p| !p.is_empty())
        .collect();

    let all_caps = name.chars().any(|c| c.is_ascii_alphabetic())
        && !name.chars().any(|c| c.is_ascii_lowercase());

    if parts.len() <= 1 && !all_caps {
        return name.to_string();
    }

    let mut result = String::with_capacity(name.len());
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            result.push_str(&part.to_ascii_lowercase());
        } else {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                result.push(first.to_ascii_uppercase());
                result.push_str(&chars.as_str().to_ascii_lowercase());
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_field_name() {
        assert_eq!(normalize_field_name("created_at"), "createdAt");
        assert_eq!(normalize_field_name("CREATED-AT"), "createdAt");
        assert_eq!(normalize_field_name("placed at"), "placedAt");
        assert_eq!(normalize_field_name("NAME"), "name");
        assert_eq!(normalize_field_name("customerId"), "customerId");
        assert_eq!(normalize_field_name("total"), "total");
    }
}
