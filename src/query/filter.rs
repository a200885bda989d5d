use serde_json::{Map, Value as Json, json};

use crate::{ast::BinOp, output::value_to_json, value::Value};

/// Leaf comparison operator of a compiled filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Equals,
    Not,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparator {
    pub fn from_binop(op: BinOp) -> Option<Self> {
        match op {
            BinOp::Equal => Some(Comparator::Equals),
            BinOp::NotEqual => Some(Comparator::Not),
            BinOp::LessThan => Some(Comparator::Lt),
            BinOp::LessEqual => Some(Comparator::Lte),
            BinOp::GreaterThan => Some(Comparator::Gt),
            BinOp::GreaterEqual => Some(Comparator::Gte),
            _ => None,
        }
    }

    /// The comparator that holds with the operands swapped.
    pub fn flip(self) -> Self {
        match self {
            Comparator::Lt => Comparator::Gt,
            Comparator::Lte => Comparator::Gte,
            Comparator::Gt => Comparator::Lt,
            Comparator::Gte => Comparator::Lte,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Equals => "equals",
            Comparator::Not => "not",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
        }
    }

    /// Tests `field <op> operand` with the language's comparison rules.
    pub fn matches(&self, field: &Value, operand: &Value) -> bool {
        match self {
            Comparator::Equals => field.loose_equals(operand),
            Comparator::Not => !field.loose_equals(operand),
            Comparator::Lt => !field.is_null() && field.compare(operand).is_some_and(|o| o.is_lt()),
            Comparator::Lte => !field.is_null() && field.compare(operand).is_some_and(|o| o.is_le()),
            Comparator::Gt => !field.is_null() && field.compare(operand).is_some_and(|o| o.is_gt()),
            Comparator::Gte => !field.is_null() && field.compare(operand).is_some_and(|o| o.is_ge()),
        }
    }
}

/// `path <comparator> value`. The path is relative to the queried model;
/// every segment but the last names a to-one relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: Vec<String>,
    pub comparator: Comparator,
    pub value: Value,
}

/// Compiled WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Condition(Condition),
}

impl Filter {
    pub fn condition(path: Vec<String>, comparator: Comparator, value: Value) -> Self {
        Filter::Condition(Condition {
            path,
            comparator,
            value,
        })
    }

    /// Conjunction that folds nested ANDs into one list.
    pub fn and(left: Filter, right: Filter) -> Filter {
        let mut clauses = Vec::new();
        for side in [left, right] {
            match side {
                Filter::And(items) => clauses.extend(items),
                other => clauses.push(other),
            }
        }
        Filter::And(clauses)
    }

    /// Disjunction that folds nested ORs into one list.
    pub fn or(left: Filter, right: Filter) -> Filter {
        let mut clauses = Vec::new();
        for side in [left, right] {
            match side {
                Filter::Or(items) => clauses.extend(items),
                other => clauses.push(other),
            }
        }
        Filter::Or(clauses)
    }

    /// Nested-object rendering: `{"AND":[...]}`, `{"customer":{"name":{"equals":"Ann"}}}`.
    pub fn to_json(&self) -> Json {
        match self {
            Filter::And(items) => json!({ "AND": items.iter().map(Filter::to_json).collect::<Vec<_>>() }),
            Filter::Or(items) => json!({ "OR": items.iter().map(Filter::to_json).collect::<Vec<_>>() }),
            Filter::Condition(cond) => {
                let mut leaf = Map::new();
                leaf.insert(
                    cond.comparator.as_str().to_string(),
                    value_to_json(&cond.value),
                );
                nest(&cond.path, Json::Object(leaf))
            }
        }
    }
}

fn nest(path: &[String], leaf: Json) -> Json {
    path.iter().rev().fold(leaf, |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.clone(), inner);
        Json::Object(map)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub path: Vec<String>,
    pub direction: Direction,
}

impl OrderBy {
    pub fn to_json(&self) -> Json {
        nest(&self.path, Json::String(self.direction.as_str().to_string()))
    }
}

/// What a store is asked for: an optional filter and sort keys in priority
/// order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order_by: Vec<OrderBy>,
}

impl Query {
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        if let Some(filter) = &self.filter {
            map.insert("where".to_string(), filter.to_json());
        }
        if !self.order_by.is_empty() {
            map.insert(
                "orderBy".to_string(),
                Json::Array(self.order_by.iter().map(OrderBy::to_json).collect()),
            );
        }
        Json::Object(map)
    }
}
