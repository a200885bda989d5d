use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::{BinOp, Expr, LogicalOp, Program, Statement, UnaryOp},
    builtins,
    query::QueryError,
    statements,
    store::StoreError,
    value::Value,
};

pub mod environment;

pub use environment::{Context, Env, Environment, OutputListener, ProcedureEntry};

/// Errors raised while executing a program. None are recovered inside the
/// interpreter; the first one aborts the run.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Operand types that an operator or builtin cannot work with
    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    #[error("Procedure {name} expects {expected} argument(s) but got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    /// Parameter/argument mismatches and procedure visibility violations
    #[error("{0}")]
    Call(String),

    #[error("{0} value out of range")]
    OutOfRange(String),

    #[error("FIND {0} failed: no record found")]
    RecordNotFound(String),

    /// A construct that parses but cannot run here
    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid loop: {0}")]
    InvalidLoop(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Tree-walking evaluator for one program run.
///
/// Statements execute strictly in sequence. Execution is async only so that
/// record-store calls can be awaited; nothing runs concurrently.
#[derive(Debug)]
pub struct Evaluator {
    root: Env,
}

impl Evaluator {
    pub fn new(context: Context) -> Self {
        Evaluator {
            root: Environment::root(Rc::new(context)),
        }
    }

    /// The global frame.
    pub fn root(&self) -> &Env {
        &self.root
    }

    pub fn context(&self) -> &Rc<Context> {
        self.root.context()
    }

    /// Executes every top-level statement in the global frame.
    pub async fn execute_program(&self, program: &Program) -> Result<(), EvalError> {
        debug!(statements = program.body.len(), "executing program");
        self.exec_block(&program.body, &self.root).await?;
        debug!(lines = self.context().output().len(), "program finished");
        Ok(())
    }

    /// Executes a statement list in `env`.
    ///
    /// Boxed so that statements holding nested bodies can recurse into it.
    pub fn exec_block<'a>(
        &'a self,
        body: &'a [Statement],
        env: &'a Env,
    ) -> LocalBoxFuture<'a, Result<(), EvalError>> {
        async move {
            for stmt in body {
                self.exec_statement(stmt, env).await?;
            }
            Ok(())
        }
        .boxed_local()
    }

    pub async fn exec_statement(&self, stmt: &Statement, env: &Env) -> Result<(), EvalError> {
        trace!(statement = statements::kind_name(stmt), "exec");
        statements::execute(self, stmt, env).await
    }

    pub fn eval_expr(&self, expr: &Expr, env: &Env) -> Result<Value, EvalError> {
        match expr {
            Expr::Integer(n) => Ok(Value::Integer(*n)),
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Unknown => Ok(Value::Null),
            Expr::Var(name) => Ok(env.get(name)),
            Expr::Field(path) => Ok(self.eval_field(path, env)),
            Expr::Unary { op, operand } => {
                let value = self.eval_expr(operand, env)?;
                apply_unary(*op, &value)
            }
            Expr::Binary { op, left, right } => {
                let left_val = self.eval_expr(left, env)?;
                let right_val = self.eval_expr(right, env)?;
                apply_binop(*op, &left_val, &right_val)
            }
            Expr::Logical { op, left, right } => {
                let left_val = self.eval_expr(left, env)?.is_truthy();
                let result = match op {
                    LogicalOp::And => left_val && self.eval_expr(right, env)?.is_truthy(),
                    LogicalOp::Or => left_val || self.eval_expr(right, env)?.is_truthy(),
                };
                Ok(Value::Boolean(result))
            }
            Expr::Call { name, args } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval_expr(arg, env))
                    .collect::<Result<Vec<_>, _>>()?;
                builtins::call(name, &values, env.context())
            }
        }
    }

    /// Resolves `base.a.b` against a variable or record buffer. Missing
    /// segments and non-record intermediates yield null.
    fn eval_field(&self, path: &[String], env: &Env) -> Value {
        let Some((base, rest)) = path.split_first() else {
            return Value::Null;
        };
        let mut current = env
            .lookup(base)
            .or_else(|| env.context().record(base))
            .unwrap_or(Value::Null);

        for segment in rest {
            current = match current {
                Value::Object(map) => map
                    .get(segment)
                    .or_else(|| {
                        map.iter()
                            .find(|(k, _)| k.eq_ignore_ascii_case(segment))
                            .map(|(_, v)| v)
                    })
                    .cloned()
                    .unwrap_or(Value::Null),
                _ => return Value::Null,
            };
        }
        current
    }
}

fn apply_unary(op: UnaryOp, value: &Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
        UnaryOp::Plus => match value {
            Value::Integer(n) => Ok(Value::Integer(*n)),
            other => Ok(Value::Float(other.to_number())),
        },
        UnaryOp::Minus => match value {
            Value::Integer(n) => Ok(n
                .checked_neg()
                .map(Value::Integer)
                .unwrap_or(Value::Float(-(*n as f64)))),
            other => Ok(Value::Float(-other.to_number())),
        },
    }
}

/// Applies a binary operator.
///
/// `+` concatenates when either side is a string; the other arithmetic
/// operators coerce both sides to numbers. Integer pairs stay integral
/// unless the exact result is fractional. Mixed operands go through
/// `Decimal` so that `0.1 + 0.2` style sums come out exact.
pub fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Equal => Ok(Value::Boolean(left.loose_equals(right))),
        BinOp::NotEqual => Ok(Value::Boolean(!left.loose_equals(right))),
        BinOp::LessThan => Ok(Value::Boolean(left.compare(right).is_some_and(|o| o.is_lt()))),
        BinOp::LessEqual => Ok(Value::Boolean(left.compare(right).is_some_and(|o| o.is_le()))),
        BinOp::GreaterThan => Ok(Value::Boolean(left.compare(right).is_some_and(|o| o.is_gt()))),
        BinOp::GreaterEqual => Ok(Value::Boolean(left.compare(right).is_some_and(|o| o.is_ge()))),
        BinOp::Add if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) => {
            Ok(Value::String(format!("{}{}", left.as_text(), right.as_text())))
        }
        BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide => arithmetic(op, left, right),
    }
}

fn arithmetic(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Value::Integer(a), Value::Integer(b)) = (left, right) {
        let exact = match op {
            BinOp::Add => a.checked_add(*b),
            BinOp::Subtract => a.checked_sub(*b),
            BinOp::Multiply => a.checked_mul(*b),
            BinOp::Divide if *b == 0 => return Err(EvalError::DivisionByZero),
            BinOp::Divide if a.checked_rem(*b) == Some(0) => a.checked_div(*b),
            _ => None,
        };
        if let Some(n) = exact {
            return Ok(Value::Integer(n));
        }
    }

    if matches!(left, Value::Object(_) | Value::Array(_))
        || matches!(right, Value::Object(_) | Value::Array(_))
    {
        return Err(EvalError::TypeError(format!(
            "Cannot apply {} to {} and {}",
            op,
            left.type_name(),
            right.type_name()
        )));
    }

    let a = left.to_number();
    let b = right.to_number();
    if op == BinOp::Divide && b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }

    if let Some(ad) = Decimal::from_f64(a)
        && let Some(bd) = Decimal::from_f64(b)
    {
        let rd = match op {
            BinOp::Add => ad.checked_add(bd),
            BinOp::Subtract => ad.checked_sub(bd),
            BinOp::Multiply => ad.checked_mul(bd),
            _ => ad.checked_div(bd),
        };
        if let Some(rd) = rd {
            if rd.is_integer()
                && let Some(r) = rd.to_i64()
            {
                return Ok(Value::Integer(r));
            } else if let Some(r) = rd.to_f64() {
                return Ok(Value::Float(r));
            }
        }
    }

    let res = match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        _ => a / b,
    };
    Ok(Value::from_f64(res))
}
