//! An interpreter for a small statement-oriented 4GL.
//!
//! ```
//! use mini4gl::{RunOptions, interpret};
//!
//! let outcome = interpret(
//!     r#"DEFINE VARIABLE n AS INTEGER INIT 2.
//!        DISPLAY "n =" n * 21."#,
//!     RunOptions::new(),
//! )
//! .unwrap();
//! assert_eq!(outcome.output, vec!["n = 42"]);
//! ```
//!
//! Record iteration (`FOR EACH`, `FIND`) goes through a [`RecordStore`];
//! [`MemoryStore`] serves JSON fixtures.

use std::{collections::BTreeMap, future::Future, rc::Rc};

use futures::{
    executor::block_on,
    future::{FutureExt, LocalBoxFuture},
};
use tracing::debug;

pub mod ast;
pub mod builtins;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod grammar;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod query;
pub mod statements;
pub mod store;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{BinOp, Expr, Program, Statement, Token};
pub use error::{Error, Result};
pub use evaluator::{Context, Env, Environment, EvalError, Evaluator};
pub use grammar::{Grammar, StatementModule};
pub use lexer::{LexError, Lexer, tokenize};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser, parse_program};
pub use query::{Filter, Query, QueryError};
pub use store::{MemoryStore, RecordStore, Schema, StoreError};
pub use value::Value;

/// Settings for one program run. Everything is optional.
#[derive(Default)]
pub struct RunOptions {
    inputs: Vec<Value>,
    on_output: Option<Box<dyn FnMut(&str)>>,
    store: Option<Rc<dyn RecordStore>>,
    ready: Option<LocalBoxFuture<'static, ()>>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a value for the next `INPUT` statement.
    pub fn input(mut self, value: impl Into<Value>) -> Self {
        self.inputs.push(value.into());
        self
    }

    pub fn inputs(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.inputs.extend(values);
        self
    }

    /// Called with every output line as soon as it is produced.
    pub fn on_output(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_output = Some(Box::new(callback));
        self
    }

    pub fn store(mut self, store: Rc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// A future awaited once before the first statement runs, e.g. a store
    /// finishing its setup.
    pub fn ready(mut self, gate: impl Future<Output = ()> + 'static) -> Self {
        self.ready = Some(gate.boxed_local());
        self
    }
}

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct RunOutcome {
    /// Every line emitted by DISPLAY and PRINT, in order
    pub output: Vec<String>,
    /// The global frame after the last statement
    pub env: Env,
    pub program: Program,
}

impl RunOutcome {
    /// Global variables by lower-cased name.
    pub fn variables(&self) -> BTreeMap<String, Value> {
        self.env.variables()
    }
}

/// Parses and runs a program.
///
/// Parsing completes before anything executes, so a syntax error never
/// produces output. The first runtime error aborts the run.
pub async fn run(source: &str, options: RunOptions) -> Result<RunOutcome> {
    let program = parse_program(source)?;
    debug!(statements = program.body.len(), "parsed program");

    let mut context = Context::new().with_inputs(options.inputs);
    if let Some(listener) = options.on_output {
        context = context.with_listener(listener);
    }
    if let Some(store) = options.store {
        context = context.with_store(store);
    }
    let evaluator = Evaluator::new(context);

    if let Some(gate) = options.ready {
        gate.await;
    }
    evaluator.execute_program(&program).await?;

    Ok(RunOutcome {
        output: evaluator.context().output(),
        env: Rc::clone(evaluator.root()),
        program,
    })
}

/// Blocking form of [`run`].
pub fn interpret(source: &str, options: RunOptions) -> Result<RunOutcome> {
    block_on(run(source, options))
}
