//! Statement modules.
//!
//! Every statement kind lives in one module that owns both halves of it: a
//! `MODULE` entry for the [`Grammar`](crate::grammar::Grammar) and an
//! `execute` function the evaluator dispatches to. Adding a statement means
//! adding a module and one line in each table below.

use crate::{
    ast::Statement,
    evaluator::{Env, EvalError, Evaluator},
    grammar::StatementModule,
    value::Value,
};

pub mod assign;
pub mod define;
pub mod display;
pub mod do_block;
pub mod find;
pub mod for_each;
pub mod if_then;
pub mod input;
pub mod procedure;
pub mod repeat;
pub mod run;
pub mod while_loop;

/// Parse table. Labelled `DO` comes before assignment because both may
/// start with an identifier.
pub static MODULES: &[StatementModule] = &[
    do_block::MODULE,
    assign::MODULE,
    define::MODULE,
    procedure::MODULE,
    run::MODULE,
    display::MODULE,
    input::MODULE,
    if_then::MODULE,
    repeat::MODULE,
    while_loop::MODULE,
    for_each::MODULE,
    find::MODULE,
];

/// Execution table.
pub async fn execute(ev: &Evaluator, stmt: &Statement, env: &Env) -> Result<(), EvalError> {
    match stmt {
        Statement::Assign(node) => assign::execute(ev, node, env),
        Statement::DefineVariable(node) => define::execute_variable(ev, node, env),
        Statement::DefineParameter(_) => Ok(()),
        Statement::Display(node) => display::execute(ev, node, env),
        Statement::Input(node) => input::execute(ev, node, env),
        Statement::If(node) => if_then::execute(ev, node, env).await,
        Statement::Do(node) => do_block::execute(ev, node, env).await,
        Statement::Repeat(node) => repeat::execute(ev, node, env).await,
        Statement::While(node) => while_loop::execute(ev, node, env).await,
        Statement::ForEach(node) => for_each::execute(ev, node, env).await,
        Statement::Find(node) => find::execute(ev, node, env).await,
        Statement::Procedure(node) => procedure::execute(node, env),
        Statement::Run(node) => run::execute(ev, node, env).await,
        Statement::Block(body) => ev.exec_block(body, env).await,
        Statement::Empty => Ok(()),
    }
}

pub fn kind_name(stmt: &Statement) -> &'static str {
    match stmt {
        Statement::Assign(_) => "Assign",
        Statement::DefineVariable(_) => "DefineVariable",
        Statement::DefineParameter(_) => "DefineParameter",
        Statement::Display(_) => "Display",
        Statement::Input(_) => "Input",
        Statement::If(_) => "If",
        Statement::Do(_) => "Do",
        Statement::Repeat(_) => "Repeat",
        Statement::While(_) => "While",
        Statement::ForEach(_) => "ForEach",
        Statement::Find(_) => "Find",
        Statement::Procedure(_) => "Procedure",
        Statement::Run(_) => "Run",
        Statement::Block(_) => "Block",
        Statement::Empty => "Empty",
    }
}

/// `Customer` → `customer`: the store delegate name for a buffer.
pub(crate) fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Record buffer and variable of the same name, saved for restoration.
pub(crate) struct SavedBuffer {
    name: String,
    record: Option<Value>,
    variable: Option<Value>,
}

impl SavedBuffer {
    /// Saves both bindings and clears them to null.
    pub(crate) fn clear(name: &str, env: &Env) -> Self {
        let saved = SavedBuffer {
            name: name.to_string(),
            record: env.context().set_record(name, Value::Null),
            variable: env.local(name),
        };
        env.define(name, Value::Null);
        saved
    }

    pub(crate) fn restore(self, env: &Env) {
        tracing::trace!(buffer = %self.name, "restoring record buffer");
        env.context().restore_record(&self.name, self.record);
        env.restore_local(&self.name, self.variable);
    }
}
