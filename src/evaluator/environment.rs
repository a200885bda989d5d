use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap, VecDeque},
    fmt,
    rc::{Rc, Weak},
};

use tracing::trace;

use crate::{ast::Procedure, store::RecordStore, value::Value};

pub type Env = Rc<Environment>;

/// Callback invoked with every output line as it is produced.
pub type OutputListener = Box<dyn FnMut(&str)>;

/// A registered procedure and the frame whose execution defined it.
#[derive(Debug)]
pub struct ProcedureEntry {
    pub decl: Procedure,
    pub owner: Weak<Environment>,
}

/// State shared by every frame of one program run.
///
/// Frames reach it through [`Environment::context`]; nothing in here is
/// lexically scoped.
#[derive(Default)]
pub struct Context {
    output: RefCell<Vec<String>>,
    listener: RefCell<Option<OutputListener>>,
    inputs: RefCell<VecDeque<Value>>,
    procedures: RefCell<HashMap<String, Rc<ProcedureEntry>>>,
    records: RefCell<HashMap<String, Value>>,
    store: Option<Rc<dyn RecordStore>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = Value>) -> Self {
        self.inputs = RefCell::new(inputs.into_iter().collect());
        self
    }

    pub fn with_listener(mut self, listener: OutputListener) -> Self {
        self.listener = RefCell::new(Some(listener));
        self
    }

    pub fn with_store(mut self, store: Rc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Appends one line to the output log and forwards it to the listener.
    pub fn emit(&self, line: String) {
        if let Some(listener) = self.listener.borrow_mut().as_mut() {
            listener(&line);
        }
        self.output.borrow_mut().push(line);
    }

    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    /// Next queued input value, if any.
    pub fn next_input(&self) -> Option<Value> {
        self.inputs.borrow_mut().pop_front()
    }

    pub fn store(&self) -> Option<&Rc<dyn RecordStore>> {
        self.store.as_ref()
    }

    pub fn register_procedure(&self, decl: Procedure, owner: &Env) {
        trace!(procedure = %decl.name, "registering procedure");
        let entry = ProcedureEntry {
            decl,
            owner: Rc::downgrade(owner),
        };
        self.procedures
            .borrow_mut()
            .insert(entry.decl.name.clone(), Rc::new(entry));
    }

    pub fn procedure(&self, name: &str) -> Option<Rc<ProcedureEntry>> {
        self.procedures
            .borrow()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    pub fn record(&self, name: &str) -> Option<Value> {
        self.records
            .borrow()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    /// Replaces a record buffer, returning what it held before.
    pub fn set_record(&self, name: &str, value: Value) -> Option<Value> {
        self.records
            .borrow_mut()
            .insert(name.to_ascii_lowercase(), value)
    }

    /// Puts a buffer back to a saved state; `None` removes it.
    pub fn restore_record(&self, name: &str, prior: Option<Value>) {
        let key = name.to_ascii_lowercase();
        let mut records = self.records.borrow_mut();
        match prior {
            Some(value) => records.insert(key, value),
            None => records.remove(&key),
        };
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("output", &self.output.borrow().len())
            .field("inputs", &self.inputs.borrow().len())
            .field("procedures", &self.procedures.borrow().len())
            .field("records", &self.records.borrow().len())
            .field("store", &self.store.is_some())
            .finish()
    }
}

/// One lexical frame of variable bindings.
///
/// Names are case-insensitive. Reads walk outward and yield null when the
/// name is bound nowhere. A plain assignment updates the nearest existing
/// binding in place and only creates a local one when none exists; a
/// declaration always binds in the current frame.
#[derive(Debug)]
pub struct Environment {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Env>,
    context: Rc<Context>,
}

impl Environment {
    pub fn root(context: Rc<Context>) -> Env {
        Rc::new(Environment {
            vars: RefCell::new(HashMap::new()),
            parent: None,
            context,
        })
    }

    /// A new frame sharing this frame's context.
    pub fn child(self: &Rc<Self>) -> Env {
        Rc::new(Environment {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(self)),
            context: Rc::clone(&self.context),
        })
    }

    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let key = name.to_ascii_lowercase();
        let mut frame = Some(self);
        while let Some(env) = frame {
            if let Some(value) = env.vars.borrow().get(&key) {
                return Some(value.clone());
            }
            frame = env.parent.as_deref();
        }
        None
    }

    pub fn get(&self, name: &str) -> Value {
        self.lookup(name).unwrap_or(Value::Null)
    }

    pub fn has(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn assign(&self, name: &str, value: Value) {
        let key = name.to_ascii_lowercase();
        let mut frame = Some(self);
        while let Some(env) = frame {
            if let Some(slot) = env.vars.borrow_mut().get_mut(&key) {
                *slot = value;
                return;
            }
            frame = env.parent.as_deref();
        }
        self.vars.borrow_mut().insert(key, value);
    }

    pub fn define(&self, name: &str, value: Value) {
        self.vars
            .borrow_mut()
            .insert(name.to_ascii_lowercase(), value);
    }

    /// The binding in this frame only, ignoring parents.
    pub fn local(&self, name: &str) -> Option<Value> {
        self.vars.borrow().get(&name.to_ascii_lowercase()).cloned()
    }

    /// Puts a local binding back to a saved state; `None` removes it.
    pub fn restore_local(&self, name: &str, prior: Option<Value>) {
        let key = name.to_ascii_lowercase();
        let mut vars = self.vars.borrow_mut();
        match prior {
            Some(value) => vars.insert(key, value),
            None => vars.remove(&key),
        };
    }

    /// True when `ancestor` is this frame or one of its parents.
    pub fn is_within(&self, ancestor: &Environment) -> bool {
        let mut frame = Some(self);
        while let Some(env) = frame {
            if std::ptr::eq(env, ancestor) {
                return true;
            }
            frame = env.parent.as_deref();
        }
        false
    }

    /// Sorted copy of this frame's bindings.
    pub fn variables(&self) -> BTreeMap<String, Value> {
        self.vars
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
