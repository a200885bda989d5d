use crate::ast::{Expr, Procedure};

/// Statement node.
///
/// Every kind is produced by exactly one module under `statements/`, which
/// also owns its executor.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Assignment
    ///
    /// # Example
    /// ```text
    /// ASSIGN total = total + 1.
    /// total = 0.
    /// ```
    Assign(Assign),

    /// Variable declaration
    ///
    /// # Example
    /// ```text
    /// DEFINE VARIABLE name AS CHARACTER INIT "x" NO-UNDO.
    /// ```
    DefineVariable(VariableDecl),

    /// Parameter declaration. Lifted into the enclosing procedure's parameter
    /// list at parse time; a no-op anywhere else.
    DefineParameter(Parameter),

    /// Output of one line
    ///
    /// # Example
    /// ```text
    /// DISPLAY "Total:" total FORMAT ">>>9.99" WITH CENTERED.
    /// ```
    Display(Display),

    /// Read from the input queue or a source expression
    Input(Input),

    /// Conditional
    If(If),

    /// `DO` block, optionally looping
    Do(Do),

    /// `REPEAT WHILE` loop
    Repeat(Repeat),

    /// `WHILE ... DO` loop
    While(While),

    /// Record iteration
    ///
    /// # Example
    /// ```text
    /// FOR EACH order WHERE order.total > 100 BY placedAt DESCENDING:
    ///   DISPLAY order.id.
    /// END.
    /// ```
    ForEach(ForEach),

    /// Single-record lookup
    Find(Find),

    /// Procedure definition
    Procedure(Procedure),

    /// Procedure call
    Run(Run),

    /// Statement list
    Block(Vec<Statement>),

    /// Nothing, e.g. a stray `END.`
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub data_type: Option<String>,
    pub init: Option<Expr>,
    pub no_undo: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    Input,
    Output,
}

impl std::fmt::Display for ParamMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamMode::Input => f.write_str("INPUT"),
            ParamMode::Output => f.write_str("OUTPUT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub mode: ParamMode,
    pub name: String,
    pub data_type: Option<String>,
    pub init: Option<Expr>,
    pub no_undo: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub expr: Expr,
    pub label: Option<Expr>,
    pub format: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayOption {
    Centered,
    Frame,
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Display {
    pub items: Vec<DisplayItem>,
    pub options: Vec<DisplayOption>,
}

impl Display {
    pub fn is_centered(&self) -> bool {
        self.options.contains(&DisplayOption::Centered)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamClause {
    Stream(String),
    StreamHandle(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    Terminal,
    Value(Expr),
    OsDir { directory: Expr, no_attr_list: bool },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MapOption {
    None,
    Entry(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConvertOption {
    None,
    Convert {
        target: Option<Expr>,
        source: Option<Expr>,
    },
}

/// Options following `INPUT FROM <source>`. Parsed and kept on the node;
/// the runtime does not act on them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputOptions {
    pub lob_dir: Option<Expr>,
    pub binary: bool,
    pub echo: Option<bool>,
    pub map: Option<MapOption>,
    pub unbuffered: bool,
    pub convert: Option<ConvertOption>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub target: Option<String>,
    pub stream: Option<StreamClause>,
    pub source: Option<InputSource>,
    pub options: Option<InputOptions>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Expr,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
}

/// A record buffer named in `DO FOR`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRef {
    pub name: String,
    pub path: Vec<String>,
}

/// `var = from TO to [BY step]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoopRange {
    pub variable: String,
    pub from: Expr,
    pub to: Expr,
    pub step: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Do {
    pub label: Option<String>,
    pub records: Vec<RecordRef>,
    pub transaction: bool,
    pub range: Option<LoopRange>,
    pub while_cond: Option<Expr>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Repeat {
    pub while_cond: Option<Expr>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Expr,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    Each,
    First,
    Last,
}

/// One `[BREAK] BY path [DESCENDING]` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub path: Vec<String>,
    pub descending: bool,
    pub break_group: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForEach {
    pub qualifier: Qualifier,
    pub target: String,
    pub relation: Option<String>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<SortKey>,
    pub no_lock: bool,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Find {
    /// `FIRST` or `LAST`; a bare `FIND` behaves like `FIND FIRST`.
    pub qualifier: Option<Qualifier>,
    pub target: String,
    pub relation: Option<String>,
    pub where_clause: Option<Expr>,
    pub no_lock: bool,
    pub no_error: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunArg {
    pub mode: Option<ParamMode>,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub name: String,
    pub args: Vec<RunArg>,
}
