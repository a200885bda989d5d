//! # mini4gl - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for mini4gl, a small
//! statement-oriented 4GL scripting language with record iteration over an
//! external store.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, variables, field paths, calls)
//! - **[operators]** - Binary, logical and unary operators
//! - **[statements]** - Statement nodes, one variant per statement kind
//! - **[procedure]** - Procedure definitions and their headers
//! - **[program]** - The top-level statement list
//!
//! ## Quick Start
//!
//! ```text
//! DEFINE VARIABLE n AS INTEGER INIT 3.
//! DO WHILE n > 0:
//!   DISPLAY n.
//!   n = n - 1.
//! END.
//! ```
//!
//! ## Core Concepts
//!
//! ### Statement terminators
//!
//! Simple statements end with an optional `.`. A `:` opens a block that runs
//! until `END`, and the block's own `END` takes an optional `.` too.
//!
//! ### Field paths
//!
//! `customer.name` is a single field path only when the dot touches the next
//! identifier. `DISPLAY x.` keeps its trailing dot as a terminator.
//!
//! ### Case
//!
//! Keywords are case-insensitive. Variable names are case-insensitive as well;
//! the AST keeps identifiers as written so that field names can be matched
//! against a store schema.
//!
//! ## Examples
//!
//! ### Procedure with an OUTPUT parameter
//!
//! ```text
//! PROCEDURE p:
//!   DEFINE OUTPUT PARAMETER y AS INTEGER.
//!   y = 7.
//! END.
//! DEFINE VARIABLE z AS INTEGER.
//! RUN p(OUTPUT z).
//! DISPLAY z.
//! ```
//!
//! ### Record iteration
//!
//! ```text
//! FOR EACH customer NO-LOCK WHERE customer.name <> "" BY name:
//!   DISPLAY customer.name.
//! END.
//! ```
pub mod tokens;
pub mod expressions;
pub mod operators;
pub mod statements;
pub mod procedure;
pub mod program;

pub use tokens::{Keyword, Op, Span, Token, TokenKind};
pub use expressions::Expr;
pub use operators::{BinOp, LogicalOp, UnaryOp};
pub use statements::{
    Assign, ConvertOption, Display, DisplayItem, DisplayOption, Do, Find, ForEach, If, Input,
    InputOptions, InputSource, LoopRange, MapOption, ParamMode, Parameter, Qualifier, RecordRef,
    Repeat, Run, RunArg, SortKey, Statement, StreamClause, VariableDecl, While,
};
pub use procedure::{CallingConvention, ExternalBinding, Procedure};
pub use program::Program;
