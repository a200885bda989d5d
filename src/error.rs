use thiserror::Error;

use crate::{evaluator::EvalError, lexer::LexError, parser::ParseError, store::StoreError};

/// Any failure of a program run, by stage.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),

    #[error("Syntax error: {0}")]
    Parse(ParseError),

    #[error("Runtime error: {0}")]
    Eval(#[from] EvalError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Lex(lex) => Error::Lex(lex),
            other => Error::Parse(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
