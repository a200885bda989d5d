//! Statement registry.
//!
//! Each statement module contributes a [`StatementModule`]: the keywords it
//! starts with, an optional predicate for identifier-led forms, and its parse
//! function. The parser never names a statement kind directly; it asks the
//! grammar which module owns the current token.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::{
    ast::{Keyword, Statement},
    parser::{ParseError, Parser},
    statements,
};

pub type ParseFn = fn(&mut Parser) -> Result<Statement, ParseError>;

pub type IdentifierPredicate = fn(&Parser) -> bool;

#[derive(Debug, Clone, Copy)]
pub struct StatementModule {
    pub name: &'static str,
    pub keywords: &'static [Keyword],
    /// Set for modules that may start with a plain identifier
    pub identifier_start: Option<IdentifierPredicate>,
    pub parse: ParseFn,
}

impl StatementModule {
    pub fn accepts_identifier(&self, parser: &Parser) -> bool {
        self.identifier_start.is_some_and(|accepts| accepts(parser))
    }
}

#[derive(Debug)]
pub struct Grammar {
    by_keyword: HashMap<Keyword, &'static StatementModule>,
    identifier_parsers: Vec<&'static StatementModule>,
}

static STANDARD: Lazy<Grammar> = Lazy::new(|| Grammar::from_modules(statements::MODULES));

impl Grammar {
    /// Builds a registry. When two modules claim a keyword the later one
    /// wins; identifier predicates are tried in module order.
    pub fn from_modules(modules: &'static [StatementModule]) -> Self {
        let mut by_keyword = HashMap::new();
        let mut identifier_parsers = Vec::new();

        for module in modules {
            for keyword in module.keywords {
                by_keyword.insert(*keyword, module);
            }
            if module.identifier_start.is_some() {
                identifier_parsers.push(module);
            }
        }

        Grammar {
            by_keyword,
            identifier_parsers,
        }
    }

    /// The registry holding every built-in statement.
    pub fn standard() -> &'static Grammar {
        &STANDARD
    }

    pub fn lookup(&self, keyword: Keyword) -> Option<&'static StatementModule> {
        self.by_keyword.get(&keyword).copied()
    }

    pub fn identifier_parsers(&self) -> &[&'static StatementModule] {
        &self.identifier_parsers
    }
}
