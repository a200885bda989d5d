use crate::ast::Statement;

/// A parsed source file: the top-level statements in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Statement>,
}
