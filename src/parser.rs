use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Keyword, LogicalOp, Op, Program, Statement, Token, TokenKind, UnaryOp},
    grammar::Grammar,
    lexer::{LexError, Lexer},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Expected {expected} but got {found} at {position}")]
    Expected {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("Unexpected token {found} at {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("Unexpected token in expression: {found} at {position}")]
    UnexpectedInExpression { found: String, position: usize },

    #[error("{message} at {position}")]
    Invalid { message: String, position: usize },
}

/// Recursive-descent parser over a token vector.
///
/// Statement forms are looked up in a [`Grammar`]; expressions are parsed
/// here by precedence climbing, lowest first:
/// `OR`, `AND`, `NOT`, comparison, `+ -`, `* /`, unary `+ -`, primary.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    grammar: &'static Grammar,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_grammar(tokens, Grammar::standard())
    }

    pub fn with_grammar(mut tokens: Vec<Token>, grammar: &'static Grammar) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token::new(TokenKind::Eof, crate::ast::Span::new(end, end)));
        }
        Parser {
            tokens,
            position: 0,
            grammar,
        }
    }

    /// Lexes `source` and returns a parser positioned at its first token.
    pub fn from_source(source: &str) -> Result<Self, ParseError> {
        Ok(Self::new(Lexer::new(source).tokenize()?))
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    pub fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    /// Token `offset` places ahead of the current one.
    pub fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.position + offset)
    }

    pub fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    pub fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek().is_keyword(keyword)
    }

    pub fn check_op(&self, op: Op) -> bool {
        self.peek().is_op(op)
    }

    pub fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn match_op(&mut self, op: Op) -> bool {
        if self.check_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes a keyword or an identifier spelled like it.
    pub fn match_word(&mut self, word: &str) -> bool {
        if self.peek().is_word(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expected(&self, expected: impl Into<String>) -> ParseError {
        let token = self.peek();
        ParseError::Expected {
            expected: expected.into(),
            found: token.kind.tag(),
            position: token.span.start,
        }
    }

    pub fn invalid(&self, message: impl Into<String>) -> ParseError {
        ParseError::Invalid {
            message: message.into(),
            position: self.peek().span.start,
        }
    }

    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.expected(kind.tag()))
        }
    }

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, ParseError> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.expected(keyword.as_str()))
        }
    }

    pub fn expect_word(&mut self, word: &str) -> Result<Token, ParseError> {
        if self.peek().is_word(word) {
            Ok(self.advance())
        } else {
            Err(self.expected(word))
        }
    }

    pub fn expect_ident(&mut self) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.expected("IDENT")),
        }
    }

    /// Consumes a trailing `.` if present.
    pub fn optional_dot(&mut self) {
        self.match_kind(&TokenKind::Dot);
    }

    /// Consumes `NO - <word>`, returning false (and consuming nothing) when
    /// the sequence is absent.
    pub fn match_hyphenated(&mut self, parts: &[&str]) -> bool {
        let mut offset = 0;
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                match self.peek_at(offset) {
                    Some(t) if t.is_op(Op::Minus) => offset += 1,
                    _ => return false,
                }
            }
            match self.peek_at(offset) {
                Some(t) if t.is_word(part) => offset += 1,
                _ => return false,
            }
        }
        for _ in 0..offset {
            self.advance();
        }
        true
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::Eof) {
            if self.match_kind(&TokenKind::Dot) {
                continue;
            }
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    /// Parses one statement through the grammar registry.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        if self.match_keyword(Keyword::End) {
            self.optional_dot();
            return Ok(Statement::Empty);
        }

        let grammar = self.grammar;
        let token = self.peek();

        if let TokenKind::Ident(_) = token.kind {
            for module in grammar.identifier_parsers() {
                if module.accepts_identifier(self) {
                    return (module.parse)(self);
                }
            }
        }

        if let TokenKind::Keyword(keyword) = token.kind
            && let Some(module) = grammar.lookup(keyword)
        {
            return (module.parse)(self);
        }

        Err(ParseError::UnexpectedToken {
            found: token.kind.tag(),
            position: token.span.start,
        })
    }

    /// Statements up to (not including) `END` or end of input.
    pub fn parse_block_statements(&mut self) -> Result<Vec<Statement>, ParseError> {
        let mut body = Vec::new();
        while !self.check_keyword(Keyword::End) && !self.check(&TokenKind::Eof) {
            if self.match_kind(&TokenKind::Dot) {
                continue;
            }
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    /// `: stmts END [.]` or a single statement, always wrapped in a block.
    pub fn parse_possibly_block(&mut self) -> Result<Statement, ParseError> {
        if self.match_kind(&TokenKind::Colon) {
            let body = self.parse_block_statements()?;
            self.expect_keyword(Keyword::End)?;
            self.optional_dot();
            return Ok(Statement::Block(body));
        }
        let stmt = self.parse_statement()?;
        Ok(Statement::Block(vec![stmt]))
    }

    /// `END [.]` closing a block body.
    pub fn parse_block_end(&mut self) -> Result<(), ParseError> {
        self.expect_keyword(Keyword::End)?;
        self.optional_dot();
        Ok(())
    }

    /// `ident(.ident)*` where each dot touches the identifier after it.
    pub fn parse_field_path(&mut self) -> Result<Vec<String>, ParseError> {
        let mut segments = vec![self.expect_ident()?];
        while let Some(next) = self.adjacent_segment() {
            self.advance(); // '.'
            self.advance(); // identifier
            segments.push(next);
        }
        Ok(segments)
    }

    fn adjacent_segment(&self) -> Option<String> {
        let dot = self.peek();
        if dot.kind != TokenKind::Dot {
            return None;
        }
        match self.peek_at(1) {
            Some(Token {
                kind: TokenKind::Ident(name),
                span,
            }) if span.start == dot.span.end => Some(name.clone()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;

        while self.match_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            left = Expr::logical(LogicalOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;

        while self.match_keyword(Keyword::And) {
            let right = self.parse_not()?;
            left = Expr::logical(LogicalOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.match_keyword(Keyword::Not) {
            let operand = self.parse_not()?; // Right-associative
            return Ok(Expr::unary(UnaryOp::Not, operand));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.peek().kind {
                TokenKind::Op(Op::Eq) | TokenKind::Op(Op::EqEq) => BinOp::Equal,
                TokenKind::Op(Op::NotEq) => BinOp::NotEqual,
                TokenKind::Op(Op::Lt) => BinOp::LessThan,
                TokenKind::Op(Op::LtEq) => BinOp::LessEqual,
                TokenKind::Op(Op::Gt) => BinOp::GreaterThan,
                TokenKind::Op(Op::GtEq) => BinOp::GreaterEqual,
                _ => break,
            };

            self.advance();
            let right = self.parse_additive()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.peek().kind {
                TokenKind::Op(Op::Plus) => BinOp::Add,
                TokenKind::Op(Op::Minus) => BinOp::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.peek().kind {
                TokenKind::Op(Op::Star) => BinOp::Multiply,
                TokenKind::Op(Op::Slash) => BinOp::Divide,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match &self.peek().kind {
            TokenKind::Op(Op::Plus) => UnaryOp::Plus,
            TokenKind::Op(Op::Minus) => UnaryOp::Minus,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::unary(op, operand))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Integer(n))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Float(n))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            TokenKind::Unknown => {
                self.advance();
                Ok(Expr::Unknown)
            }
            TokenKind::Ident(_) => {
                let segments = self.parse_field_path()?;
                if segments.len() == 1 && self.check(&TokenKind::LParen) {
                    let name = segments[0].to_ascii_uppercase();
                    return self.parse_call(name);
                }
                if segments.len() > 1 {
                    return Ok(Expr::Field(segments));
                }
                Ok(Expr::Var(segments.into_iter().next().unwrap_or_default()))
            }
            // PRINT(...) used as an expression
            TokenKind::Keyword(Keyword::Print)
                if self.peek_at(1).is_some_and(|t| t.kind == TokenKind::LParen) =>
            {
                self.advance();
                self.parse_call(Keyword::Print.as_str().to_string())
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            other => Err(ParseError::UnexpectedInExpression {
                found: other.tag(),
                position: token.span.start,
            }),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.match_kind(&TokenKind::Comma) {
                args.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Expr::Call { name, args })
    }
}

/// Parses a complete program.
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    Parser::from_source(source)?.parse_program()
}
