use thiserror::Error;

use crate::ast::{Keyword, Op, Span, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: usize },
}

/// Converts source text into tokens.
///
/// Positions are byte offsets into the original text.
pub struct Lexer {
    input: Vec<(usize, char)>,
    len: usize,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.char_indices().collect(),
            len: input.len(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).map(|(_, c)| *c)
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.input
            .get(self.position)
            .map(|(o, _)| *o)
            .unwrap_or(self.len)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    /// Skips whitespace and comments. Block comments do not nest; an
    /// unterminated one runs to the end of input.
    fn skip_trivia(&mut self) {
        loop {
            match (self.current_char(), self.peek_char(1)) {
                (Some(ch), _) if ch.is_whitespace() => self.advance(),
                (Some('/'), Some('*')) => {
                    self.position += 2;
                    while let Some(ch) = self.current_char() {
                        if ch == '*' && self.peek_char(1) == Some('/') {
                            break;
                        }
                        self.advance();
                    }
                    self.position = (self.position + 2).min(self.input.len());
                }
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Reads a double-quoted string. A backslash takes the next character
    /// literally; a missing closing quote ends the string at end of input.
    fn read_string(&mut self) -> String {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            self.advance();
            match ch {
                '"' => return result,
                '\\' => {
                    if let Some(next) = self.current_char() {
                        result.push(next);
                        self.advance();
                    }
                }
                _ => result.push(ch),
            }
        }

        result
    }

    fn read_number(&mut self) -> TokenKind {
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if !is_float && let Ok(n) = number.parse::<i64>() {
            return TokenKind::Integer(n);
        }
        // Digits and at most one dot always parse as f64
        TokenKind::Float(number.parse::<f64>().unwrap_or(f64::NAN))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn double(&mut self, kind: TokenKind) -> TokenKind {
        self.position += 2;
        kind
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let start = self.offset();

        let kind = match self.current_char() {
            None => TokenKind::Eof,
            Some('?') => self.single(TokenKind::Unknown),
            Some('"') => TokenKind::String(self.read_string()),
            Some(ch)
                if ch.is_ascii_digit()
                    || (ch == '.' && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())) =>
            {
                self.read_number()
            }
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                let ident = self.read_identifier();
                let upper = ident.to_ascii_uppercase();

                match upper.as_str() {
                    "NE" => TokenKind::Op(Op::NotEq),
                    "EQ" => TokenKind::Op(Op::Eq),
                    "GE" => TokenKind::Op(Op::GtEq),
                    "LE" => TokenKind::Op(Op::LtEq),
                    _ => match Keyword::from_upper(&upper) {
                        Some(keyword) => TokenKind::Keyword(keyword),
                        None => TokenKind::Ident(ident),
                    },
                }
            }
            Some('<') => match self.peek_char(1) {
                Some('=') => self.double(TokenKind::Op(Op::LtEq)),
                Some('>') => self.double(TokenKind::Op(Op::NotEq)),
                _ => self.single(TokenKind::Op(Op::Lt)),
            },
            Some('>') => match self.peek_char(1) {
                Some('=') => self.double(TokenKind::Op(Op::GtEq)),
                _ => self.single(TokenKind::Op(Op::Gt)),
            },
            Some('=') => match self.peek_char(1) {
                Some('=') => self.double(TokenKind::Op(Op::EqEq)),
                _ => self.single(TokenKind::Op(Op::Eq)),
            },
            Some('+') => self.single(TokenKind::Op(Op::Plus)),
            Some('-') => self.single(TokenKind::Op(Op::Minus)),
            Some('*') => self.single(TokenKind::Op(Op::Star)),
            Some('/') => self.single(TokenKind::Op(Op::Slash)),
            Some('(') => self.single(TokenKind::LParen),
            Some(')') => self.single(TokenKind::RParen),
            Some(',') => self.single(TokenKind::Comma),
            Some(':') => self.single(TokenKind::Colon),
            Some('.') => self.single(TokenKind::Dot),
            Some(ch) => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    position: start,
                });
            }
        };

        Ok(Token::new(kind, Span::new(start, self.offset())))
    }

    /// Lexes the whole input. The result always ends with an `Eof` token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

/// Lexes `source` into a token vector terminated by `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}

#[test]
fn test_keywords_fold_case() {
    let mut lexer = Lexer::new("display Display DISPLAY");
    for _ in 0..3 {
        assert_eq!(
            lexer.next_token().unwrap().kind,
            TokenKind::Keyword(Keyword::Display)
        );
    }
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn test_assignment_line() {
    let mut lexer = Lexer::new("n = n - 1.");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Ident("n".into()));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Op(Op::Eq));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Ident("n".into()));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Op(Op::Minus));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Integer(1));
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Dot);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}
