use std::fmt;

/// Byte range of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

/// A lexical token together with its position in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    /// Returns true if the token is the given keyword.
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.kind, TokenKind::Keyword(k) if k == keyword)
    }

    /// Returns true if the token is the given keyword, or an identifier spelled
    /// like it. Used for contextual words such as `TRANSACTION`.
    pub fn is_word(&self, word: &str) -> bool {
        match &self.kind {
            TokenKind::Keyword(k) => k.as_str() == word,
            TokenKind::Ident(name) => name.eq_ignore_ascii_case(word),
            _ => false,
        }
    }

    pub fn is_op(&self, op: Op) -> bool {
        matches!(self.kind, TokenKind::Op(o) if o == op)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier, spelled as written
    ///
    /// # Examples
    /// ```text
    /// customer
    /// orderDate
    /// _tmp1
    /// ```
    Ident(String),

    /// Integer literal
    Integer(i64),

    /// Decimal literal, including the leading-dot form
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// .5
    /// ```
    Float(f64),

    /// Double-quoted string, escapes already consumed
    String(String),

    /// Reserved word, matched case-insensitively
    Keyword(Keyword),

    /// Arithmetic or comparison operator
    Op(Op),

    /// The unknown value `?`
    Unknown,

    LParen,
    RParen,
    Comma,
    Colon,

    /// Statement terminator or field-path separator
    Dot,

    Eof,
}

impl TokenKind {
    /// Short tag used in syntax error messages.
    pub fn tag(&self) -> String {
        match self {
            TokenKind::Ident(_) => "IDENT".to_string(),
            TokenKind::Integer(_) | TokenKind::Float(_) => "NUMBER".to_string(),
            TokenKind::String(_) => "STRING".to_string(),
            TokenKind::Keyword(k) => k.as_str().to_string(),
            TokenKind::Op(op) => format!("OP '{}'", op),
            TokenKind::Unknown => "UNKNOWN".to_string(),
            TokenKind::LParen => "LPAREN".to_string(),
            TokenKind::RParen => "RPAREN".to_string(),
            TokenKind::Comma => "COMMA".to_string(),
            TokenKind::Colon => "COLON".to_string(),
            TokenKind::Dot => "DOT".to_string(),
            TokenKind::Eof => "EOF".to_string(),
        }
    }
}

/// Operator tokens. `NE`, `EQ`, `GE` and `LE` spellings lex directly into
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    /// `=`, both assignment and equality
    Eq,
    /// `==`
    EqEq,
    /// `<>`
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Star => "*",
            Op::Slash => "/",
            Op::Eq => "=",
            Op::EqEq => "==",
            Op::NotEq => "<>",
            Op::Lt => "<",
            Op::LtEq => "<=",
            Op::Gt => ">",
            Op::GtEq => ">=",
        };
        f.write_str(s)
    }
}

macro_rules! keywords {
    ($($variant:ident => $text:literal),* $(,)?) => {
        /// Reserved words of the language.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($variant),*
        }

        impl Keyword {
            /// Looks up an upper-cased spelling.
            pub fn from_upper(word: &str) -> Option<Keyword> {
                match word {
                    $($text => Some(Keyword::$variant),)*
                    _ => None,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Keyword::$variant => $text),*
                }
            }
        }
    };
}

keywords! {
    Assign => "ASSIGN",
    Display => "DISPLAY",
    Print => "PRINT",
    Input => "INPUT",
    If => "IF",
    Then => "THEN",
    Else => "ELSE",
    End => "END",
    Do => "DO",
    While => "WHILE",
    Repeat => "REPEAT",
    Leave => "LEAVE",
    Next => "NEXT",
    And => "AND",
    Or => "OR",
    Not => "NOT",
    For => "FOR",
    Each => "EACH",
    Where => "WHERE",
    By => "BY",
    Of => "OF",
    Lock => "LOCK",
    Find => "FIND",
    First => "FIRST",
    Last => "LAST",
    Error => "ERROR",
    Define => "DEFINE",
    Variable => "VARIABLE",
    As => "AS",
    No => "NO",
    Undo => "UNDO",
    Init => "INIT",
    Label => "LABEL",
    Format => "FORMAT",
    With => "WITH",
    Frame => "FRAME",
    Centered => "CENTERED",
    Procedure => "PROCEDURE",
    Run => "RUN",
    Parameter => "PARAMETER",
    Output => "OUTPUT",
    Descending => "DESCENDING",
    Break => "BREAK",
    Private => "PRIVATE",
    External => "EXTERNAL",
    In => "IN",
    Super => "SUPER",
    Ordinal => "ORDINAL",
    Persistent => "PERSISTENT",
    Thread => "THREAD",
    Safe => "SAFE",
    Cdecl => "CDECL",
    Pascal => "PASCAL",
    Stdcall => "STDCALL",
    From => "FROM",
    Stream => "STREAM",
    Handle => "HANDLE",
    Terminal => "TERMINAL",
    Value => "VALUE",
    Os => "OS",
    Dir => "DIR",
    Lob => "LOB",
    Attr => "ATTR",
    List => "LIST",
    Binary => "BINARY",
    Echo => "ECHO",
    Map => "MAP",
    Unbuffered => "UNBUFFERED",
    Convert => "CONVERT",
    Target => "TARGET",
    Source => "SOURCE",
    Create => "CREATE",
    Enable => "ENABLE",
    View => "VIEW",
    Apply => "APPLY",
    On => "ON",
    Wait => "WAIT",
    To => "TO",
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
