// tests/lexer_tests.rs

use mini4gl::ast::{Keyword, Op, TokenKind};
use mini4gl::lexer::{LexError, Lexer, tokenize};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// ============================================================================
// Punctuation and Operators
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("+", TokenKind::Op(Op::Plus)),
        ("-", TokenKind::Op(Op::Minus)),
        ("*", TokenKind::Op(Op::Star)),
        ("/", TokenKind::Op(Op::Slash)),
        ("=", TokenKind::Op(Op::Eq)),
        ("<", TokenKind::Op(Op::Lt)),
        (">", TokenKind::Op(Op::Gt)),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        (",", TokenKind::Comma),
        (":", TokenKind::Colon),
        (".", TokenKind::Dot),
        ("?", TokenKind::Unknown),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}

#[test]
fn test_two_char_operators_are_greedy() {
    let test_cases = vec![
        ("<=", Op::LtEq),
        (">=", Op::GtEq),
        ("<>", Op::NotEq),
        ("==", Op::EqEq),
    ];

    for (input, expected) in test_cases {
        assert_eq!(
            kinds(input),
            vec![TokenKind::Op(expected), TokenKind::Eof],
            "Failed for input: {}",
            input
        );
    }
}

#[test]
fn test_word_operators() {
    assert_eq!(
        kinds("a NE b eq c GE d le e"),
        vec![
            TokenKind::Ident("a".into()),
            TokenKind::Op(Op::NotEq),
            TokenKind::Ident("b".into()),
            TokenKind::Op(Op::Eq),
            TokenKind::Ident("c".into()),
            TokenKind::Op(Op::GtEq),
            TokenKind::Ident("d".into()),
            TokenKind::Op(Op::LtEq),
            TokenKind::Ident("e".into()),
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(
        kinds("42 3.5 .5"),
        vec![
            TokenKind::Integer(42),
            TokenKind::Float(3.5),
            TokenKind::Float(0.5),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_number_followed_by_terminator() {
    assert_eq!(
        kinds("x = 1."),
        vec![
            TokenKind::Ident("x".into()),
            TokenKind::Op(Op::Eq),
            TokenKind::Integer(1),
            TokenKind::Dot,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_string_escapes_are_taken_literally() {
    assert_eq!(
        kinds(r#""say \"hi\"" "a\nb""#),
        vec![
            TokenKind::String("say \"hi\"".into()),
            TokenKind::String("anb".into()),
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Identifiers and Keywords
// ============================================================================

#[test]
fn test_keywords_are_case_insensitive() {
    assert_eq!(
        kinds("for Each where"),
        vec![
            TokenKind::Keyword(Keyword::For),
            TokenKind::Keyword(Keyword::Each),
            TokenKind::Keyword(Keyword::Where),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_identifiers_keep_spelling() {
    assert_eq!(
        kinds("placedAt _tmp1"),
        vec![
            TokenKind::Ident("placedAt".into()),
            TokenKind::Ident("_tmp1".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_hyphenated_words_split() {
    assert_eq!(
        kinds("NO-LOCK"),
        vec![
            TokenKind::Keyword(Keyword::No),
            TokenKind::Op(Op::Minus),
            TokenKind::Keyword(Keyword::Lock),
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Trivia
// ============================================================================

#[test]
fn test_comments_are_skipped() {
    assert_eq!(
        kinds("a /* block\n comment */ b // line\n c"),
        vec![
            TokenKind::Ident("a".into()),
            TokenKind::Ident("b".into()),
            TokenKind::Ident("c".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_block_comments_do_not_nest() {
    // The first */ closes the comment
    assert_eq!(
        kinds("/* a /* b */ c"),
        vec![TokenKind::Ident("c".into()), TokenKind::Eof]
    );
}

#[test]
fn test_empty_input_yields_eof() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("   // nothing"), vec![TokenKind::Eof]);
}

// ============================================================================
// Spans and Errors
// ============================================================================

#[test]
fn test_spans_are_byte_offsets() {
    let tokens = tokenize("ab  cd").unwrap();
    assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 2));
    assert_eq!((tokens[1].span.start, tokens[1].span.end), (4, 6));
    assert_eq!(tokens[2].span.start, 6);
}

#[test]
fn test_unexpected_character() {
    let err = tokenize("x = 1 @ 2").unwrap_err();
    assert_eq!(err, LexError::UnexpectedChar { ch: '@', position: 6 });
    assert_eq!(err.to_string(), "Unexpected character '@' at 6");
}
