// tests/lexer_tests.rs

use rql::ast::Token;
use rql::lexer::{LexError, Lexer, Position};
use test_case::test_case;

fn tokens(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token().unwrap();
        if token == Token::Eof {
            return tokens;
        }
        tokens.push(token);
    }
}

// ============================================================================
// Single character tokens
// ============================================================================

#[test]
fn test_single_char_tokens() {
    assert_eq!(
        tokens("@ | ; . , + - * / % = [ ] ( ) { } < >"),
        vec![
            Token::At,
            Token::Pipe,
            Token::Semicolon,
            Token::Dot,
            Token::Comma,
            Token::Plus,
            Token::Minus,
            Token::Star,
            Token::Slash,
            Token::Percent,
            Token::Assign,
            Token::LBracket,
            Token::RBracket,
            Token::LParen,
            Token::RParen,
            Token::LBrace,
            Token::RBrace,
            Token::Lt,
            Token::Gt,
        ]
    );
}

// ============================================================================
// Two character tokens
// ============================================================================

#[test]
fn test_two_char_tokens() {
    assert_eq!(
        tokens("== != <= >="),
        vec![Token::EqEq, Token::NotEq, Token::LtEq, Token::GtEq]
    );
}

#[test]
fn test_assign_vs_equality() {
    assert_eq!(
        tokens("a = b == c"),
        vec![
            Token::Identifier("a".to_string()),
            Token::Assign,
            Token::Identifier("b".to_string()),
            Token::EqEq,
            Token::Identifier("c".to_string()),
        ]
    );
}

#[test]
fn test_bare_bang_is_invalid() {
    let mut lexer = Lexer::new("!x");
    assert_eq!(
        lexer.next_token(),
        Err(LexError::UnexpectedChar {
            ch: '!',
            position: Position { line: 1, column: 1 },
        })
    );
}

// ============================================================================
// Keywords and references
// ============================================================================

#[test]
fn test_keywords() {
    assert_eq!(
        tokens("and or true false if then else table"),
        vec![
            Token::And,
            Token::Or,
            Token::Boolean(true),
            Token::Boolean(false),
            Token::If,
            Token::Then,
            Token::Else,
            Token::Table,
        ]
    );
}

#[test]
fn test_keywords_vs_identifiers() {
    assert_eq!(
        tokens("android tables iffy _else"),
        vec![
            Token::Identifier("android".to_string()),
            Token::Identifier("tables".to_string()),
            Token::Identifier("iffy".to_string()),
            Token::Identifier("_else".to_string()),
        ]
    );
}

#[test]
fn test_variables() {
    assert_eq!(
        tokens("$a $_0000002a $table"),
        vec![
            Token::Var("a".to_string()),
            Token::Var("_0000002a".to_string()),
            Token::Var("table".to_string()),
        ]
    );
}

#[test]
fn test_lone_dollar_is_invalid() {
    let mut lexer = Lexer::new("$ 1");
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::UnexpectedChar { ch: '$', .. })
    ));
}

// ============================================================================
// Numbers
// ============================================================================

#[test_case("42", Token::Integer(42) ; "integer")]
#[test_case("9223372036854775808", Token::Integer(9223372036854775808) ; "past i64 max")]
#[test_case("2.5", Token::Float(2.5) ; "float")]
#[test_case("1e20", Token::Float(1e20) ; "exponent")]
#[test_case("1.5e-7", Token::Float(1.5e-7) ; "negative exponent")]
#[test_case("3E+2", Token::Float(300.0) ; "signed exponent")]
fn test_numbers(input: &str, expected: Token) {
    assert_eq!(tokens(input), vec![expected]);
}

#[test]
fn test_dot_after_integer_is_a_lookup() {
    assert_eq!(
        tokens("1.x"),
        vec![
            Token::Integer(1),
            Token::Dot,
            Token::Identifier("x".to_string())
        ]
    );
}

#[test]
fn test_integer_overflow() {
    let mut lexer = Lexer::new("99999999999999999999");
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::InvalidNumber { .. })
    ));
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_string_escapes() {
    assert_eq!(
        tokens(r#""a\"b\\c\nd\te\r\u0001""#),
        vec![Token::String("a\"b\\c\nd\te\r\u{1}".to_string())]
    );
}

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new("x = \"abc");
    lexer.next_token().unwrap();
    lexer.next_token().unwrap();
    assert_eq!(
        lexer.next_token(),
        Err(LexError::UnterminatedString {
            position: Position { line: 1, column: 5 },
        })
    );
}

#[test]
fn test_invalid_escape() {
    let mut lexer = Lexer::new(r#""\q""#);
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::InvalidEscape { sequence, .. }) if sequence == "q"
    ));

    let mut lexer = Lexer::new(r#""\u12""#);
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::InvalidEscape { .. })
    ));
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_positions_track_lines() {
    let mut lexer = Lexer::new("a = 1;\n  $a");
    for _ in 0..4 {
        lexer.next_token().unwrap();
    }
    assert_eq!(lexer.next_token(), Ok(Token::Var("a".to_string())));
    assert_eq!(lexer.token_start(), Position { line: 2, column: 3 });
}
