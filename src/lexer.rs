use std::fmt;

use thiserror::Error;

use crate::ast::Token;

/// Line and column of a character, both starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn start() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedChar { ch: char, position: Position },

    #[error("unterminated string starting at {position}")]
    UnterminatedString { position: Position },

    #[error("invalid escape sequence '\\{sequence}' at {position}")]
    InvalidEscape { sequence: String, position: Position },

    #[error("invalid number '{text}' at {position}")]
    InvalidNumber { text: String, position: Position },
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    token_start: Position,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            token_start: Position::start(),
        }
    }

    /// Position of the next character to be read.
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    /// Where the most recently read token starts.
    pub fn token_start(&self) -> Position {
        self.token_start
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }

    /// Consumes the current character and returns `token`.
    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Consumes `ch` plus an optional `=`, picking the matching token.
    fn with_eq(&mut self, plain: Token, with_eq: Token) -> Token {
        if self.peek_char(1) == Some('=') {
            self.advance();
            self.advance();
            with_eq
        } else {
            self.single(plain)
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_ident_start(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
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

    fn read_string(&mut self) -> Result<String, LexError> {
        let start = self.position();
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    let escape_at = self.position();
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\\') => result.push('\\'),
                        Some('u') => {
                            result.push(self.read_unicode_escape(escape_at)?);
                            continue;
                        }
                        Some(other) => {
                            return Err(LexError::InvalidEscape {
                                sequence: other.to_string(),
                                position: escape_at,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    /// Reads `uXXXX` after a backslash.
    fn read_unicode_escape(&mut self, escape_at: Position) -> Result<char, LexError> {
        self.advance(); // 'u'
        let mut hex = String::new();
        for _ in 0..4 {
            match self.current_char() {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    hex.push(ch);
                    self.advance();
                }
                _ => break,
            }
        }

        u32::from_str_radix(&hex, 16)
            .ok()
            .filter(|_| hex.len() == 4)
            .and_then(char::from_u32)
            .ok_or(LexError::InvalidEscape {
                sequence: format!("u{}", hex),
                position: escape_at,
            })
    }

    fn read_digits(&mut self, number: &mut String) {
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position();
        let mut number = String::new();
        let mut is_float = false;

        self.read_digits(&mut number);

        if self.current_char() == Some('.') && self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            number.push('.');
            self.advance();
            self.read_digits(&mut number);
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let signed = matches!(self.peek_char(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                number.push('e');
                self.advance();
                if let Some(sign) = self.current_char().filter(|_| signed) {
                    number.push(sign);
                    self.advance();
                }
                self.read_digits(&mut number);
            }
        }

        let invalid = |number: &str| LexError::InvalidNumber {
            text: number.to_string(),
            position: start,
        };
        if is_float {
            number
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| invalid(&number))
        } else {
            number
                .parse::<u64>()
                .map(Token::Integer)
                .map_err(|_| invalid(&number))
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.token_start = self.position();

        let token = match self.current_char() {
            None => Token::Eof,
            Some('$') => match self.peek_char(1) {
                Some(ch) if Self::is_ident_start(ch) => {
                    self.advance();
                    Token::Var(self.read_identifier())
                }
                _ => {
                    return Err(LexError::UnexpectedChar {
                        ch: '$',
                        position: self.position(),
                    });
                }
            },
            Some('@') => self.single(Token::At),
            Some('|') => self.single(Token::Pipe),
            Some(';') => self.single(Token::Semicolon),
            Some('.') => self.single(Token::Dot),
            Some(',') => self.single(Token::Comma),
            Some('+') => self.single(Token::Plus),
            Some('-') => self.single(Token::Minus),
            Some('*') => self.single(Token::Star),
            Some('/') => self.single(Token::Slash),
            Some('%') => self.single(Token::Percent),
            Some('=') => self.with_eq(Token::Assign, Token::EqEq),
            Some('>') => self.with_eq(Token::Gt, Token::GtEq),
            Some('<') => self.with_eq(Token::Lt, Token::LtEq),
            Some('!') if self.peek_char(1) == Some('=') => {
                self.advance();
                self.advance();
                Token::NotEq
            }
            Some('{') => self.single(Token::LBrace),
            Some('}') => self.single(Token::RBrace),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some('[') => self.single(Token::LBracket),
            Some(']') => self.single(Token::RBracket),
            Some('"') => Token::String(self.read_string()?),
            Some(ch) if Self::is_ident_start(ch) => {
                let ident = self.read_identifier();

                match ident.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "true" => Token::Boolean(true),
                    "false" => Token::Boolean(false),
                    "if" => Token::If,
                    "then" => Token::Then,
                    "else" => Token::Else,
                    "table" => Token::Table,
                    _ => Token::Identifier(ident),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) => {
                return Err(LexError::UnexpectedChar {
                    ch,
                    position: self.position(),
                });
            }
        };

        Ok(token)
    }
}
