//! Reader for the debug text grammar.
//!
//! Reads what the printer writes back into a [`wire::Query`], so printed
//! output can be checked against the serializer's. Statements are
//! `name = <expr>;`; the query ends with a bare expression.
//!
//! ```text
//! query       := (identifier "=" expression ";")* expression
//! expression  := "if" expression "then" expression "else" expression
//!              | or ("|" call)*
//! call        := key "." key "(" (key "=" expression ("," key "=" expression)*)? ")"
//! or          := and ("or" and)*
//! and         := comparison ("and" comparison)*
//! comparison  := additive (("==" | "!=" | "<" | ">" | "<=" | ">=") additive)?
//! additive    := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := postfix (("*" | "/" | "%") postfix)*
//! postfix     := primary ("." key | "[" expression "]")*
//! ```

use std::mem;

use thiserror::Error;

use crate::{
    ast::{BinOp, Token},
    lexer::{LexError, Lexer, Position},
    wire::{Ast, Dict, OpCall, Query, Statement},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, found {found} at {position}")]
    Unexpected {
        expected: &'static str,
        found: String,
        position: Position,
    },

    #[error("integer literal {text} does not fit in 64 bits at {position}")]
    IntegerOverflow { text: String, position: Position },
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    position: Position,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        let position = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            position,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.position = self.lexer.token_start();
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn unexpected<T>(&self, expected: &'static str) -> Result<T, ParseError> {
        Err(ParseError::Unexpected {
            expected,
            found: self.current_token.to_string(),
            position: self.position,
        })
    }

    fn expect(&mut self, expected: Token, description: &'static str) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return self.unexpected(description);
        }
        self.advance()
    }

    /// An identifier or a keyword used as a key.
    fn parse_key(&mut self) -> Result<String, ParseError> {
        let key = match &self.current_token {
            Token::Identifier(name) => name.clone(),
            token => match token.keyword_text() {
                Some(text) => text.to_string(),
                None => return self.unexpected("a name"),
            },
        };
        self.advance()?;
        Ok(key)
    }

    /// Parses a whole query: statements, then the terminal expression.
    pub fn parse_query(&mut self) -> Result<Query, ParseError> {
        let mut statements = Vec::new();

        while let Token::Identifier(name) = &self.current_token {
            let name = name.clone();
            self.advance()?;
            self.expect(Token::Assign, "'='")?;
            let body = self.parse_expression()?;
            self.expect(Token::Semicolon, "';'")?;
            statements.push(Statement::new(name, body));
        }

        let terminal = self.parse_expression()?;
        self.expect(Token::Eof, "end of input")?;

        Ok(Query {
            statements,
            terminal,
        })
    }

    /// Parses a single expression that must span the whole input.
    pub fn parse(&mut self) -> Result<Ast, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof, "end of input")?;
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Ast, ParseError> {
        if self.check(&Token::If) {
            self.advance()?;
            let condition = self.parse_expression()?;
            self.expect(Token::Then, "'then'")?;
            let then_do = self.parse_expression()?;
            self.expect(Token::Else, "'else'")?;
            let else_do = self.parse_expression()?;
            return Ok(Ast::if_else(condition, then_do, else_do));
        }

        let base = self.parse_or()?;
        if !self.check(&Token::Pipe) {
            return Ok(base);
        }

        let mut steps = Vec::new();
        while self.check(&Token::Pipe) {
            self.advance()?;
            steps.push(self.parse_call()?);
        }
        Ok(Ast::pipeline(base, steps))
    }

    fn parse_call(&mut self) -> Result<OpCall, ParseError> {
        let namespace = self.parse_key()?;
        self.expect(Token::Dot, "'.'")?;
        let name = self.parse_key()?;
        self.expect(Token::LParen, "'('")?;
        let kwargs = self.parse_entries(Token::RParen, "')'")?;
        Ok(OpCall::new(namespace, name, kwargs))
    }

    /// `key=value` pairs up to and including `close`.
    fn parse_entries(&mut self, close: Token, description: &'static str) -> Result<Dict, ParseError> {
        let mut dict = Dict::default();

        while !self.check(&close) {
            let key = self.parse_key()?;
            self.expect(Token::Assign, "'='")?;
            let value = self.parse_expression()?;
            dict.values.insert(key, value);

            if self.check(&Token::Comma) {
                self.advance()?;
            } else if !self.check(&close) {
                return self.unexpected(description);
            }
        }

        self.advance()?;
        Ok(dict)
    }

    fn parse_or(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.advance()?;
            let right = self.parse_and()?;
            left = Ast::binary(left, BinOp::Or.symbol(), right);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_comparison()?;

        while self.check(&Token::And) {
            self.advance()?;
            let right = self.parse_comparison()?;
            left = Ast::binary(left, BinOp::And.symbol(), right);
        }

        Ok(left)
    }

    // comparisons do not chain
    fn parse_comparison(&mut self) -> Result<Ast, ParseError> {
        let left = self.parse_additive()?;

        let op = match self.current_token {
            Token::EqEq => BinOp::Equal,
            Token::NotEq => BinOp::NotEqual,
            Token::Lt => BinOp::LessThan,
            Token::Gt => BinOp::GreaterThan,
            Token::LtEq => BinOp::LessEqual,
            Token::GtEq => BinOp::GreaterEqual,
            _ => return Ok(left),
        };
        self.advance()?;

        let right = self.parse_additive()?;
        Ok(Ast::binary(left, op.symbol(), right))
    }

    fn parse_additive(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Ast::binary(left, op.symbol(), right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_postfix()?;

        loop {
            let op = match self.current_token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_postfix()?;
            left = Ast::binary(left, op.symbol(), right);
        }

        Ok(left)
    }

    fn parse_postfix(&mut self) -> Result<Ast, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_token {
                Token::Dot => {
                    self.advance()?;
                    let key = self.parse_key()?;
                    expr = Ast::lookup(expr, key);
                }
                Token::LBracket => {
                    self.advance()?;
                    let key = self.parse_expression()?;
                    self.expect(Token::RBracket, "']'")?;
                    expr = Ast::binary(expr, BinOp::Index.symbol(), key);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Ast, ParseError> {
        let position = self.position;

        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Integer(n) => {
                self.advance()?;
                let n = i64::try_from(n).map_err(|_| ParseError::IntegerOverflow {
                    text: n.to_string(),
                    position,
                })?;
                Ok(Ast::int(n))
            }
            Token::Float(d) => {
                self.advance()?;
                Ok(Ast::double(d))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Ast::string(s))
            }
            Token::Boolean(b) => {
                self.advance()?;
                Ok(Ast::bool(b))
            }

            // Negative literals; there is no unary minus
            Token::Minus => {
                self.advance()?;
                match self.current_token {
                    Token::Integer(n) => {
                        self.advance()?;
                        let n = 0i64
                            .checked_sub_unsigned(n)
                            .ok_or_else(|| ParseError::IntegerOverflow {
                                text: format!("-{}", n),
                                position,
                            })?;
                        Ok(Ast::int(n))
                    }
                    Token::Float(d) => {
                        self.advance()?;
                        Ok(Ast::double(-d))
                    }
                    _ => self.unexpected("a number after '-'"),
                }
            }

            Token::Var(name) => {
                self.advance()?;
                Ok(Ast::var(name))
            }
            Token::At => {
                self.advance()?;
                Ok(Ast::At)
            }

            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::LBracket => {
                self.advance()?;
                let mut values = Vec::new();
                while !self.check(&Token::RBracket) {
                    values.push(self.parse_expression()?);
                    if self.check(&Token::Comma) {
                        self.advance()?;
                    } else if !self.check(&Token::RBracket) {
                        return self.unexpected("',' or ']'");
                    }
                }
                self.advance()?;
                Ok(Ast::List { values })
            }
            Token::LBrace => {
                self.advance()?;
                Ok(Ast::Dict(self.parse_entries(Token::RBrace, "',' or '}'")?))
            }
            Token::Table => {
                self.advance()?;
                self.expect(Token::LParen, "'('")?;
                let inner = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(Ast::table(inner))
            }

            token => {
                self.current_token = token;
                self.unexpected("an expression")
            }
        }
    }
}

/// Parses debug text into a query.
///
/// ```
/// use rql::parser::parse_query;
/// use rql::wire::{Ast, Statement};
///
/// let query = parse_query("a = 1;\n$a + 2").unwrap();
/// assert_eq!(query.statements, vec![Statement::new("a", Ast::int(1))]);
/// assert_eq!(query.terminal, Ast::binary(Ast::var("a"), "+", Ast::int(2)));
/// ```
pub fn parse_query(text: &str) -> Result<Query, ParseError> {
    Parser::new(Lexer::new(text))?.parse_query()
}

/// Parses a single expression.
pub fn parse_expression(text: &str) -> Result<Ast, ParseError> {
    Parser::new(Lexer::new(text))?.parse()
}
