use std::fmt;

/// Words that cannot be used as statement or variable names.
pub const KEYWORDS: [&str; 8] = ["and", "or", "true", "false", "if", "then", "else", "table"];

/// Lexical tokens of the debug text grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 2.5
    /// 1e20
    /// ```
    Float(f64),

    /// Unsigned integer magnitude; a leading `-` is a separate token
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 9223372036854775808
    /// ```
    Integer(u64),

    /// String literal enclosed in double quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "say \"hi\""
    /// ```
    String(String),

    /// Boolean values
    Boolean(bool),

    // Identifiers and references
    /// Reference to a statement or a free variable
    ///
    /// # Examples
    /// ```text
    /// $a
    /// $_0000002a
    /// ```
    Var(String),

    /// Statement name, lookup key, dict key, argument name or operator name
    ///
    /// # Examples
    /// ```text
    /// uid
    /// std
    /// ```
    Identifier(String),

    /// Placeholder for the current row inside an operator call (`@`)
    At,

    // Keywords
    /// Logical AND (word, not symbol)
    And,
    /// Logical OR (word, not symbol)
    Or,
    /// `if` of a conditional
    If,
    /// `then` of a conditional
    Then,
    /// `else` of a conditional
    Else,
    /// `table(...)` constructor
    Table,

    // Operators
    /// Pipeline operator
    ///
    /// # Example
    /// ```text
    /// $t | std.take(count=1)
    /// ```
    Pipe,
    /// Statement assignment, dict entries and keyword arguments (`=`)
    Assign,
    /// Statement terminator
    Semicolon,

    // Comparison
    /// Equality operator
    EqEq,
    /// Inequality operator
    NotEq,
    /// Less than
    Lt,
    /// Greater than
    Gt,
    /// Less than or equal
    LtEq,
    /// Greater than or equal
    GtEq,

    // Arithmetic
    /// Addition
    Plus,
    /// Subtraction, or the sign of a negative literal
    Minus,
    /// Multiplication
    Star,
    /// Division
    Slash,
    /// Modulo
    Percent,

    // Delimiters
    /// Left bracket for lists and indexing
    LBracket,
    /// Right bracket
    RBracket,
    /// Left parenthesis for grouping and calls
    LParen,
    /// Right parenthesis
    RParen,
    /// Left brace for dict literals
    LBrace,
    /// Right brace
    RBrace,
    /// Dot for lookups and operator namespaces
    Dot,
    /// Comma separating elements and arguments
    Comma,

    /// End of input
    Eof,
}

impl Token {
    /// The spelling of a keyword token. Keywords are accepted wherever a key
    /// is expected, so `$row.table` is a lookup of the key `table`.
    pub fn keyword_text(&self) -> Option<&'static str> {
        match self {
            Token::And => Some("and"),
            Token::Or => Some("or"),
            Token::If => Some("if"),
            Token::Then => Some("then"),
            Token::Else => Some("else"),
            Token::Table => Some("table"),
            Token::Boolean(true) => Some("true"),
            Token::Boolean(false) => Some("false"),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Float(n) => write!(f, "number {:?}", n),
            Token::Integer(n) => write!(f, "number {}", n),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Var(name) => write!(f, "'${}'", name),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::At => f.write_str("'@'"),
            Token::Pipe => f.write_str("'|'"),
            Token::Assign => f.write_str("'='"),
            Token::Semicolon => f.write_str("';'"),
            Token::EqEq => f.write_str("'=='"),
            Token::NotEq => f.write_str("'!='"),
            Token::Lt => f.write_str("'<'"),
            Token::Gt => f.write_str("'>'"),
            Token::LtEq => f.write_str("'<='"),
            Token::GtEq => f.write_str("'>='"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Percent => f.write_str("'%'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::Dot => f.write_str("'.'"),
            Token::Comma => f.write_str("','"),
            Token::Eof => f.write_str("end of input"),
            keyword => match keyword.keyword_text() {
                Some(text) => write!(f, "keyword '{}'", text),
                None => write!(f, "{:?}", keyword),
            },
        }
    }
}
