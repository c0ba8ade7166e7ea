use std::fmt;
use std::str::FromStr;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Comparison
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Greater than (`>`)
    GreaterThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than or equal (`>=`)
    GreaterEqual,

    // Arithmetic
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Modulo,

    // Logical
    /// Logical AND (`and`)
    And,
    /// Logical OR (`or`)
    Or,

    // Access
    /// Indexing with a computed key (`[]`)
    ///
    /// # Example
    /// ```text
    /// $items[$i]
    /// ```
    Index,
}

/// Binding strength of `or`.
pub const PREC_OR: u8 = 3;
/// Binding strength of `and`.
pub const PREC_AND: u8 = 4;
/// Binding strength of the comparison operators.
pub const PREC_COMPARISON: u8 = 5;
/// Binding strength of `+` and `-`.
pub const PREC_ADDITIVE: u8 = 6;
/// Binding strength of `*`, `/` and `%`.
pub const PREC_MULTIPLICATIVE: u8 = 7;
/// Binding strength of `.key` lookups and `[]` indexing.
pub const PREC_POSTFIX: u8 = 8;

impl BinOp {
    pub const ALL: [BinOp; 14] = [
        BinOp::Equal,
        BinOp::NotEqual,
        BinOp::LessThan,
        BinOp::GreaterThan,
        BinOp::LessEqual,
        BinOp::GreaterEqual,
        BinOp::Add,
        BinOp::Subtract,
        BinOp::Multiply,
        BinOp::Divide,
        BinOp::Modulo,
        BinOp::And,
        BinOp::Or,
        BinOp::Index,
    ];

    /// The operator as it appears in the wire schema and in debug text.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::GreaterThan => ">",
            BinOp::LessEqual => "<=",
            BinOp::GreaterEqual => ">=",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Index => "[]",
        }
    }

    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => PREC_OR,
            BinOp::And => PREC_AND,
            BinOp::Equal
            | BinOp::NotEqual
            | BinOp::LessThan
            | BinOp::GreaterThan
            | BinOp::LessEqual
            | BinOp::GreaterEqual => PREC_COMPARISON,
            BinOp::Add | BinOp::Subtract => PREC_ADDITIVE,
            BinOp::Multiply | BinOp::Divide | BinOp::Modulo => PREC_MULTIPLICATIVE,
            BinOp::Index => PREC_POSTFIX,
        }
    }

    /// Comparisons do not chain: `a < b < c` is not a valid expression.
    pub fn is_comparison(self) -> bool {
        self.precedence() == PREC_COMPARISON
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for BinOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BinOp::ALL
            .into_iter()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| format!("unknown binary operator '{}'", s))
    }
}
