/// A constant leaf of the expression graph.
///
/// Constants are the only values a free variable may be bound to, and the
/// only leaves the wire schema carries as atoms.
///
/// # Examples
///
/// ```
/// use rql::Constant;
///
/// let int = Constant::from(42);
/// let double = Constant::from(2.5);
/// let boolean = Constant::from(true);
/// let string = Constant::from("hello");
///
/// assert_eq!(int, Constant::Int(42));
/// assert_eq!(string.type_name(), "string");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// 64-bit signed integer
    Int(i64),

    /// Floating-point number
    Double(f64),

    /// Boolean (`true`/`false`)
    Bool(bool),

    /// UTF-8 string
    String(String),
}

impl Constant {
    /// Returns a human-readable type name for the constant
    pub fn type_name(&self) -> &'static str {
        match self {
            Constant::Int(_) => "int",
            Constant::Double(_) => "double",
            Constant::Bool(_) => "bool",
            Constant::String(_) => "string",
        }
    }
}

impl From<i64> for Constant {
    fn from(n: i64) -> Self {
        Constant::Int(n)
    }
}

impl From<i32> for Constant {
    fn from(n: i32) -> Self {
        Constant::Int(n.into())
    }
}

impl From<f64> for Constant {
    fn from(d: f64) -> Self {
        Constant::Double(d)
    }
}

impl From<bool> for Constant {
    fn from(b: bool) -> Self {
        Constant::Bool(b)
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Constant::String(s.to_string())
    }
}

impl From<String> for Constant {
    fn from(s: String) -> Self {
        Constant::String(s)
    }
}
