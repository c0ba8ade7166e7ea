//! Values for free variables, supplied per render call.

use indexmap::IndexMap;

use crate::ast::{Node, NodeKind};
use crate::extract::{RenderError, UnboundReason};
use crate::value::Constant;

/// Insertion-ordered map from variable name to the constant it is bound to.
///
/// # Examples
///
/// ```
/// use rql::{Bindings, Constant};
///
/// let bindings = Bindings::new().bind("uid", 42).bind("name", "ana");
/// assert_eq!(bindings.get("uid"), Some(&Constant::Int(42)));
/// assert_eq!(bindings.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: IndexMap<String, Constant>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Constant>) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds `name`, returning the value it was bound to before.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Constant>,
    ) -> Option<Constant> {
        self.values.insert(name.into(), value.into())
    }

    /// Binds `name` to the value of a constant node.
    pub fn bind_node(mut self, name: impl Into<String>, node: &Node) -> Result<Self, RenderError> {
        let name = name.into();
        match node.kind() {
            NodeKind::Constant(value) => {
                self.values.insert(name, value.clone());
                Ok(self)
            }
            other => Err(RenderError::UnboundVariable {
                name,
                reason: UnboundReason::NotConstant(other.kind_name()),
            }),
        }
    }

    /// Reads bindings from a JSON object whose values are scalars.
    ///
    /// Integers that fit an `i64` become [`Constant::Int`], other numbers
    /// [`Constant::Double`].
    pub fn from_json(json: serde_json::Value) -> Result<Self, RenderError> {
        let serde_json::Value::Object(object) = json else {
            return Err(RenderError::InvalidBindings("expected a JSON object"));
        };

        let mut bindings = Bindings::new();
        for (name, value) in object {
            let constant = match value {
                serde_json::Value::Bool(b) => Constant::Bool(b),
                serde_json::Value::String(s) => Constant::String(s),
                serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => Constant::Int(i),
                    (None, Some(d)) => Constant::Double(d),
                    (None, None) => return Err(not_constant(name, "number out of range")),
                },
                serde_json::Value::Null => return Err(not_constant(name, "null")),
                serde_json::Value::Array(_) => return Err(not_constant(name, "array")),
                serde_json::Value::Object(_) => return Err(not_constant(name, "object")),
            };
            bindings.values.insert(name, constant);
        }
        Ok(bindings)
    }

    pub fn get(&self, name: &str) -> Option<&Constant> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Constant)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

fn not_constant(name: String, kind: &'static str) -> RenderError {
    RenderError::UnboundVariable {
        name,
        reason: UnboundReason::NotConstant(kind),
    }
}

impl<K: Into<String>, V: Into<Constant>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (name, value) in iter {
            bindings.insert(name, value);
        }
        bindings
    }
}
