//! Wire schema sent to the query engine.
//!
//! The message tree mirrors the node kinds one-to-one. Node ids never
//! appear here; statements are identified by name only. All containers are
//! ordered, so the same graph always encodes to the same bytes.
//!
//! The binary form is postcard over the serde derive; JSON is available for
//! inspecting what goes over the wire.
//!
//! # Examples
//!
//! ```
//! use rql::wire::{Ast, Query, Statement};
//!
//! let query = Query {
//!     statements: vec![Statement::new("a", Ast::int(1))],
//!     terminal: Ast::binary(Ast::var("a"), "+", Ast::int(2)),
//! };
//!
//! let bytes = query.to_bytes().unwrap();
//! assert_eq!(Query::from_bytes(&bytes).unwrap(), query);
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to encode query: {0}")]
    Encode(#[source] postcard::Error),

    #[error("failed to decode query: {0}")]
    Decode(#[source] postcard::Error),

    #[error("failed to convert query to JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Constant leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Atom {
    Int(i64),
    Double(f64),
    Bool(bool),
    String(String),
}

/// Ordered name → expression map, used by dict literals and operator
/// arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dict {
    pub values: IndexMap<String, Ast>,
}

impl<K: Into<String>> FromIterator<(K, Ast)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, Ast)>>(iter: I) -> Self {
        Dict {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Operator call. `operand` is empty while the call is a pipeline step and
/// set once pipelines are lowered into call chains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpCall {
    pub operand: Option<Box<Ast>>,
    pub namespace: String,
    pub name: String,
    pub kwargs: Dict,
}

impl OpCall {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kwargs: Dict) -> Self {
        OpCall {
            operand: None,
            namespace: namespace.into(),
            name: name.into(),
            kwargs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ast {
    Atom(Atom),
    Binary {
        left: Box<Ast>,
        op: String,
        right: Box<Ast>,
    },
    Lookup {
        on: Box<Ast>,
        property: String,
    },
    List {
        values: Vec<Ast>,
    },
    Dict(Dict),
    Table {
        inner: Box<Ast>,
    },
    /// Reference to a statement or a bound variable
    Var {
        name: String,
    },
    /// `@`
    At,
    OpCall(OpCall),
    Pipeline {
        base: Box<Ast>,
        steps: Vec<OpCall>,
    },
    IfElse {
        condition: Box<Ast>,
        then_do: Box<Ast>,
        else_do: Box<Ast>,
    },
}

impl Ast {
    pub fn int(n: i64) -> Self {
        Ast::Atom(Atom::Int(n))
    }

    pub fn double(d: f64) -> Self {
        Ast::Atom(Atom::Double(d))
    }

    pub fn bool(b: bool) -> Self {
        Ast::Atom(Atom::Bool(b))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Ast::Atom(Atom::String(s.into()))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Ast::Var { name: name.into() }
    }

    pub fn binary(left: Ast, op: impl Into<String>, right: Ast) -> Self {
        Ast::Binary {
            left: Box::new(left),
            op: op.into(),
            right: Box::new(right),
        }
    }

    pub fn lookup(on: Ast, property: impl Into<String>) -> Self {
        Ast::Lookup {
            on: Box::new(on),
            property: property.into(),
        }
    }

    pub fn list(values: impl IntoIterator<Item = Ast>) -> Self {
        Ast::List {
            values: values.into_iter().collect(),
        }
    }

    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, Ast)>) -> Self {
        Ast::Dict(entries.into_iter().collect())
    }

    pub fn table(inner: Ast) -> Self {
        Ast::Table {
            inner: Box::new(inner),
        }
    }

    pub fn pipeline(base: Ast, steps: impl IntoIterator<Item = OpCall>) -> Self {
        Ast::Pipeline {
            base: Box::new(base),
            steps: steps.into_iter().collect(),
        }
    }

    pub fn if_else(condition: Ast, then_do: Ast, else_do: Ast) -> Self {
        Ast::IfElse {
            condition: Box::new(condition),
            then_do: Box::new(then_do),
            else_do: Box::new(else_do),
        }
    }

    /// Rewrites every pipeline into the nested call chain the engine
    /// evaluates: each step takes the previous stage as its operand.
    ///
    /// ```
    /// use rql::wire::{Ast, Dict, OpCall};
    ///
    /// let take = OpCall::new("std", "take", Dict::default());
    /// let lowered = Ast::pipeline(Ast::var("t"), [take]).lower_pipelines();
    ///
    /// let Ast::OpCall(call) = lowered else { panic!("expected a call") };
    /// assert_eq!(call.operand.as_deref(), Some(&Ast::var("t")));
    /// ```
    pub fn lower_pipelines(self) -> Ast {
        match self {
            Ast::Atom(_) | Ast::Var { .. } | Ast::At => self,
            Ast::Binary { left, op, right } => Ast::Binary {
                left: Box::new(left.lower_pipelines()),
                op,
                right: Box::new(right.lower_pipelines()),
            },
            Ast::Lookup { on, property } => Ast::Lookup {
                on: Box::new(on.lower_pipelines()),
                property,
            },
            Ast::List { values } => Ast::List {
                values: values.into_iter().map(Ast::lower_pipelines).collect(),
            },
            Ast::Dict(dict) => Ast::Dict(dict.lower_pipelines()),
            Ast::Table { inner } => Ast::table(inner.lower_pipelines()),
            Ast::OpCall(call) => Ast::OpCall(call.lower_pipelines()),
            Ast::Pipeline { base, steps } => {
                steps.into_iter().fold(base.lower_pipelines(), |stage, step| {
                    let mut call = step.lower_pipelines();
                    call.operand = Some(Box::new(stage));
                    Ast::OpCall(call)
                })
            }
            Ast::IfElse {
                condition,
                then_do,
                else_do,
            } => Ast::if_else(
                condition.lower_pipelines(),
                then_do.lower_pipelines(),
                else_do.lower_pipelines(),
            ),
        }
    }
}

impl Dict {
    fn lower_pipelines(self) -> Dict {
        Dict {
            values: self
                .values
                .into_iter()
                .map(|(k, v)| (k, v.lower_pipelines()))
                .collect(),
        }
    }
}

impl OpCall {
    fn lower_pipelines(self) -> OpCall {
        OpCall {
            operand: self.operand.map(|operand| Box::new(operand.lower_pipelines())),
            namespace: self.namespace,
            name: self.name,
            kwargs: self.kwargs.lower_pipelines(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub name: String,
    pub body: Ast,
}

impl Statement {
    pub fn new(name: impl Into<String>, body: Ast) -> Self {
        Statement {
            name: name.into(),
            body,
        }
    }
}

/// A compiled query: statements in dependency order, then the terminal
/// expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub statements: Vec<Statement>,
    #[serde(rename = "final")]
    pub terminal: Ast,
}

impl Query {
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        postcard::to_allocvec(self).map_err(WireError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        postcard::from_bytes(bytes).map_err(WireError::Decode)
    }

    pub fn to_json(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// [`Ast::lower_pipelines`] applied to every statement and the terminal.
    pub fn lower_pipelines(self) -> Query {
        Query {
            statements: self
                .statements
                .into_iter()
                .map(|s| Statement::new(s.name, s.body.lower_pipelines()))
                .collect(),
            terminal: self.terminal.lower_pipelines(),
        }
    }
}
