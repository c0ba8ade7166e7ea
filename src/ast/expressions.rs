use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::ast::BinOp;
use crate::value::Constant;

/// Process-unique identity of a node.
///
/// Ids come from a monotonic counter and are never reused. They only ever
/// show up in the default label of an unnamed statement; no rendering
/// decision depends on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    pub(crate) fn fresh() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// The kind of an expression node, with its operands.
///
/// Operands are referenced by [`NodeId`]; the graph that owns the node owns
/// them too.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Literal constant
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 2.5
    /// true
    /// "hello"
    /// ```
    Constant(Constant),

    /// Binary operation (arithmetic, comparison, logical, indexing)
    ///
    /// # Examples
    /// ```text
    /// $a + $b
    /// $items[$i]
    /// ```
    Binary {
        left: NodeId,
        op: BinOp,
        right: NodeId,
    },

    /// Field lookup with a constant key
    ///
    /// # Example
    /// ```text
    /// $args.actions
    /// ```
    Lookup { on: NodeId, key: String },

    /// List literal
    ///
    /// # Example
    /// ```text
    /// [1, $x, "y"]
    /// ```
    List(Vec<NodeId>),

    /// Dict literal; keys keep their insertion order
    ///
    /// # Example
    /// ```text
    /// {x=1, y=$b}
    /// ```
    Dict(IndexMap<String, NodeId>),

    /// Table built from a list of rows
    ///
    /// # Example
    /// ```text
    /// table([{x=1}, {x=2}])
    /// ```
    Table(NodeId),

    /// Free variable, bound to a constant at render time
    ///
    /// # Example
    /// ```text
    /// $uid
    /// ```
    Var(String),

    /// The current row/value inside an operator call argument (`@`)
    ///
    /// # Example
    /// ```text
    /// $t | std.filter(where=@.x > 1)
    /// ```
    Placeholder,

    /// Operator call; only valid as a step of a [`NodeKind::Pipeline`]
    ///
    /// # Example
    /// ```text
    /// std.take(count=10)
    /// ```
    OpCall {
        namespace: String,
        name: String,
        kwargs: IndexMap<String, NodeId>,
    },

    /// A base expression piped through operator calls, in order
    ///
    /// # Example
    /// ```text
    /// $t | std.filter(where=@.x > 1) | std.take(count=1)
    /// ```
    Pipeline { base: NodeId, steps: Vec<NodeId> },

    /// Conditional expression
    ///
    /// # Example
    /// ```text
    /// if $x > 1 then "big" else "small"
    /// ```
    Conditional {
        condition: NodeId,
        then: NodeId,
        otherwise: NodeId,
    },
}

impl NodeKind {
    /// Operands in edge order. A node used twice by the same consumer is
    /// listed twice.
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Constant(_) | NodeKind::Var(_) | NodeKind::Placeholder => vec![],
            NodeKind::Binary { left, right, .. } => vec![*left, *right],
            NodeKind::Lookup { on, .. } => vec![*on],
            NodeKind::List(values) => values.clone(),
            NodeKind::Dict(entries) => entries.values().copied().collect(),
            NodeKind::Table(inner) => vec![*inner],
            NodeKind::OpCall { kwargs, .. } => kwargs.values().copied().collect(),
            NodeKind::Pipeline { base, steps } => {
                let mut operands = Vec::with_capacity(steps.len() + 1);
                operands.push(*base);
                operands.extend(steps.iter().copied());
                operands
            }
            NodeKind::Conditional {
                condition,
                then,
                otherwise,
            } => vec![*condition, *then, *otherwise],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Constant(_) => "constant",
            NodeKind::Binary { .. } => "binary",
            NodeKind::Lookup { .. } => "lookup",
            NodeKind::List(_) => "list",
            NodeKind::Dict(_) => "dict",
            NodeKind::Table(_) => "table",
            NodeKind::Var(_) => "var",
            NodeKind::Placeholder => "placeholder",
            NodeKind::OpCall { .. } => "opcall",
            NodeKind::Pipeline { .. } => "pipeline",
            NodeKind::Conditional { .. } => "conditional",
        }
    }

    /// Whether the node may stand in an expression position. Operator calls
    /// only exist as pipeline steps.
    pub fn is_value(&self) -> bool {
        !matches!(self, NodeKind::OpCall { .. })
    }

    /// Whether the node may carry a statement name.
    pub fn is_nameable(&self) -> bool {
        !matches!(
            self,
            NodeKind::Var(_) | NodeKind::Placeholder | NodeKind::OpCall { .. }
        )
    }
}

/// A vertex of the expression graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    name: Option<String>,
    kind: NodeKind,
    fan_out: usize,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Node {
            id,
            name: None,
            kind,
            fan_out: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Caller-supplied statement name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Number of distinct nodes that use this one as an operand.
    pub fn fan_out(&self) -> usize {
        self.fan_out
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn add_consumer(&mut self) {
        self.fan_out += 1;
    }
}
