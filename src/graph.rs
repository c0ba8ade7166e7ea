//! Expression graph construction.
//!
//! A [`GraphBuilder`] hands out [`NodeId`]s for every node it creates and
//! records, for every operand, how many distinct nodes consume it. Once the
//! query is assembled, [`GraphBuilder::finish`] freezes it into a [`Graph`]
//! whose fan-out counts no longer change.
//!
//! # Examples
//!
//! ```
//! use rql::GraphBuilder;
//!
//! let mut b = GraphBuilder::new();
//! let one = b.int(1);
//! let x = b.var("x").unwrap();
//! let sum = b.add(one, x).unwrap();
//! let sum = b.named(sum, "total").unwrap();
//!
//! let graph = b.finish();
//! assert_eq!(graph.node(one).unwrap().fan_out(), 1);
//! assert_eq!(graph.node(sum).unwrap().name(), Some("total"));
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use thiserror::Error;

use crate::ast::{BinOp, KEYWORDS, Node, NodeId, NodeKind};
use crate::extract::RenderError;
use crate::value::Constant;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Errors raised while a graph is being built. Each one is reported by the
/// call that introduced the bad value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// An operand is not a value expression of this graph
    #[error("operand {operand} of {construct} is not a value expression of this graph")]
    InvalidOperand {
        construct: &'static str,
        operand: NodeId,
    },

    #[error("list element at index {index} is not a value expression of this graph")]
    InvalidListElement { index: usize },

    #[error("dict value for key '{key}' is not a value expression of this graph")]
    InvalidDictValue { key: String },

    #[error("value for operator argument '{key}' is not a value expression of this graph")]
    InvalidOpArgument { key: String },

    #[error("pipeline step at index {index} is not an operator call of this graph")]
    InvalidPipelineStep { index: usize },

    /// Names and keys must be identifiers; names must not be keywords
    #[error("'{name}' is not a valid {what}")]
    InvalidName { what: &'static str, name: String },

    #[error("node {id} is already named '{name}'")]
    NameAlreadySet { id: NodeId, name: String },

    #[error("{kind} nodes cannot be named")]
    Unnameable { kind: &'static str },

    #[error("node {0} does not belong to this graph")]
    UnknownNode(NodeId),

    #[error("operator '{namespace}.{name}' is not registered")]
    UnregisteredOperator { namespace: String, name: String },

    #[error("cannot open a query scope while another one is active")]
    NestedScope,

    #[error("query scope has no top-level expressions")]
    EmptyScope,
}

/// Checks a statement or variable name.
pub(crate) fn validate_name(what: &'static str, name: &str) -> Result<(), BuildError> {
    if IDENTIFIER.is_match(name) && !KEYWORDS.contains(&name) {
        Ok(())
    } else {
        Err(BuildError::InvalidName {
            what,
            name: name.to_string(),
        })
    }
}

/// Checks a lookup key, dict key, argument name or operator name.
pub(crate) fn validate_key(what: &'static str, key: &str) -> Result<(), BuildError> {
    if IDENTIFIER.is_match(key) {
        Ok(())
    } else {
        Err(BuildError::InvalidName {
            what,
            name: key.to_string(),
        })
    }
}

/// Operators the remote engine knows, as `namespace.name` pairs.
///
/// # Examples
///
/// ```
/// use rql::OperatorRegistry;
///
/// let registry = OperatorRegistry::standard().register("geo", "near");
/// assert!(registry.contains("std", "take"));
/// assert!(registry.contains("geo", "near"));
/// assert!(!registry.contains("std", "near"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorRegistry {
    operators: IndexSet<(String, String)>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `std.filter` and `std.take`.
    pub fn standard() -> Self {
        Self::new().register("std", "filter").register("std", "take")
    }

    pub fn register(mut self, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        self.operators.insert((namespace.into(), name.into()));
        self
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.operators
            .iter()
            .any(|(ns, op)| ns == namespace && op == name)
    }

    /// Registered operators in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.operators
            .iter()
            .map(|(ns, op)| (ns.as_str(), op.as_str()))
    }
}

/// Mutable handle used to assemble an expression graph.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: IndexMap<NodeId, Node>,
    operators: Option<OperatorRegistry>,
}

impl GraphBuilder {
    /// A builder that accepts any well-formed operator call.
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder that rejects operator calls missing from `operators`.
    pub fn with_operators(operators: OperatorRegistry) -> Self {
        GraphBuilder {
            nodes: IndexMap::new(),
            operators: Some(operators),
        }
    }

    pub fn operators(&self) -> Option<&OperatorRegistry> {
        self.operators.as_ref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Gives a node a statement name, forcing it to be hoisted into a
    /// statement of its own. A node can be named once.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), BuildError> {
        let name = name.into();
        let node = self.nodes.get_mut(&id).ok_or(BuildError::UnknownNode(id))?;

        if !node.kind().is_nameable() {
            return Err(BuildError::Unnameable {
                kind: node.kind().kind_name(),
            });
        }
        if let Some(existing) = node.name() {
            return Err(BuildError::NameAlreadySet {
                id,
                name: existing.to_string(),
            });
        }
        validate_name("statement name", &name)?;

        node.set_name(name);
        Ok(())
    }

    /// [`set_name`](Self::set_name) that hands the id back, for chaining.
    pub fn named(&mut self, id: NodeId, name: impl Into<String>) -> Result<NodeId, BuildError> {
        self.set_name(id, name)?;
        Ok(id)
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::fresh();

        // fan-out counts distinct consumers, so `a + a` adds one edge
        let mut seen = HashSet::new();
        for operand in kind.operands() {
            if seen.insert(operand) {
                if let Some(node) = self.nodes.get_mut(&operand) {
                    node.add_consumer();
                }
            }
        }

        self.nodes.insert(id, Node::new(id, kind));
        id
    }

    fn is_value(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|node| node.kind().is_value())
    }

    fn check_operand(&self, construct: &'static str, operand: NodeId) -> Result<(), BuildError> {
        if self.is_value(operand) {
            Ok(())
        } else {
            Err(BuildError::InvalidOperand { construct, operand })
        }
    }

    // Literals

    pub fn constant(&mut self, value: impl Into<Constant>) -> NodeId {
        self.insert(NodeKind::Constant(value.into()))
    }

    pub fn int(&mut self, n: i64) -> NodeId {
        self.constant(Constant::Int(n))
    }

    pub fn double(&mut self, d: f64) -> NodeId {
        self.constant(Constant::Double(d))
    }

    pub fn bool(&mut self, b: bool) -> NodeId {
        self.constant(Constant::Bool(b))
    }

    pub fn string(&mut self, s: impl Into<String>) -> NodeId {
        self.constant(Constant::String(s.into()))
    }

    // Operators

    pub fn binary(&mut self, left: NodeId, op: BinOp, right: NodeId) -> Result<NodeId, BuildError> {
        let construct = if op == BinOp::Index { "'[]'" } else { "binary operation" };
        self.check_operand(construct, left)?;
        self.check_operand(construct, right)?;
        Ok(self.insert(NodeKind::Binary { left, op, right }))
    }

    pub fn add(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::Add, right)
    }

    pub fn sub(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::Subtract, right)
    }

    pub fn mul(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::Multiply, right)
    }

    pub fn div(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::Divide, right)
    }

    pub fn rem(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::Modulo, right)
    }

    pub fn and(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::And, right)
    }

    pub fn or(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::Or, right)
    }

    pub fn eq(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::Equal, right)
    }

    pub fn ne(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::NotEqual, right)
    }

    pub fn lt(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::LessThan, right)
    }

    pub fn le(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::LessEqual, right)
    }

    pub fn gt(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::GreaterThan, right)
    }

    pub fn ge(&mut self, left: NodeId, right: NodeId) -> Result<NodeId, BuildError> {
        self.binary(left, BinOp::GreaterEqual, right)
    }

    /// Indexing with a computed key: `on[key]`.
    pub fn index(&mut self, on: NodeId, key: NodeId) -> Result<NodeId, BuildError> {
        self.binary(on, BinOp::Index, key)
    }

    /// Field lookup with a constant key: `on.key`.
    pub fn lookup(&mut self, on: NodeId, key: &str) -> Result<NodeId, BuildError> {
        self.check_operand("lookup", on)?;
        validate_key("lookup key", key)?;
        Ok(self.insert(NodeKind::Lookup {
            on,
            key: key.to_string(),
        }))
    }

    // Collections

    pub fn list(&mut self, values: impl IntoIterator<Item = NodeId>) -> Result<NodeId, BuildError> {
        let values: Vec<NodeId> = values.into_iter().collect();
        for (index, value) in values.iter().enumerate() {
            if !self.is_value(*value) {
                return Err(BuildError::InvalidListElement { index });
            }
        }
        Ok(self.insert(NodeKind::List(values)))
    }

    /// Dict literal. Entries keep the order they are given in; a repeated key
    /// keeps its first position and its last value.
    pub fn dict<K: Into<String>>(
        &mut self,
        entries: impl IntoIterator<Item = (K, NodeId)>,
    ) -> Result<NodeId, BuildError> {
        let mut values = IndexMap::new();
        for (key, value) in entries {
            let key = key.into();
            validate_key("dict key", &key)?;
            if !self.is_value(value) {
                return Err(BuildError::InvalidDictValue { key });
            }
            values.insert(key, value);
        }
        Ok(self.insert(NodeKind::Dict(values)))
    }

    pub fn table(&mut self, inner: NodeId) -> Result<NodeId, BuildError> {
        self.check_operand("table", inner)?;
        Ok(self.insert(NodeKind::Table(inner)))
    }

    // References

    /// Free variable, bound to a constant when the query is rendered.
    pub fn var(&mut self, name: &str) -> Result<NodeId, BuildError> {
        validate_name("variable name", name)?;
        Ok(self.insert(NodeKind::Var(name.to_string())))
    }

    /// `@`: the current row inside an operator call argument.
    pub fn placeholder(&mut self) -> NodeId {
        self.insert(NodeKind::Placeholder)
    }

    // Operator calls

    /// Operator call `namespace.name(kwargs…)`. The result can only be used
    /// as a step of [`pipeline`](Self::pipeline).
    pub fn op_call<K: Into<String>>(
        &mut self,
        namespace: &str,
        name: &str,
        kwargs: impl IntoIterator<Item = (K, NodeId)>,
    ) -> Result<NodeId, BuildError> {
        validate_key("operator namespace", namespace)?;
        validate_key("operator name", name)?;
        if let Some(registry) = &self.operators {
            if !registry.contains(namespace, name) {
                return Err(BuildError::UnregisteredOperator {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            }
        }

        let mut args = IndexMap::new();
        for (key, value) in kwargs {
            let key = key.into();
            validate_key("operator argument name", &key)?;
            if !self.is_value(value) {
                return Err(BuildError::InvalidOpArgument { key });
            }
            args.insert(key, value);
        }

        Ok(self.insert(NodeKind::OpCall {
            namespace: namespace.to_string(),
            name: name.to_string(),
            kwargs: args,
        }))
    }

    /// Pipes `base` through the given operator calls, in order.
    pub fn pipeline(
        &mut self,
        base: NodeId,
        steps: impl IntoIterator<Item = NodeId>,
    ) -> Result<NodeId, BuildError> {
        self.check_operand("pipeline", base)?;

        let steps: Vec<NodeId> = steps.into_iter().collect();
        for (index, step) in steps.iter().enumerate() {
            let is_call = self
                .nodes
                .get(step)
                .is_some_and(|node| matches!(node.kind(), NodeKind::OpCall { .. }));
            if !is_call {
                return Err(BuildError::InvalidPipelineStep { index });
            }
        }

        Ok(self.insert(NodeKind::Pipeline { base, steps }))
    }

    pub fn conditional(
        &mut self,
        condition: NodeId,
        then: NodeId,
        otherwise: NodeId,
    ) -> Result<NodeId, BuildError> {
        self.check_operand("conditional", condition)?;
        self.check_operand("conditional", then)?;
        self.check_operand("conditional", otherwise)?;
        Ok(self.insert(NodeKind::Conditional {
            condition,
            then,
            otherwise,
        }))
    }

    /// Value nodes nothing else consumes, in creation order.
    pub fn roots(&self) -> Vec<NodeId> {
        roots(&self.nodes)
    }

    /// Freezes the graph. Fan-out counts are final from here on.
    pub fn finish(self) -> Graph {
        Graph { nodes: self.nodes }
    }
}

fn roots(nodes: &IndexMap<NodeId, Node>) -> Vec<NodeId> {
    nodes
        .values()
        .filter(|node| {
            node.fan_out() == 0
                && !matches!(
                    node.kind(),
                    NodeKind::Var(_) | NodeKind::Placeholder | NodeKind::OpCall { .. }
                )
        })
        .map(Node::id)
        .collect()
}

/// A finished, immutable expression graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
}

impl Graph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn get(&self, id: NodeId) -> Result<&Node, RenderError> {
        self.nodes.get(&id).ok_or(RenderError::UnknownNode(id))
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Value nodes nothing else consumes, in creation order.
    pub fn roots(&self) -> Vec<NodeId> {
        roots(&self.nodes)
    }
}
