//! Memoized traversal over an expression graph.
//!
//! A back end implements [`Visitor`]: one handler per node kind, each
//! receiving the node's own data and the already-computed results of its
//! operands. [`Traversal`] walks the graph post-order, dispatches to the
//! handlers and caches every result by node id, so a node reachable along
//! several paths is computed once and every consumer sees the same value.
//!
//! Operator calls are visited through [`Traversal::visit_call`] and produce a
//! [`Visitor::Call`]; they are only reachable as pipeline steps. Visiting one
//! as a value fails with [`RenderError::DetachedOpCall`].

use std::collections::HashMap;

use crate::ast::{BinOp, Node, NodeId, NodeKind};
use crate::extract::RenderError;
use crate::graph::Graph;
use crate::value::Constant;

/// Per-kind handlers of a back end.
///
/// Handlers never see the graph itself; they only combine operand results.
pub trait Visitor {
    /// Result of visiting a value node.
    type Output: Clone;
    /// Result of visiting an operator call.
    type Call: Clone;

    fn constant(&mut self, value: &Constant) -> Self::Output;
    fn binary(&mut self, op: BinOp, left: Self::Output, right: Self::Output) -> Self::Output;
    fn lookup(&mut self, on: Self::Output, key: &str) -> Self::Output;
    fn list(&mut self, values: Vec<Self::Output>) -> Self::Output;
    fn dict(&mut self, entries: Vec<(String, Self::Output)>) -> Self::Output;
    fn table(&mut self, inner: Self::Output) -> Self::Output;
    fn var(&mut self, name: &str) -> Self::Output;
    fn placeholder(&mut self) -> Self::Output;
    fn op_call(
        &mut self,
        namespace: &str,
        name: &str,
        kwargs: Vec<(String, Self::Output)>,
    ) -> Self::Call;
    fn pipeline(&mut self, base: Self::Output, steps: Vec<Self::Call>) -> Self::Output;
    fn conditional(
        &mut self,
        condition: Self::Output,
        then: Self::Output,
        otherwise: Self::Output,
    ) -> Self::Output;
}

/// Post-processing applied to a value node after its handler ran, before
/// the result is cached. Statement extraction plugs in here.
pub trait Finish<V: Visitor> {
    fn finish(
        &mut self,
        visitor: &mut V,
        node: &Node,
        body: V::Output,
    ) -> Result<V::Output, RenderError>;
}

/// Leaves every result where it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inline;

impl<V: Visitor> Finish<V> for Inline {
    fn finish(&mut self, _: &mut V, _: &Node, body: V::Output) -> Result<V::Output, RenderError> {
        Ok(body)
    }
}

/// One pass of a visitor over a graph.
pub struct Traversal<'g, V: Visitor> {
    graph: &'g Graph,
    visitor: V,
    values: HashMap<NodeId, V::Output>,
    calls: HashMap<NodeId, V::Call>,
}

impl<'g, V: Visitor> Traversal<'g, V> {
    pub fn new(graph: &'g Graph, visitor: V) -> Self {
        Traversal {
            graph,
            visitor,
            values: HashMap::new(),
            calls: HashMap::new(),
        }
    }

    pub fn visitor_mut(&mut self) -> &mut V {
        &mut self.visitor
    }

    pub fn into_visitor(self) -> V {
        self.visitor
    }

    /// Cached result of a value node visited earlier in this pass.
    pub fn cached(&self, id: NodeId) -> Option<&V::Output> {
        self.values.get(&id)
    }

    /// Visits a value node, operands first.
    pub fn visit<H: Finish<V>>(&mut self, id: NodeId, hook: &mut H) -> Result<V::Output, RenderError> {
        if let Some(done) = self.values.get(&id) {
            return Ok(done.clone());
        }

        let graph = self.graph;
        let node = graph.get(id)?;

        let body = match node.kind() {
            NodeKind::Constant(value) => self.visitor.constant(value),
            NodeKind::Binary { left, op, right } => {
                let left = self.visit(*left, hook)?;
                let right = self.visit(*right, hook)?;
                self.visitor.binary(*op, left, right)
            }
            NodeKind::Lookup { on, key } => {
                let on = self.visit(*on, hook)?;
                self.visitor.lookup(on, key)
            }
            NodeKind::List(values) => {
                let values = values
                    .iter()
                    .map(|value| self.visit(*value, hook))
                    .collect::<Result<Vec<_>, _>>()?;
                self.visitor.list(values)
            }
            NodeKind::Dict(entries) => {
                let entries = self.visit_entries(entries.iter(), hook)?;
                self.visitor.dict(entries)
            }
            NodeKind::Table(inner) => {
                let inner = self.visit(*inner, hook)?;
                self.visitor.table(inner)
            }
            NodeKind::Var(name) => self.visitor.var(name),
            NodeKind::Placeholder => self.visitor.placeholder(),
            NodeKind::OpCall { namespace, name, .. } => {
                return Err(RenderError::DetachedOpCall {
                    namespace: namespace.clone(),
                    name: name.clone(),
                });
            }
            NodeKind::Pipeline { base, steps } => {
                let base = self.visit(*base, hook)?;
                let steps = steps
                    .iter()
                    .map(|step| self.visit_call(*step, hook))
                    .collect::<Result<Vec<_>, _>>()?;
                self.visitor.pipeline(base, steps)
            }
            NodeKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.visit(*condition, hook)?;
                let then = self.visit(*then, hook)?;
                let otherwise = self.visit(*otherwise, hook)?;
                self.visitor.conditional(condition, then, otherwise)
            }
        };

        let result = hook.finish(&mut self.visitor, node, body)?;
        self.values.insert(id, result.clone());
        Ok(result)
    }

    /// Visits an operator call reached as a pipeline step.
    pub fn visit_call<H: Finish<V>>(&mut self, id: NodeId, hook: &mut H) -> Result<V::Call, RenderError> {
        if let Some(done) = self.calls.get(&id) {
            return Ok(done.clone());
        }

        let graph = self.graph;
        let node = graph.get(id)?;
        let NodeKind::OpCall {
            namespace,
            name,
            kwargs,
        } = node.kind()
        else {
            return Err(RenderError::NotAnOpCall(id));
        };

        let kwargs = self.visit_entries(kwargs.iter(), hook)?;
        let call = self.visitor.op_call(namespace, name, kwargs);
        self.calls.insert(id, call.clone());
        Ok(call)
    }

    fn visit_entries<'a, H: Finish<V>>(
        &mut self,
        entries: impl Iterator<Item = (&'a String, &'a NodeId)>,
        hook: &mut H,
    ) -> Result<Vec<(String, V::Output)>, RenderError> {
        entries
            .map(|(key, value)| Ok((key.clone(), self.visit(*value, hook)?)))
            .collect()
    }
}
