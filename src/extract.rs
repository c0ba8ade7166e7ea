//! Statement extraction: the inline-or-hoist decision.
//!
//! Rendering a graph runs two passes:
//!
//! 1. An analysis pass that records, for every node, whether its body
//!    captures the placeholder `@` outside an operator call, and collects
//!    the free variables in the order the traversal first reaches them.
//! 2. The render pass proper, with an [`Extractor`] hooked into the
//!    traversal. A node used by more than one consumer, or carrying a name,
//!    becomes a statement and its consumers get a reference to it. Anything
//!    else is inlined at its single use site.
//!
//! Statements come out in post-order, so none refers to a name that has not
//! been emitted yet. Binding statements for the free variables come first.

use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::IndexSet;
use thiserror::Error;
use tracing::{debug, field, trace, trace_span};

use crate::ast::{BinOp, Node, NodeId};
use crate::bindings::Bindings;
use crate::compile::CompileOptions;
use crate::graph::Graph;
use crate::value::Constant;
use crate::visitor::{Finish, Inline, Traversal, Visitor};

/// Why a variable could not be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnboundReason {
    /// No binding was supplied
    Missing,
    /// The supplied value is not a constant leaf; carries what it was instead
    NotConstant(&'static str),
}

impl fmt::Display for UnboundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnboundReason::Missing => f.write_str("no binding supplied"),
            UnboundReason::NotConstant(kind) => {
                write!(f, "bound to a {} instead of a constant", kind)
            }
        }
    }
}

/// Errors raised while rendering a finished graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// `@` is reachable without crossing an operator call
    #[error("placeholder '@' escapes its operator call in {context}")]
    PlaceholderEscape { context: String },

    #[error("variable '${name}' is unbound: {reason}")]
    UnboundVariable { name: String, reason: UnboundReason },

    /// Operator calls only exist as pipeline steps
    #[error("operator call {namespace}.{name} is used outside a pipeline")]
    DetachedOpCall { namespace: String, name: String },

    #[error("statement '{0}' is defined twice")]
    DuplicateStatement(String),

    #[error("node {0} does not belong to this graph")]
    UnknownNode(NodeId),

    #[error("pipeline step {0} is not an operator call")]
    NotAnOpCall(NodeId),

    #[error("invalid bindings: {0}")]
    InvalidBindings(&'static str),

    #[error("nothing to render")]
    NoRoots,
}

/// A named, rendered sub-expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement<T> {
    pub name: String,
    pub body: T,
}

/// Ordered statements followed by the terminal expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub statements: Vec<Statement<T>>,
    pub terminal: T,
}

/// A visitor that can refer to a statement by name.
pub trait Render: Visitor {
    /// Back end name, for logging.
    const NAME: &'static str;

    fn reference(&mut self, name: &str) -> Self::Output;
}

/// First pass: placeholder capture and free variables.
#[derive(Debug, Default)]
struct Analysis {
    vars: IndexSet<String>,
}

impl Visitor for Analysis {
    /// Whether the body captures `@` outside an operator call
    type Output = bool;
    type Call = ();

    fn constant(&mut self, _: &Constant) -> bool {
        false
    }

    fn binary(&mut self, _: BinOp, left: bool, right: bool) -> bool {
        left || right
    }

    fn lookup(&mut self, on: bool, _: &str) -> bool {
        on
    }

    fn list(&mut self, values: Vec<bool>) -> bool {
        values.into_iter().any(|v| v)
    }

    fn dict(&mut self, entries: Vec<(String, bool)>) -> bool {
        entries.into_iter().any(|(_, v)| v)
    }

    fn table(&mut self, inner: bool) -> bool {
        inner
    }

    fn var(&mut self, name: &str) -> bool {
        self.vars.insert(name.to_string());
        false
    }

    fn placeholder(&mut self) -> bool {
        true
    }

    // `@` inside the arguments belongs to the call
    fn op_call(&mut self, _: &str, _: &str, _: Vec<(String, bool)>) {}

    fn pipeline(&mut self, base: bool, _: Vec<()>) -> bool {
        base
    }

    fn conditional(&mut self, condition: bool, then: bool, otherwise: bool) -> bool {
        condition || then || otherwise
    }
}

/// Second pass hook: hoists shared and named nodes into statements.
struct Extractor<'a, T> {
    captures: HashMap<NodeId, bool>,
    options: &'a CompileOptions,
    statements: Vec<Statement<T>>,
    names: HashSet<String>,
    hoisted: HashSet<NodeId>,
    /// Top-level nodes that must become statements on first visit
    forced: HashSet<NodeId>,
}

impl<T> Extractor<'_, T> {
    fn push(&mut self, name: String, body: T) -> Result<(), RenderError> {
        if !self.names.insert(name.clone()) {
            return Err(RenderError::DuplicateStatement(name));
        }
        self.statements.push(Statement { name, body });
        Ok(())
    }

    fn captures(&self, id: NodeId) -> bool {
        self.captures.get(&id).copied().unwrap_or(false)
    }

    fn hoist<R: Render<Output = T>>(
        &mut self,
        renderer: &mut R,
        node: &Node,
        body: T,
    ) -> Result<T, RenderError> {
        let name = match node.name() {
            Some(name) => name.to_string(),
            None => self.options.label(node.id()),
        };

        trace!(node = %node.id(), name = %name, fan_out = node.fan_out(), "hoisted");
        let reference = renderer.reference(&name);
        self.push(name, body)?;
        self.hoisted.insert(node.id());
        Ok(reference)
    }

    /// Makes sure a top-level node ends up as a statement of its own. Only
    /// unnameable nodes get here without having been hoisted already.
    fn force<R: Render<Output = T>>(
        &mut self,
        renderer: &mut R,
        node: &Node,
        rendered: T,
    ) -> Result<(), RenderError> {
        if self.hoisted.contains(&node.id()) {
            return Ok(());
        }
        self.hoist(renderer, node, rendered).map(|_| ())
    }
}

impl<T, R: Render<Output = T>> Finish<R> for Extractor<'_, T> {
    fn finish(&mut self, renderer: &mut R, node: &Node, body: T) -> Result<T, RenderError> {
        if !node.kind().is_nameable() {
            return Ok(body);
        }
        let forced = self.forced.contains(&node.id());
        if node.fan_out() <= 1 && node.name().is_none() && !forced {
            return Ok(body);
        }

        if self.captures(node.id()) {
            if let Some(name) = node.name() {
                return Err(RenderError::PlaceholderEscape {
                    context: format!("statement '{}'", name),
                });
            }
            trace!(node = %node.id(), fan_out = node.fan_out(), "kept inline, captures '@'");
            return Ok(body);
        }

        self.hoist(renderer, node, body)
    }
}

/// Renders `roots` into statements plus a terminal expression.
///
/// Every root but the last becomes a statement; the last one is the
/// terminal. A root that another root consumes is a statement before its
/// first use, so the terminal may itself be a reference.
pub(crate) fn extract<R: Render>(
    graph: &Graph,
    roots: &[NodeId],
    bindings: &Bindings,
    options: &CompileOptions,
    renderer: R,
) -> Result<Extracted<R::Output>, RenderError> {
    let span = trace_span!(
        "render",
        renderer = R::NAME,
        roots = roots.len(),
        statements = field::Empty
    )
    .entered();

    let Some((&last, rest)) = roots.split_last() else {
        return Err(RenderError::NoRoots);
    };

    let mut analysis = Traversal::new(graph, Analysis::default());
    for &root in roots {
        if analysis.visit(root, &mut Inline)? {
            return Err(RenderError::PlaceholderEscape {
                context: format!("top-level expression {}", root),
            });
        }
    }
    let captures: HashMap<NodeId, bool> = graph
        .nodes()
        .filter_map(|node| analysis.cached(node.id()).map(|&c| (node.id(), c)))
        .collect();
    let vars = analysis.into_visitor().vars;

    // A top-level node consumed by another one is hoisted the first time it
    // is reached, so every consumer sees the reference.
    let mut forced: HashSet<NodeId> = rest.iter().copied().collect();
    if !rest.is_empty() && graph.get(last)?.fan_out() > 0 {
        forced.insert(last);
    }

    let mut traversal = Traversal::new(graph, renderer);
    let mut extractor = Extractor {
        captures,
        options,
        statements: Vec::new(),
        names: HashSet::new(),
        hoisted: HashSet::new(),
        forced,
    };

    for name in &vars {
        let value = bindings
            .get(name)
            .ok_or_else(|| RenderError::UnboundVariable {
                name: name.clone(),
                reason: UnboundReason::Missing,
            })?;
        trace!(name = %name, kind = value.type_name(), "bound");
        let body = traversal.visitor_mut().constant(value);
        extractor.push(name.clone(), body)?;
    }

    for (name, value) in bindings.iter() {
        if vars.contains(name) {
            continue;
        }
        if options.bind_unreferenced {
            let body = traversal.visitor_mut().constant(value);
            extractor.push(name.to_string(), body)?;
        } else {
            debug!(name = %name, "binding is never referenced");
        }
    }

    for &root in rest {
        let rendered = traversal.visit(root, &mut extractor)?;
        let node = graph.get(root)?;
        extractor.force(traversal.visitor_mut(), node, rendered)?;
    }
    let terminal = traversal.visit(last, &mut extractor)?;

    span.record("statements", extractor.statements.len());

    Ok(Extracted {
        statements: extractor.statements,
        terminal,
    })
}
