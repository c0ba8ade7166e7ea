//! Entry points that compile a finished graph.

use crate::ast::NodeId;
use crate::bindings::Bindings;
use crate::extract::{RenderError, extract};
use crate::graph::Graph;
use crate::printer::{self, Printer};
use crate::serializer::{self, Serializer};
use crate::wire;

/// Options for compiling a graph
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Prefix of the generated label of an unnamed statement
    pub label_prefix: String,
    /// Emit binding statements for bindings the graph never references
    pub bind_unreferenced: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            label_prefix: "_".to_string(),
            bind_unreferenced: false,
        }
    }
}

impl CompileOptions {
    /// Label given to an unnamed node hoisted into a statement.
    pub fn label(&self, id: NodeId) -> String {
        format!("{}{}", self.label_prefix, id)
    }
}

/// Compiles graphs into debug text or wire queries.
///
/// # Examples
///
/// ```
/// use rql::{Bindings, Compiler, GraphBuilder};
///
/// let mut b = GraphBuilder::new();
/// let one = b.int(1);
/// let x = b.var("x").unwrap();
/// let sum = b.add(one, x).unwrap();
/// let graph = b.finish();
///
/// let text = Compiler::default()
///     .print(&graph, sum, &Bindings::new().bind("x", 2))
///     .unwrap();
/// assert_eq!(text, "x = 2;\n1 + $x");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    pub fn new(options: CompileOptions) -> Self {
        Compiler { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn print(&self, graph: &Graph, root: NodeId, bindings: &Bindings) -> Result<String, RenderError> {
        self.print_all(graph, &[root], bindings)
    }

    pub fn serialize(
        &self,
        graph: &Graph,
        root: NodeId,
        bindings: &Bindings,
    ) -> Result<wire::Query, RenderError> {
        self.serialize_all(graph, &[root], bindings)
    }

    /// Renders several top-level expressions into one query. All but the
    /// last become statements; the last is the terminal expression.
    pub fn print_all(
        &self,
        graph: &Graph,
        roots: &[NodeId],
        bindings: &Bindings,
    ) -> Result<String, RenderError> {
        let extracted = extract(graph, roots, bindings, &self.options, Printer::new())?;
        Ok(printer::layout(extracted))
    }

    pub fn serialize_all(
        &self,
        graph: &Graph,
        roots: &[NodeId],
        bindings: &Bindings,
    ) -> Result<wire::Query, RenderError> {
        let extracted = extract(graph, roots, bindings, &self.options, Serializer::new())?;
        Ok(serializer::assemble(extracted))
    }
}

/// Prints `root` with default options.
pub fn print(graph: &Graph, root: NodeId, bindings: &Bindings) -> Result<String, RenderError> {
    Compiler::default().print(graph, root, bindings)
}

/// Serializes `root` with default options.
pub fn serialize(graph: &Graph, root: NodeId, bindings: &Bindings) -> Result<wire::Query, RenderError> {
    Compiler::default().serialize(graph, root, bindings)
}
