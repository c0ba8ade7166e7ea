//! Ambient construction scope.
//!
//! A [`QueryScope`] owns a [`GraphBuilder`] and marks the current thread as
//! building a query. Only one scope may be open per thread at a time; the
//! flag is cleared when the guard is dropped or finished.
//!
//! ```
//! use rql::{Bindings, QueryScope};
//!
//! let mut q = QueryScope::open().unwrap();
//! let x = q.var("x").unwrap();
//! let one = q.int(1);
//! q.add(x, one).unwrap();
//!
//! assert!(QueryScope::open().is_err());
//! let text = q.print(&Bindings::new().bind("x", 41)).unwrap();
//! assert_eq!(text, "x = 41;\n$x + 1");
//! assert!(!QueryScope::is_active());
//! ```

use std::cell::Cell;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::ast::NodeId;
use crate::bindings::Bindings;
use crate::compile::{CompileOptions, Compiler};
use crate::error::Error;
use crate::graph::{BuildError, Graph, GraphBuilder, OperatorRegistry};
use crate::wire;

thread_local! {
    static ACTIVE: Cell<bool> = const { Cell::new(false) };
}

/// RAII guard over the thread's single active query build.
#[derive(Debug)]
pub struct QueryScope {
    builder: GraphBuilder,
    options: CompileOptions,
    // confined to the thread whose flag it holds
    _thread: PhantomData<*const ()>,
}

impl QueryScope {
    pub fn open() -> Result<Self, BuildError> {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Result<Self, BuildError> {
        Self::enter(GraphBuilder::new(), options)
    }

    /// Opens a scope whose operator calls must be in `operators`.
    pub fn with_operators(operators: OperatorRegistry) -> Result<Self, BuildError> {
        Self::enter(
            GraphBuilder::with_operators(operators),
            CompileOptions::default(),
        )
    }

    fn enter(builder: GraphBuilder, options: CompileOptions) -> Result<Self, BuildError> {
        if ACTIVE.with(|active| active.replace(true)) {
            return Err(BuildError::NestedScope);
        }
        debug!("query scope opened");
        Ok(QueryScope {
            builder,
            options,
            _thread: PhantomData,
        })
    }

    /// Whether a scope is open on the current thread.
    pub fn is_active() -> bool {
        ACTIVE.with(Cell::get)
    }

    /// Closes the scope and hands back the graph built in it.
    pub fn finish(mut self) -> Graph {
        mem::take(&mut self.builder).finish()
    }

    /// Closes the scope and compiles every top-level expression built in it.
    pub fn execute(self, bindings: &Bindings) -> Result<wire::Query, Error> {
        let (graph, roots, compiler) = self.close()?;
        Ok(compiler.serialize_all(&graph, &roots, bindings)?)
    }

    /// [`execute`](Self::execute), rendered as debug text.
    pub fn print(self, bindings: &Bindings) -> Result<String, Error> {
        let (graph, roots, compiler) = self.close()?;
        Ok(compiler.print_all(&graph, &roots, bindings)?)
    }

    fn close(mut self) -> Result<(Graph, Vec<NodeId>, Compiler), BuildError> {
        let roots = self.builder.roots();
        if roots.is_empty() {
            return Err(BuildError::EmptyScope);
        }
        debug!(roots = roots.len(), "collected top-level expressions");

        let compiler = Compiler::new(mem::take(&mut self.options));
        let graph = mem::take(&mut self.builder).finish();
        Ok((graph, roots, compiler))
    }
}

impl Deref for QueryScope {
    type Target = GraphBuilder;

    fn deref(&self) -> &GraphBuilder {
        &self.builder
    }
}

impl DerefMut for QueryScope {
    fn deref_mut(&mut self) -> &mut GraphBuilder {
        &mut self.builder
    }
}

impl Drop for QueryScope {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.set(false));
        debug!("query scope closed");
    }
}
