//! # RQL
//!
//! A client-side compiler for query expressions. Callers assemble a query
//! as a graph of expression nodes, then render it either as debug text or as
//! a [`wire::Query`] for the remote engine. Nodes shared by several
//! consumers, and nodes given a name, become statements of their own; every
//! other node is inlined where it is used.
//!
//! ```
//! use rql::{Bindings, GraphBuilder, print};
//!
//! let mut b = GraphBuilder::new();
//! let a = b.int(1);
//! let a = b.named(a, "a").unwrap();
//! let x = b.var("b").unwrap();
//! let c = b.add(a, x).unwrap();
//! let c = b.named(c, "c").unwrap();
//! let graph = b.finish();
//!
//! let text = print(&graph, c, &Bindings::new().bind("b", 5)).unwrap();
//! assert_eq!(text, "b = 5;\na = 1;\nc = $a + $b;\n$c");
//! ```
pub mod ast;
pub mod bindings;
pub mod compile;
pub mod error;
pub mod extract;
pub mod graph;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod scope;
pub mod serializer;
pub mod value;
pub mod visitor;
pub mod wire;

pub use ast::{BinOp, Node, NodeId, NodeKind, Token};
pub use bindings::Bindings;
pub use compile::{CompileOptions, Compiler, print, serialize};
pub use error::{Error, Result};
pub use extract::{RenderError, UnboundReason};
pub use graph::{BuildError, Graph, GraphBuilder, OperatorRegistry};
pub use lexer::{LexError, Lexer, Position};
pub use parser::{ParseError, Parser, parse_expression, parse_query};
pub use printer::Printer;
pub use scope::QueryScope;
pub use serializer::Serializer;
pub use value::Constant;
pub use wire::WireError;
