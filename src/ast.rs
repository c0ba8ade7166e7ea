//! # RQL - Expression Node Model
//!
//! This module defines the vocabulary of the expression graph: the node
//! kinds a query is built from, the binary operators, and the tokens of the
//! debug text grammar the compiler prints.
//!
//! ## Architecture Overview
//!
//! - **[expressions]** - Nodes, node identities and node kinds
//! - **[operators]** - Binary operators (comparison, arithmetic, logical, indexing)
//! - **[tokens]** - Lexical tokens of the debug text grammar
//!
//! ## Core Concepts
//!
//! ### Graphs, not trees
//!
//! A node is created once and may be used as an operand by any number of
//! later nodes. The number of distinct consumers is the node's *fan-out*.
//! When a query is rendered, a node with a fan-out above one (or with an
//! explicit name) becomes a statement of its own and its consumers refer to
//! it by name; every other node is inlined where it is used.
//!
//! ```text
//! a = 1;
//! c = $a + $a * 2;
//! $c
//! ```
//!
//! ### Pipelines
//!
//! A pipeline feeds a base expression through operator calls, left to right.
//! Inside an operator call's arguments `@` refers to the current row:
//!
//! ```text
//! table([{x=1}, {x=2}]) | std.filter(where=@.x > 1) | std.take(count=1)
//! ```
//!
//! `@` anywhere else is rejected when the query is rendered.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Node, NodeId, NodeKind};
pub use operators::BinOp;
pub use tokens::{KEYWORDS, Token};
