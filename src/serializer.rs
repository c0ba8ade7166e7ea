//! Wire rendering: the same statements and inline decisions as the printer,
//! encoded as a [`wire::Query`] tree.

use crate::ast::BinOp;
use crate::extract::{Extracted, Render};
use crate::value::Constant;
use crate::visitor::Visitor;
use crate::wire::{self, Ast, Atom, Dict, OpCall};

#[derive(Debug, Clone, Copy, Default)]
pub struct Serializer;

impl Serializer {
    pub fn new() -> Self {
        Serializer
    }
}

impl Visitor for Serializer {
    type Output = Ast;
    type Call = OpCall;

    fn constant(&mut self, value: &Constant) -> Ast {
        Ast::Atom(match value {
            Constant::Int(n) => Atom::Int(*n),
            Constant::Double(d) => Atom::Double(*d),
            Constant::Bool(b) => Atom::Bool(*b),
            Constant::String(s) => Atom::String(s.clone()),
        })
    }

    fn binary(&mut self, op: BinOp, left: Ast, right: Ast) -> Ast {
        Ast::binary(left, op.symbol(), right)
    }

    fn lookup(&mut self, on: Ast, key: &str) -> Ast {
        Ast::lookup(on, key)
    }

    fn list(&mut self, values: Vec<Ast>) -> Ast {
        Ast::List { values }
    }

    fn dict(&mut self, entries: Vec<(String, Ast)>) -> Ast {
        Ast::dict(entries)
    }

    fn table(&mut self, inner: Ast) -> Ast {
        Ast::table(inner)
    }

    fn var(&mut self, name: &str) -> Ast {
        Ast::var(name)
    }

    fn placeholder(&mut self) -> Ast {
        Ast::At
    }

    fn op_call(&mut self, namespace: &str, name: &str, kwargs: Vec<(String, Ast)>) -> OpCall {
        OpCall::new(namespace, name, kwargs.into_iter().collect::<Dict>())
    }

    fn pipeline(&mut self, base: Ast, steps: Vec<OpCall>) -> Ast {
        Ast::pipeline(base, steps)
    }

    fn conditional(&mut self, condition: Ast, then: Ast, otherwise: Ast) -> Ast {
        Ast::if_else(condition, then, otherwise)
    }
}

impl Render for Serializer {
    const NAME: &'static str = "serializer";

    fn reference(&mut self, name: &str) -> Ast {
        Ast::var(name)
    }
}

pub(crate) fn assemble(extracted: Extracted<Ast>) -> wire::Query {
    wire::Query {
        statements: extracted
            .statements
            .into_iter()
            .map(|statement| wire::Statement::new(statement.name, statement.body))
            .collect(),
        terminal: extracted.terminal,
    }
}
