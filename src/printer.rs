//! Debug text rendering.
//!
//! Every statement prints as `name = <expr>;` on its own line, followed by
//! the bare terminal expression:
//!
//! ```text
//! b = 5;
//! a = 1;
//! c = $a + $b;
//! $c
//! ```
//!
//! Inlined operands are parenthesized wherever the grammar needs it, so the
//! text reads back through [`crate::parser::parse_query`] into the same
//! query the serializer produces.

use crate::ast::BinOp;
use crate::ast::operators::PREC_POSTFIX;
use crate::extract::{Extracted, Render};
use crate::value::Constant;
use crate::visitor::Visitor;

const PREC_ATOM: u8 = 9;
const PREC_PIPELINE: u8 = 2;
const PREC_CONDITIONAL: u8 = 1;

/// Rendered text of one expression, with the precedence of its outermost
/// construct.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    text: String,
    prec: u8,
}

impl Fragment {
    fn new(text: String, prec: u8) -> Self {
        Fragment { text, prec }
    }

    fn atom(text: String) -> Self {
        Fragment::new(text, PREC_ATOM)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text, parenthesized if `wrap` holds.
    fn wrapped(self, wrap: bool) -> String {
        if wrap {
            format!("({})", self.text)
        } else {
            self.text
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Printer;

impl Printer {
    pub fn new() -> Self {
        Printer
    }

    fn entries(entries: Vec<(String, Fragment)>) -> String {
        entries
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value.text))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Visitor for Printer {
    type Output = Fragment;
    type Call = String;

    fn constant(&mut self, value: &Constant) -> Fragment {
        let text = match value {
            Constant::Int(n) => n.to_string(),
            // Debug keeps a decimal point or an exponent
            Constant::Double(d) => format!("{:?}", d),
            Constant::Bool(b) => b.to_string(),
            Constant::String(s) => format!("\"{}\"", escape_string(s)),
        };
        Fragment::atom(text)
    }

    fn binary(&mut self, op: BinOp, left: Fragment, right: Fragment) -> Fragment {
        if op == BinOp::Index {
            let on = left.prec < PREC_POSTFIX;
            return Fragment::new(
                format!("{}[{}]", left.wrapped(on), right.text),
                PREC_POSTFIX,
            );
        }

        let prec = op.precedence();
        // comparisons do not chain
        let wrap_left = left.prec < prec || (op.is_comparison() && left.prec == prec);
        let wrap_right = right.prec <= prec;
        Fragment::new(
            format!(
                "{} {} {}",
                left.wrapped(wrap_left),
                op,
                right.wrapped(wrap_right)
            ),
            prec,
        )
    }

    fn lookup(&mut self, on: Fragment, key: &str) -> Fragment {
        let wrap = on.prec < PREC_POSTFIX;
        Fragment::new(format!("{}.{}", on.wrapped(wrap), key), PREC_POSTFIX)
    }

    fn list(&mut self, values: Vec<Fragment>) -> Fragment {
        let items: Vec<String> = values.into_iter().map(|v| v.text).collect();
        Fragment::atom(format!("[{}]", items.join(", ")))
    }

    fn dict(&mut self, entries: Vec<(String, Fragment)>) -> Fragment {
        Fragment::atom(format!("{{{}}}", Printer::entries(entries)))
    }

    fn table(&mut self, inner: Fragment) -> Fragment {
        Fragment::atom(format!("table({})", inner.text))
    }

    fn var(&mut self, name: &str) -> Fragment {
        self.reference(name)
    }

    fn placeholder(&mut self) -> Fragment {
        Fragment::atom("@".to_string())
    }

    fn op_call(&mut self, namespace: &str, name: &str, kwargs: Vec<(String, Fragment)>) -> String {
        format!("{}.{}({})", namespace, name, Printer::entries(kwargs))
    }

    fn pipeline(&mut self, base: Fragment, steps: Vec<String>) -> Fragment {
        let wrap = base.prec <= PREC_PIPELINE;
        let mut text = base.wrapped(wrap);
        for step in steps {
            text.push_str(" | ");
            text.push_str(&step);
        }
        Fragment::new(text, PREC_PIPELINE)
    }

    fn conditional(&mut self, condition: Fragment, then: Fragment, otherwise: Fragment) -> Fragment {
        Fragment::new(
            format!(
                "if {} then {} else {}",
                condition.text, then.text, otherwise.text
            ),
            PREC_CONDITIONAL,
        )
    }
}

impl Render for Printer {
    const NAME: &'static str = "printer";

    fn reference(&mut self, name: &str) -> Fragment {
        Fragment::atom(format!("${}", name))
    }
}

/// Lays out extracted statements and the terminal as debug text.
pub(crate) fn layout(extracted: Extracted<Fragment>) -> String {
    let mut lines: Vec<String> = extracted
        .statements
        .into_iter()
        .map(|statement| format!("{} = {};", statement.name, statement.body.text))
        .collect();
    lines.push(extracted.terminal.text);
    lines.join("\n")
}

/// Escapes a string for a double-quoted literal.
pub fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
            c => vec![c],
        })
        .collect()
}
