// tests/printer_tests.rs

use pretty_assertions::assert_eq;
use rql::{
    Bindings, CompileOptions, Compiler, GraphBuilder, RenderError, UnboundReason, print,
};
use rql::wire::{Ast, Query, Statement};
use test_case::test_case;

// ============================================================================
// Statement extraction
// ============================================================================

#[test]
fn test_named_nodes_and_bindings() {
    let mut b = GraphBuilder::new();
    let a = b.int(1);
    let a = b.named(a, "a").unwrap();
    let x = b.var("b").unwrap();
    let c = b.add(a, x).unwrap();
    let c = b.named(c, "c").unwrap();
    let graph = b.finish();

    let text = print(&graph, c, &Bindings::new().bind("b", 5)).unwrap();
    assert_eq!(text, "b = 5;\na = 1;\nc = $a + $b;\n$c");
}

#[test]
fn test_single_use_operands_are_inlined() {
    let mut b = GraphBuilder::new();
    let a = b.int(1);
    let two = b.int(2);
    let c = b.add(a, two).unwrap();
    let c = b.named(c, "c").unwrap();
    let graph = b.finish();

    let text = print(&graph, c, &Bindings::new()).unwrap();
    assert_eq!(text, "c = 1 + 2;\n$c");
}

#[test]
fn test_unnamed_root_is_the_terminal() {
    let mut b = GraphBuilder::new();
    let a = b.int(1);
    let two = b.int(2);
    let c = b.mul(a, two).unwrap();
    let graph = b.finish();

    assert_eq!(print(&graph, c, &Bindings::new()).unwrap(), "1 * 2");
}

#[test]
fn test_shared_node_becomes_one_statement() {
    let mut b = GraphBuilder::new();
    let x = b.var("x").unwrap();
    let one = b.int(1);
    let shared = b.add(x, one).unwrap();
    let two = b.int(2);
    let doubled = b.mul(shared, two).unwrap();
    let result = b.sub(doubled, shared).unwrap();
    let graph = b.finish();

    let label = CompileOptions::default().label(shared);
    let text = print(&graph, result, &Bindings::new().bind("x", 3)).unwrap();
    assert_eq!(
        text,
        format!("x = 3;\n{label} = $x + 1;\n${label} * 2 - ${label}")
    );
}

#[test]
fn test_dict_and_lookup() {
    let mut b = GraphBuilder::new();
    let a = b.int(1);
    let d = b.dict([("x", a)]).unwrap();
    let looked_up = b.lookup(d, "x").unwrap();
    let graph = b.finish();

    let text = print(&graph, looked_up, &Bindings::new()).unwrap();
    assert_eq!(text, "{x=1}.x");
}

#[test]
fn test_dict_and_lookup_with_shared_operands() {
    let mut b = GraphBuilder::new();
    let a = b.int(1);
    let d = b.dict([("x", a)]).unwrap();
    let looked_up = b.lookup(d, "x").unwrap();
    let pair = b.list([a, looked_up, d]).unwrap();
    let graph = b.finish();

    let options = CompileOptions::default();
    let (la, ld) = (options.label(a), options.label(d));
    let text = print(&graph, pair, &Bindings::new()).unwrap();
    assert_eq!(
        text,
        format!("{la} = 1;\n{ld} = {{x=${la}}};\n[${la}, ${ld}.x, ${ld}]")
    );
}

#[test]
fn test_statements_are_emitted_before_use() {
    let mut b = GraphBuilder::new();
    let base = b.int(10);
    let base = b.named(base, "base").unwrap();
    let step = b.add(base, base).unwrap();
    let step = b.named(step, "step").unwrap();
    let last = b.mul(step, base).unwrap();
    let last = b.named(last, "last").unwrap();
    let graph = b.finish();

    let text = print(&graph, last, &Bindings::new()).unwrap();
    assert_eq!(
        text,
        "base = 10;\nstep = $base + $base;\nlast = $step * $base;\n$last"
    );
}

#[test]
fn test_label_prefix_option() {
    let mut b = GraphBuilder::new();
    let one = b.int(1);
    let sum = b.add(one, one).unwrap();
    let graph = b.finish();

    let compiler = Compiler::new(CompileOptions {
        label_prefix: "tmp_".to_string(),
        ..CompileOptions::default()
    });
    let text = compiler.print(&graph, sum, &Bindings::new()).unwrap();
    // `one` has a single consumer even though it is used twice
    assert_eq!(text, "1 + 1");

    let mut b = GraphBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let left = b.add(one, two).unwrap();
    let right = b.sub(one, two).unwrap();
    let both = b.list([left, right]).unwrap();
    let graph = b.finish();

    let text = compiler.print(&graph, both, &Bindings::new()).unwrap();
    assert_eq!(
        text,
        format!(
            "tmp_{one} = 1;\ntmp_{two} = 2;\n[$tmp_{one} + $tmp_{two}, $tmp_{one} - $tmp_{two}]"
        )
    );
}

#[test]
fn test_print_all_forces_statements() {
    let mut b = GraphBuilder::new();
    let one = b.int(1);
    let first = b.add(one, one).unwrap();
    let second = b.string("done");
    let graph = b.finish();

    let label = CompileOptions::default().label(first);
    let text = Compiler::default()
        .print_all(&graph, &[first, second], &Bindings::new())
        .unwrap();
    assert_eq!(text, format!("{label} = 1 + 1;\n\"done\""));
}

#[test]
fn test_print_all_shares_a_root_used_by_a_later_root() {
    let mut b = GraphBuilder::new();
    let a = b.int(1);
    let two = b.int(2);
    let sum = b.add(a, two).unwrap();
    let graph = b.finish();

    let label = CompileOptions::default().label(a);
    let text = Compiler::default()
        .print_all(&graph, &[a, sum], &Bindings::new())
        .unwrap();
    assert_eq!(text, format!("{label} = 1;\n${label} + 2"));
}

#[test]
fn test_print_all_shares_a_root_used_by_an_earlier_root() {
    let mut b = GraphBuilder::new();
    let a = b.int(1);
    let two = b.int(2);
    let sum = b.add(a, two).unwrap();
    let graph = b.finish();

    let options = CompileOptions::default();
    let (la, ls) = (options.label(a), options.label(sum));
    let text = Compiler::default()
        .print_all(&graph, &[sum, a], &Bindings::new())
        .unwrap();
    assert_eq!(text, format!("{la} = 1;\n{ls} = ${la} + 2;\n${la}"));
}

#[test]
fn test_serialize_all_shares_roots() {
    let mut b = GraphBuilder::new();
    let x = b.var("x").unwrap();
    let one = b.int(1);
    let shifted = b.add(x, one).unwrap();
    let two = b.int(2);
    let scaled = b.mul(shifted, two).unwrap();
    let graph = b.finish();

    let label = CompileOptions::default().label(shifted);
    let query = Compiler::default()
        .serialize_all(&graph, &[shifted, scaled], &Bindings::new().bind("x", 4))
        .unwrap();
    assert_eq!(
        query,
        Query {
            statements: vec![
                Statement::new("x", Ast::int(4)),
                Statement::new(label.clone(), Ast::binary(Ast::var("x"), "+", Ast::int(1))),
            ],
            terminal: Ast::binary(Ast::var(label), "*", Ast::int(2)),
        }
    );
}

// ============================================================================
// Bindings
// ============================================================================

#[test]
fn test_unbound_variable() {
    let mut b = GraphBuilder::new();
    let x = b.var("x").unwrap();
    let one = b.int(1);
    let sum = b.add(x, one).unwrap();
    let graph = b.finish();

    assert_eq!(
        print(&graph, sum, &Bindings::new().bind("y", 1)),
        Err(RenderError::UnboundVariable {
            name: "x".to_string(),
            reason: UnboundReason::Missing,
        })
    );
}

#[test]
fn test_bindings_follow_first_reach_order() {
    let mut b = GraphBuilder::new();
    let z = b.var("z").unwrap();
    let a = b.var("a").unwrap();
    let sum = b.add(z, a).unwrap();
    let graph = b.finish();

    let bindings = Bindings::new().bind("a", "first").bind("z", 2.5);
    let text = print(&graph, sum, &bindings).unwrap();
    assert_eq!(text, "z = 2.5;\na = \"first\";\n$z + $a");
}

#[test]
fn test_unreferenced_bindings() {
    let mut b = GraphBuilder::new();
    let one = b.int(1);
    let graph = b.finish();
    let bindings = Bindings::new().bind("unused", true);

    assert_eq!(print(&graph, one, &bindings).unwrap(), "1");

    let compiler = Compiler::new(CompileOptions {
        bind_unreferenced: true,
        ..CompileOptions::default()
    });
    assert_eq!(
        compiler.print(&graph, one, &bindings).unwrap(),
        "unused = true;\n1"
    );
}

#[test]
fn test_duplicate_statement_name() {
    let mut b = GraphBuilder::new();
    let x = b.var("x").unwrap();
    let one = b.int(1);
    let one = b.named(one, "x").unwrap();
    let sum = b.add(x, one).unwrap();
    let graph = b.finish();

    assert_eq!(
        print(&graph, sum, &Bindings::new().bind("x", 1)),
        Err(RenderError::DuplicateStatement("x".to_string()))
    );
}

// ============================================================================
// Placeholders and pipelines
// ============================================================================

#[test]
fn test_pipeline() {
    let mut b = GraphBuilder::new();
    let t = b.var("t").unwrap();
    let at = b.placeholder();
    let x = b.lookup(at, "x").unwrap();
    let one = b.int(1);
    let cond = b.gt(x, one).unwrap();
    let filter = b.op_call("std", "filter", [("where", cond)]).unwrap();
    let count = b.int(10);
    let take = b.op_call("std", "take", [("count", count)]).unwrap();
    let piped = b.pipeline(t, [filter, take]).unwrap();
    let graph = b.finish();

    let text = print(&graph, piped, &Bindings::new().bind("t", "events")).unwrap();
    assert_eq!(
        text,
        "t = \"events\";\n$t | std.filter(where=@.x > 1) | std.take(count=10)"
    );
}

#[test]
fn test_placeholder_at_top_level() {
    let mut b = GraphBuilder::new();
    let at = b.placeholder();
    let x = b.lookup(at, "x").unwrap();
    let graph = b.finish();

    assert!(matches!(
        print(&graph, x, &Bindings::new()),
        Err(RenderError::PlaceholderEscape { .. })
    ));
}

#[test]
fn test_shared_placeholder_expression_stays_inline() {
    let mut b = GraphBuilder::new();
    let at = b.placeholder();
    let x = b.lookup(at, "x").unwrap();
    let sum = b.add(x, x).unwrap();
    let product = b.mul(x, x).unwrap();
    let call = b
        .op_call("std", "select", [("a", sum), ("b", product)])
        .unwrap();
    let rows = b.var("rows").unwrap();
    let piped = b.pipeline(rows, [call]).unwrap();
    let graph = b.finish();

    let text = print(&graph, piped, &Bindings::new().bind("rows", 0)).unwrap();
    assert_eq!(
        text,
        "rows = 0;\n$rows | std.select(a=@.x + @.x, b=@.x * @.x)"
    );
}

#[test]
fn test_named_placeholder_expression_escapes() {
    let mut b = GraphBuilder::new();
    let at = b.placeholder();
    let x = b.lookup(at, "x").unwrap();
    let x = b.named(x, "x").unwrap();
    let call = b.op_call("std", "filter", [("where", x)]).unwrap();
    let rows = b.var("rows").unwrap();
    let piped = b.pipeline(rows, [call]).unwrap();
    let graph = b.finish();

    assert_eq!(
        print(&graph, piped, &Bindings::new().bind("rows", 0)),
        Err(RenderError::PlaceholderEscape {
            context: "statement 'x'".to_string()
        })
    );
}

#[test]
fn test_detached_op_call() {
    let mut b = GraphBuilder::new();
    let call = b.op_call::<&str>("std", "count", []).unwrap();
    let graph = b.finish();

    assert_eq!(
        print(&graph, call, &Bindings::new()),
        Err(RenderError::DetachedOpCall {
            namespace: "std".to_string(),
            name: "count".to_string(),
        })
    );
}

#[test]
fn test_unknown_root() {
    let mut other = GraphBuilder::new();
    let foreign = other.int(1);
    let graph = GraphBuilder::new().finish();

    assert_eq!(
        print(&graph, foreign, &Bindings::new()),
        Err(RenderError::UnknownNode(foreign))
    );
}

// ============================================================================
// Literals and parentheses
// ============================================================================

#[test_case(rql::Constant::Int(-7), "-7" ; "negative int")]
#[test_case(rql::Constant::Double(1.0), "1.0" ; "whole double")]
#[test_case(rql::Constant::Double(1e20), "1e20" ; "large double")]
#[test_case(rql::Constant::Bool(false), "false" ; "bool")]
#[test_case(rql::Constant::String("a\"b\\c\nd\te".into()), r#""a\"b\\c\nd\te""# ; "escaped string")]
#[test_case(rql::Constant::String("\u{1}".into()), r#""\u0001""# ; "control character")]
fn test_constants(value: rql::Constant, expected: &str) {
    let mut b = GraphBuilder::new();
    let c = b.constant(value);
    let graph = b.finish();
    assert_eq!(print(&graph, c, &Bindings::new()).unwrap(), expected);
}

#[test]
fn test_parentheses_follow_precedence() {
    let mut b = GraphBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let three = b.int(3);
    let sum = b.add(one, two).unwrap();
    let product = b.mul(sum, three).unwrap();
    let graph = b.finish();
    assert_eq!(print(&graph, product, &Bindings::new()).unwrap(), "(1 + 2) * 3");

    let mut b = GraphBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let three = b.int(3);
    let diff = b.sub(two, three).unwrap();
    let outer = b.sub(one, diff).unwrap();
    let graph = b.finish();
    assert_eq!(print(&graph, outer, &Bindings::new()).unwrap(), "1 - (2 - 3)");

    let mut b = GraphBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let three = b.int(3);
    let diff = b.sub(one, two).unwrap();
    let outer = b.sub(diff, three).unwrap();
    let graph = b.finish();
    assert_eq!(print(&graph, outer, &Bindings::new()).unwrap(), "1 - 2 - 3");
}

#[test]
fn test_comparisons_do_not_chain() {
    let mut b = GraphBuilder::new();
    let one = b.int(1);
    let two = b.int(2);
    let three = b.bool(true);
    let lt = b.lt(one, two).unwrap();
    let eq = b.eq(lt, three).unwrap();
    let graph = b.finish();

    assert_eq!(print(&graph, eq, &Bindings::new()).unwrap(), "(1 < 2) == true");
}

#[test]
fn test_logical_operators() {
    let mut b = GraphBuilder::new();
    let t = b.bool(true);
    let f = b.bool(false);
    let t2 = b.bool(true);
    let or = b.or(t, f).unwrap();
    let and = b.and(or, t2).unwrap();
    let graph = b.finish();

    assert_eq!(
        print(&graph, and, &Bindings::new()).unwrap(),
        "(true or false) and true"
    );
}

#[test]
fn test_index_and_lookup_on_compound_operands() {
    let mut b = GraphBuilder::new();
    let items = b.var("items").unwrap();
    let one = b.int(1);
    let i = b.var("i").unwrap();
    let next = b.add(i, one).unwrap();
    let item = b.index(items, next).unwrap();
    let name = b.lookup(item, "name").unwrap();
    let graph = b.finish();

    let bindings = Bindings::new().bind("items", 0).bind("i", 0);
    assert_eq!(
        print(&graph, name, &bindings).unwrap(),
        "items = 0;\ni = 0;\n$items[$i + 1].name"
    );
}

#[test]
fn test_conditional_and_table() {
    let mut b = GraphBuilder::new();
    let x = b.var("x").unwrap();
    let one = b.int(1);
    let big = b.gt(x, one).unwrap();
    let yes = b.string("big");
    let no = b.string("small");
    let cond = b.conditional(big, yes, no).unwrap();
    let rows = b.list([cond]).unwrap();
    let table = b.table(rows).unwrap();
    let two = b.int(2);
    let cond2 = b.conditional(big, one, two).unwrap();
    let sum = b.add(cond2, one).unwrap();
    let both = b.list([table, sum]).unwrap();
    let graph = b.finish();

    let label = CompileOptions::default().label(big);
    let one_label = CompileOptions::default().label(one);
    let text = print(&graph, both, &Bindings::new().bind("x", 2)).unwrap();
    assert_eq!(
        text,
        format!(
            "x = 2;\n{one_label} = 1;\n{label} = $x > ${one_label};\n\
             [table([if ${label} then \"big\" else \"small\"]), \
             (if ${label} then ${one_label} else 2) + ${one_label}]"
        )
    );
}
