// tests/scope_tests.rs

use pretty_assertions::assert_eq;
use rql::wire::{Ast, Query, Statement};
use rql::{Bindings, BuildError, CompileOptions, Error, OperatorRegistry, QueryScope, RenderError};

#[test]
fn test_nested_scope_is_rejected() {
    let outer = QueryScope::open().unwrap();
    assert!(QueryScope::is_active());
    assert!(matches!(QueryScope::open(), Err(BuildError::NestedScope)));

    drop(outer);
    assert!(!QueryScope::is_active());
    let again = QueryScope::open().unwrap();
    drop(again);
}

#[test]
fn test_scopes_are_per_thread() {
    let _scope = QueryScope::open().unwrap();

    let other = std::thread::spawn(|| QueryScope::open().map(|_| ()));
    assert_eq!(other.join().unwrap(), Ok(()));
}

#[test]
fn test_finish_releases_the_scope() {
    let mut scope = QueryScope::open().unwrap();
    let one = scope.int(1);
    let graph = scope.finish();

    assert!(!QueryScope::is_active());
    assert_eq!(graph.roots(), vec![one]);
}

#[test]
fn test_execute_collects_top_level_expressions() {
    let mut q = QueryScope::open().unwrap();
    let x = q.var("x").unwrap();
    let one = q.int(1);
    let first = q.add(x, one).unwrap();
    q.set_name(first, "first").unwrap();
    let two = q.int(2);
    q.mul(x, two).unwrap();

    let query = q.execute(&Bindings::new().bind("x", 3)).unwrap();
    assert!(!QueryScope::is_active());
    assert_eq!(
        query,
        Query {
            statements: vec![
                Statement::new("x", Ast::int(3)),
                Statement::new("first", Ast::binary(Ast::var("x"), "+", Ast::int(1))),
            ],
            terminal: Ast::binary(Ast::var("x"), "*", Ast::int(2)),
        }
    );
}

#[test]
fn test_print_forces_unnamed_top_level_statements() {
    let mut q = QueryScope::with_options(CompileOptions {
        label_prefix: "s".to_string(),
        ..CompileOptions::default()
    })
    .unwrap();
    let one = q.int(1);
    let two = q.int(2);
    let sum = q.add(one, two).unwrap();
    q.string("last");

    let text = q.print(&Bindings::new()).unwrap();
    assert_eq!(text, format!("s{sum} = 1 + 2;\n\"last\""));
}

#[test]
fn test_empty_scope() {
    let q = QueryScope::open().unwrap();
    assert!(matches!(
        q.execute(&Bindings::new()),
        Err(Error::Build(BuildError::EmptyScope))
    ));
    assert!(!QueryScope::is_active());
}

#[test]
fn test_render_errors_surface_through_execute() {
    let mut q = QueryScope::open().unwrap();
    q.var("missing").unwrap();
    let one = q.int(1);
    let missing = q.var("missing").unwrap();
    q.add(missing, one).unwrap();

    assert!(matches!(
        q.execute(&Bindings::new()),
        Err(Error::Render(RenderError::UnboundVariable { .. }))
    ));
}

#[test]
fn test_scope_with_operator_registry() {
    let mut q = QueryScope::with_operators(OperatorRegistry::standard()).unwrap();
    let rows = q.var("rows").unwrap();
    let count = q.int(3);
    let take = q.op_call("std", "take", [("count", count)]).unwrap();
    assert!(matches!(
        q.op_call::<&str>("std", "explode", []),
        Err(BuildError::UnregisteredOperator { .. })
    ));
    q.pipeline(rows, [take]).unwrap();

    let text = q.print(&Bindings::new().bind("rows", "events")).unwrap();
    assert_eq!(text, "rows = \"events\";\n$rows | std.take(count=3)");
}
