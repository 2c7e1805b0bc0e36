//! End-to-end scenarios driven through the public engine surface.

#![allow(clippy::panic)]

use groovy_engine::{
    CancellationToken, CompletionItemKind, CoreConfig, EngineError, GroovyCore, Position,
};
use groovy_test_support::{must, must_err, must_some};
use pretty_assertions::assert_eq;
use url::Url;

fn uri(path: &str) -> Url {
    must(Url::parse(&format!("file://{path}")))
}

fn token() -> CancellationToken {
    CancellationToken::new()
}

// S1 — local variable rename.
#[test]
fn s1_local_variable_rename() {
    let core = GroovyCore::new();
    let a = uri("/a.groovy");
    core.open(&a, "def greeting = \"hi\"\nprintln greeting\n", 1);

    let edit = must(core.rename(&a, Position::new(1, 8), "msg", &token()));
    let edits = must_some(edit.changes.get(&a)).clone();
    assert_eq!(edits.len(), 2);
    let mut ranges: Vec<(Position, Position)> =
        edits.iter().map(|e| (e.range.start, e.range.end)).collect();
    ranges.sort();
    assert_eq!(
        ranges,
        vec![
            (Position::new(0, 4), Position::new(0, 12)),
            (Position::new(1, 8), Position::new(1, 16)),
        ]
    );
    assert!(edits.iter().all(|e| e.new_text == "msg"));
    assert!(edit.file_renames.is_empty());
}

// S2 — member completion on an inferred list type.
#[test]
fn s2_member_completion_on_list() {
    let core = GroovyCore::new();
    let b = uri("/b.groovy");
    let text = "def list = [1, 2, 3]\nlist.\n";
    core.open(&b, text, 1);

    let items = must(core.completion(&b, Position::new(1, 5), &token()));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    for expected in ["each", "collect", "find", "size"] {
        assert!(labels.contains(&expected), "missing {expected} in {labels:?}");
    }
    assert!(!labels.contains(&"class"));
    assert!(!labels.contains(&"def"));
    assert!(items.iter().all(|i| i.kind != CompletionItemKind::Keyword));
}

// S3 — cross-file go-to-definition.
#[test]
fn s3_cross_file_definition() {
    let core = GroovyCore::new();
    let lib = uri("/lib.groovy");
    let app = uri("/app.groovy");
    core.open(&lib, "package x\nclass Helper { static greet(n) { \"hi, $n\" } }\n", 1);
    core.open(&app, "package x\nHelper.greet(\"world\")\n", 1);

    let locations = must(core.definition(&app, Position::new(1, 8), &token()));
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].uri, lib);
    // The declaration's identifier on line 1 of lib.groovy.
    assert_eq!(locations[0].range.start.line, 1);
    assert_eq!(locations[0].range.start.character, 22);
}

// S4 — rename into a dependency is refused with a stable code.
#[test]
fn s4_rename_into_dependency_is_refused() {
    let core = GroovyCore::builder()
        .with_workspace_root(must(Url::parse("file:///workspace/")))
        .with_classpath_entry(must(Url::parse("file:///deps/")))
        .build();
    let dep = uri("/deps/Lib.groovy");
    let app = uri("/workspace/app.groovy");
    core.open(&dep, "class Lib { static go() { } }\n", 1);
    core.open(&app, "Lib.go()\n", 1);

    let err = must_err(core.rename(&app, Position::new(0, 5), "run", &token()));
    match err {
        EngineError::InvalidRequest { code, .. } => {
            assert_eq!(code, "rename.target-in-dependency");
        }
        other => panic!("expected InvalidRequest, got {other:?}"),
    }
}

// S5 — completion inside a class body recovers via the def-prefixed retry
// and returns the broad set including keywords.
#[test]
fn s5_completion_with_sentinel_retry() {
    let core = GroovyCore::new();
    let x = uri("/x.groovy");
    let text = "class X {\n    fo\n}\n";
    core.open(&x, text, 1);

    let items = must(core.completion(&x, Position::new(1, 6), &token()));
    let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
    for keyword in ["def", "static", "final"] {
        assert!(labels.contains(&keyword), "missing {keyword} in {labels:?}");
    }
    // The broad set is returned; prefix narrowing is the client's job.
    assert!(labels.len() > 3);
}

// S6 — references across files, declaration included.
#[test]
fn s6_references_across_files() {
    let core = GroovyCore::new();
    let m = uri("/m.groovy");
    let u1 = uri("/u1.groovy");
    let u2 = uri("/u2.groovy");
    core.open(&m, "class M { static val = 1 }\n", 1);
    core.open(&u1, "println M.val\n", 1);
    core.open(&u2, "def x = M.val + 1\n", 1);

    let locations = must(core.references(&m, Position::new(0, 18), true, &token()));
    assert_eq!(locations.len(), 3, "{locations:?}");
    let mut uris: Vec<&str> = locations.iter().map(|l| l.uri.as_str()).collect();
    uris.sort_unstable();
    assert_eq!(uris, vec!["file:///m.groovy", "file:///u1.groovy", "file:///u2.groovy"]);
}

#[test]
fn diagnostics_flow_through_open_and_edit() {
    let core = GroovyCore::new();
    let d = uri("/d.groovy");
    let diagnostics = core.open(&d, "class {\n", 1);
    assert!(!diagnostics.is_empty());

    let diagnostics = core.edit(&d, "class Fixed { }\n", 2);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn hover_and_outline_and_workspace_symbols() {
    let core = GroovyCore::new();
    let s = uri("/service.groovy");
    core.open(
        &s,
        "class OrderService {\n  int total = 0\n  def place(order) { total++ }\n}\n",
        1,
    );

    let hover = must_some(must(core.hover(&s, Position::new(2, 7), &token())));
    assert!(hover.contents.contains("place"));

    let outline = must(core.document_symbols(&s, &token()));
    assert_eq!(outline.len(), 1);
    assert_eq!(outline[0].name, "OrderService");
    assert_eq!(outline[0].children.len(), 2);

    let symbols = must(core.workspace_symbols("order", &token()));
    assert!(symbols.iter().any(|sym| sym.name == "OrderService"));
}

#[test]
fn unknown_uri_is_a_typed_error() {
    let core = GroovyCore::new();
    let ghost = uri("/ghost.groovy");
    let err = must_err(core.completion(&ghost, Position::new(0, 0), &token()));
    assert_eq!(err.code(), "request.unknown-uri");
}

#[test]
fn cancelled_query_returns_sentinel_not_partial() {
    let core = GroovyCore::new();
    let c = uri("/c.groovy");
    core.open(&c, "def x = 1\nx + x\n", 1);
    let cancel = token();
    cancel.cancel();
    let err = must_err(core.references(&c, Position::new(0, 4), true, &cancel));
    assert_eq!(err, EngineError::Cancelled);
}

#[test]
fn configure_applies_cache_capacity_and_limits() {
    let core = GroovyCore::new();
    let config: CoreConfig = must(serde_json::from_str(
        r#"{ "max_cached_documents": 2, "completion": { "type_parameter_limit": 3 } }"#,
    ));
    core.configure(config);
    for i in 0..5 {
        core.open(&uri(&format!("/n{i}.groovy")), "def a = 1\n", 1);
    }
    assert!(core.cache_statistics().entries <= 2);
}

#[test]
fn close_invalidates_the_cache_entry() {
    let core = GroovyCore::new();
    let f = uri("/f.groovy");
    core.open(&f, "def a = 1\n", 1);
    core.close(&f);
    let err = must_err(core.document_symbols(&f, &token()));
    assert_eq!(err.code(), "request.unknown-uri");
}

#[test]
fn stale_edits_do_not_regress_content() {
    let core = GroovyCore::new();
    let f = uri("/v.groovy");
    core.open(&f, "def a = 1\n", 3);
    core.edit(&f, "broken (((", 2);
    let diagnostics = must(core.diagnostics(&f, &token()));
    assert!(diagnostics.is_empty(), "stale edit must not replace newer text");
}
