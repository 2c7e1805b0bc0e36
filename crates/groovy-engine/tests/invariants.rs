//! Property tests for the universal invariants, driven through the
//! public engine surface.

use groovy_engine::{CancellationToken, CoreConfig, GroovyCore, Position};
use groovy_test_support::must;
use proptest::prelude::*;
use url::Url;

fn uri(path: &str) -> Url {
    must(Url::parse(&format!("file://{path}")))
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_filter("not a keyword", |s| !groovy_lexer::is_keyword(s))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // Parsing the same content twice yields equal diagnostics.
    #[test]
    fn parse_is_deterministic(name in identifier(), value in 0i64..10_000) {
        let content = format!("def {name} = {value}\nprintln {name}\nbroken (((\n");
        let core_a = GroovyCore::new();
        let core_b = GroovyCore::new();
        let target = uri("/det.groovy");
        let diags_a = core_a.open(&target, &content, 1);
        let diags_b = core_b.open(&target, &content, 1);
        prop_assert_eq!(diags_a, diags_b);
    }

    // For a local declaration, references with
    // include_declaration=true contain the declaration's own location.
    #[test]
    fn references_include_declaration(name in identifier(), value in 0i64..1000) {
        let content = format!("def {name} = {value}\nprintln {name}\n");
        let core = GroovyCore::new();
        let target = uri("/refs.groovy");
        core.open(&target, &content, 1);
        // Cursor on the declaration name.
        let decl_pos = Position::new(0, 4);
        let locations = must(core.references(
            &target,
            decl_pos,
            true,
            &CancellationToken::new(),
        ));
        prop_assert!(locations.iter().any(|l| l.range.contains(decl_pos)));
        prop_assert!(locations.len() >= 2);
    }

    // The cache never exceeds its configured capacity.
    #[test]
    fn cache_bound_holds_under_churn(capacity in 1usize..5, count in 1usize..12) {
        let core = GroovyCore::new();
        let config = CoreConfig { max_cached_documents: capacity, ..CoreConfig::default() };
        core.configure(config);
        for i in 0..count {
            core.open(&uri(&format!("/churn{i}.groovy")), "def a = 1\n", 1);
            prop_assert!(core.cache_statistics().entries <= capacity);
        }
    }
}
