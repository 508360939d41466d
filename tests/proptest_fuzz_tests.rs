//! Property-based tests for the Geode front half and IR text encoding
//!
//! These tests use proptest to generate inputs and verify that:
//! 1. Type annotations count pointer markers exactly and accept one `?` at most
//! 2. String escaping for the IR is reversible
//! 3. Scanning, parsing and lowering never panic on arbitrary input
//! 4. Every generated loop lowers to four sealed blocks with its own prefix

use geode::compiler::ir::{enc, IrType, MetadataString, MetadataTuple, SliceType};
use geode::compiler::{CompileOptions, Compiler};
use geode::{Error, Parser, Scanner, Token, TokenKind};
use proptest::prelude::*;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

fn type_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("int".to_string()),
        Just("byte".to_string()),
        Just("double".to_string()),
        Just("bool".to_string()),
        Just("i32".to_string()),
    ]
}

/// Pointer markers split into star runs, e.g. 5 stars as `**`, `*`, `**`
fn star_runs() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..4, 0..5)
}

fn tok(kind: TokenKind, lexeme: &str, column: usize) -> Token {
    Token::new(kind, lexeme.to_string(), 1, column)
}

/// Generate tokens that look like Geode source elements
fn geode_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("func".to_string()),
        Just("extern".to_string()),
        Just("return".to_string()),
        Just("for".to_string()),
        Just("if".to_string()),
        Just("else".to_string()),
        Just("int".to_string()),
        Just("byte".to_string()),
        Just("void".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just(";".to_string()),
        Just(",".to_string()),
        Just("->".to_string()),
        Just("...".to_string()),
        Just("?".to_string()),
        Just("*".to_string()),
        Just("=".to_string()),
        Just("+".to_string()),
        Just("<".to_string()),
        Just("&&".to_string()),
        Just("!".to_string()),
        Just("len".to_string()),
        "[a-z]{1,3}".prop_map(|s| s),
        (-100i64..100).prop_map(|n| n.to_string()),
        "[a-z ]{0,6}".prop_map(|s| format!("\"{}\"", s)),
    ]
}

fn geode_like_source() -> impl Strategy<Value = String> {
    prop::collection::vec(geode_token(), 0..60).prop_map(|tokens| tokens.join(" "))
}

// =============================================================================
// TYPE ANNOTATIONS
// =============================================================================

proptest! {
    #[test]
    fn prop_pointer_level_counts_every_star(
        name in type_name(),
        runs in star_runs(),
        inferred in any::<bool>(),
    ) {
        let mut tokens = vec![tok(TokenKind::Type(name.clone()), &name, 1)];
        for run in &runs {
            let stars = "*".repeat(*run);
            tokens.push(tok(TokenKind::Oper(stars.clone()), &stars, 2));
        }
        if inferred {
            tokens.push(tok(TokenKind::Question, "?", 3));
        }
        tokens.push(tok(TokenKind::Identifier("x".to_string()), "x", 4));

        let ty = Parser::new(tokens).parse_type().unwrap();
        prop_assert_eq!(ty.name, name);
        prop_assert_eq!(ty.pointer_level, runs.iter().sum::<usize>());
        prop_assert_eq!(ty.unknown, inferred);
    }

    #[test]
    fn prop_second_inference_marker_rejected(
        name in type_name(),
        before in 0usize..3,
        between in 0usize..3,
    ) {
        let source = format!(
            "{}{}?{}? x",
            name,
            "*".repeat(before),
            "*".repeat(between)
        );
        let tokens = Scanner::new(&source).scan_tokens().unwrap();
        let is_duplicate = matches!(
            Parser::new(tokens).parse_type(),
            Err(Error::DuplicateUnknownModifier { .. })
        );
        prop_assert!(is_duplicate);
    }

    #[test]
    fn prop_slice_layout_is_pointer_then_length(depth in 0usize..4, name in type_name()) {
        let mut elem = match name.as_str() {
            "double" => IrType::DOUBLE,
            "byte" => IrType::I8,
            _ => IrType::I64,
        };
        for _ in 0..depth {
            elem = elem.pointer_to();
        }
        let slice = SliceType::new(elem.clone());
        prop_assert_eq!(
            slice.underlying().fields().map(<[IrType]>::to_vec),
            Some(vec![elem.pointer_to(), IrType::I64])
        );
    }
}

// =============================================================================
// TEXT ENCODING
// =============================================================================

proptest! {
    #[test]
    fn prop_escape_round_trip(s in any::<String>()) {
        let escaped = enc::escape_string(&s);
        prop_assert!(!escaped.contains('"'));
        prop_assert_eq!(enc::unescape_string(&escaped).unwrap(), s);
    }

    #[test]
    fn prop_quotes_and_backslashes_round_trip(s in "[\"\\\\a-z ]{0,40}") {
        let escaped = enc::escape_string(&s);
        prop_assert_eq!(enc::unescape_string(&escaped).unwrap(), s);
    }

    #[test]
    fn prop_tuple_definition_lists_children(values in prop::collection::vec("[a-z]{0,8}", 0..8)) {
        let mut md = MetadataTuple::with_id("9");
        for v in &values {
            md.add(MetadataString::new(v.clone()));
        }
        let children: Vec<String> = values.iter().map(|v| format!("!\"{}\"", v)).collect();
        let expected = format!("!{{{}}}", children.join(", "));
        prop_assert_eq!(md.def(), expected.clone());
        prop_assert_eq!(md.def(), expected);
        prop_assert_eq!(md.ident(), "!9");
    }
}

// =============================================================================
// NO-PANIC FUZZING
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn fuzz_scanner_never_panics(source in prop::string::string_regex(r"[\x00-\x7F]{0,200}").unwrap()) {
        let _ = Scanner::new(&source).scan_tokens();
    }

    #[test]
    fn fuzz_compile_never_panics(source in geode_like_source()) {
        let options = CompileOptions {
            queue_capacity: 2,
            ..Default::default()
        };
        let _ = Compiler::new(options).compile_source(&source);
    }
}

// =============================================================================
// LOOP LOWERING
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_loop_gets_four_sealed_blocks(loops in 1usize..20, bound in 0i64..50) {
        let mut source = String::from("func f() -> int {\n int acc = 0;\n");
        for _ in 0..loops {
            source.push_str(&format!(
                "for int i = 0; i < {}; i = i + 1 {{ acc = acc + i; }}\n",
                bound
            ));
        }
        source.push_str("return acc;\n}");

        let unit = Compiler::new(CompileOptions::default())
            .compile_source(&source)
            .unwrap();
        prop_assert!(unit.diagnostics.is_empty());
        let func = unit.module.function("f").unwrap();

        for index in 0..loops {
            let prefix = format!("F{:X}_", index);
            let names: Vec<&str> = func
                .blocks
                .iter()
                .map(|b| b.name.as_str())
                .filter(|n| n.starts_with(&prefix))
                .collect();
            prop_assert_eq!(names.len(), 4);

            let cond = func.block_by_name(&format!("{}cond", prefix)).unwrap();
            let body = format!("{}body", prefix);
            let end = format!("{}end", prefix);
            prop_assert_eq!(cond.successors(), vec![body.as_str(), end.as_str()]);
        }
        prop_assert!(func.blocks.iter().all(|b| b.is_terminated()));
    }
}
