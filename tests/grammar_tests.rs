//! Grammar loading tests: pretty-print round-trips, file inclusion, and
//! load-time rejection of inconsistent grammars.

use lsys::parser::{ParseErrorKind, Parser};
use std::fs;
use std::path::PathBuf;

#[test]
fn pretty_print_reparses_to_the_same_text() {
    let source = "\
        define angle 22.5 ;\n\
        ignore : + - ;\n\
        start : F(2) A ;\n\
        A -> (0.4) [ + F A ], (0.6) F A ;\n\
        B < A > B : angle > 10 -> F ;\n";
    let first = Parser::parse_str(source).unwrap();
    let printed = first.to_string();
    let second = Parser::parse_str(&printed).unwrap();
    assert_eq!(printed, second.to_string());
    assert_eq!(first.productions.len(), second.productions.len());
    assert_eq!(first.constants, second.constants);
}

#[test]
fn keyword_colon_is_optional() {
    let with = Parser::parse_str("define : n 1 ; start : A ;").unwrap();
    let without = Parser::parse_str("define n 1 ; start A ;").unwrap();
    assert_eq!(with.to_string(), without.to_string());
}

/// A scratch directory under the system temp dir, unique per test.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lsys-test-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn include_merges_the_other_file() {
    let dir = scratch("include");
    fs::write(dir.join("defs.ls"), "define unit 2 ;\nignore : + ;\n").unwrap();
    fs::write(
        dir.join("main.ls"),
        "include : \"defs.ls\" ;\nstart : F(unit) ;\n",
    )
    .unwrap();

    let grammar = Parser::parse_file(dir.join("main.ls")).unwrap();
    assert!(grammar.ignore.contains("+"));
    assert_eq!(
        lsys::grammar::module::format_sequence(&grammar.start),
        "F(2)"
    );
}

#[test]
fn self_inclusion_terminates() {
    let dir = scratch("self-include");
    fs::write(
        dir.join("loop.ls"),
        "include : \"loop.ls\" ;\ndefine once 1 ;\n",
    )
    .unwrap();

    let grammar = Parser::parse_file(dir.join("loop.ls")).unwrap();
    assert_eq!(grammar.constants.len(), 1);
}

#[test]
fn missing_include_is_a_semantic_error() {
    let e = Parser::parse_str("include : \"no-such-file.ls\" ;").unwrap_err();
    assert_eq!(e.kind, ParseErrorKind::Semantic);
}

#[test]
fn lexical_syntax_and_semantic_errors_are_distinguished() {
    let lexical = Parser::parse_str("define a 1 $ 2 ;").unwrap_err();
    assert_eq!(lexical.kind, ParseErrorKind::Lexical);

    let syntax = Parser::parse_str("A -> -> B ;").unwrap_err();
    assert_eq!(syntax.kind, ParseErrorKind::Syntax);

    let semantic = Parser::parse_str("define a nope + 1 ;").unwrap_err();
    assert_eq!(semantic.kind, ParseErrorKind::Semantic);
}

#[test]
fn errors_carry_locations() {
    let e = Parser::parse_str("start : A ;\nA -> (x) B ;").unwrap_err();
    assert_eq!(e.location.line, 2);
}

#[test]
fn error_display_names_the_file() {
    let dir = scratch("error-file");
    let path = dir.join("bad.ls");
    fs::write(&path, "A -> ->\n").unwrap();
    let e = Parser::parse_file(&path).unwrap_err();
    assert!(e.to_string().contains("bad.ls"));
}
