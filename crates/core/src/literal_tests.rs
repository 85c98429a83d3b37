// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn s(v: &str) -> Literal {
    Literal::Str(v.to_string())
}

#[test]
fn parses_port_mapping_with_integer_keys() {
    let lit = parse("{80: 8080, 443: 8443}").unwrap();
    assert_eq!(
        lit,
        Literal::Map(vec![
            (Literal::Int(80), Literal::Int(8080)),
            (Literal::Int(443), Literal::Int(8443)),
        ])
    );
}

#[test]
fn parses_list_of_mixed_quotes() {
    let lit = parse(r#"['/data', "/srv:/srv:ro"]"#).unwrap();
    assert_eq!(lit, Literal::List(vec![s("/data"), s("/srv:/srv:ro")]));
}

#[test]
fn parses_tuple_values_inside_mapping() {
    let lit = parse("{'53/udp': ('127.0.0.1', 5353)}").unwrap();
    assert_eq!(
        lit,
        Literal::Map(vec![(
            s("53/udp"),
            Literal::Tuple(vec![s("127.0.0.1"), Literal::Int(5353)])
        )])
    );
}

#[test]
fn parenthesized_value_without_comma_is_not_a_tuple() {
    assert_eq!(parse("(8080)").unwrap(), Literal::Int(8080));
    assert_eq!(parse("(8080,)").unwrap(), Literal::Tuple(vec![Literal::Int(8080)]));
    assert_eq!(parse("()").unwrap(), Literal::Tuple(vec![]));
}

#[test]
fn accepts_trailing_commas_and_whitespace() {
    let lit = parse("  [ 1 ,\n 2 , ]  ").unwrap();
    assert_eq!(lit, Literal::List(vec![Literal::Int(1), Literal::Int(2)]));
    assert_eq!(parse("{1: 2,}").unwrap(), Literal::Map(vec![(Literal::Int(1), Literal::Int(2))]));
}

#[test]
fn accepts_json_documents() {
    let lit = parse(r#"{"80/tcp": [{"host": null}], "ok": true}"#).unwrap();
    assert_eq!(
        lit,
        Literal::Map(vec![
            (s("80/tcp"), Literal::List(vec![Literal::Map(vec![(s("host"), Literal::None)])])),
            (s("ok"), Literal::Bool(true)),
        ])
    );
}

#[yare::parameterized(
    python_none  = { "None",  Literal::None },
    json_null    = { "null",  Literal::None },
    python_true  = { "True",  Literal::Bool(true) },
    json_false   = { "false", Literal::Bool(false) },
    negative     = { "-12",   Literal::Int(-12) },
    plus_sign    = { "+7",    Literal::Int(7) },
)]
fn parses_scalars(input: &str, expected: Literal) {
    assert_eq!(parse(input).unwrap(), expected);
}

#[test]
fn decodes_escapes() {
    assert_eq!(parse(r#"'it\'s'"#).unwrap(), s("it's"));
    assert_eq!(parse(r#""a\tb\n""#).unwrap(), s("a\tb\n"));
    assert_eq!(parse(r#""\u00e9""#).unwrap(), s("é"));
    assert_eq!(parse(r#"'C:\data'"#).unwrap(), s("C:\\data"));
}

#[yare::parameterized(
    bare_word        = { "not-a-valid-literal" },
    unterminated     = { "'abc" },
    unclosed_list    = { "[1, 2" },
    missing_colon    = { "{80 8080}" },
    double_comma     = { "[1,,2]" },
    trailing_garbage = { "{80: 8080} x" },
    lone_sign        = { "-" },
    float            = { "1.5" },
    empty            = { "" },
    bad_unicode      = { r#""\u12""# },
)]
fn rejects_malformed_input(input: &str) {
    assert!(parse(input).is_err(), "expected error for {input:?}");
}

#[test]
fn reports_unknown_names() {
    let err = parse("nginx").unwrap_err();
    assert_eq!(err, LiteralError::UnknownName { name: "nginx".to_string(), pos: 0 });
}

#[test]
fn rejects_integer_overflow() {
    let err = parse("99999999999999999999").unwrap_err();
    assert_eq!(err, LiteralError::IntOutOfRange { pos: 0 });
}

#[test]
fn rejects_excessive_nesting() {
    let deep = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
    assert!(matches!(parse(&deep), Err(LiteralError::TooDeep { .. })));

    let ok = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
    assert!(parse(&ok).is_ok());
}

#[test]
fn accessors_match_kind() {
    let lit = parse("[1, 'a']").unwrap();
    assert_eq!(lit, Literal::List(vec![Literal::Int(1), Literal::Str("a".into())]));
    assert_eq!(Literal::Str("a".into()).as_str(), Some("a"));
    assert_eq!(Literal::Int(1).as_str(), None);
    assert_eq!(lit.kind(), "list");
}

proptest! {
    #[test]
    fn never_panics_on_arbitrary_input(input in ".{0,64}") {
        let _ = parse(&input);
    }

    #[test]
    fn integer_mappings_parse_exactly(pairs in proptest::collection::vec((1u16.., 1u16..), 0..8)) {
        let body = pairs
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join(", ");
        let lit = parse(&format!("{{{body}}}")).unwrap();
        let expected = pairs
            .iter()
            .map(|(k, v)| (Literal::Int(i64::from(*k)), Literal::Int(i64::from(*v))))
            .collect::<Vec<_>>();
        prop_assert_eq!(lit, Literal::Map(expected));
    }
}
