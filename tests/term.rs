//! Term tests: surface-syntax printing, structural equality, variable chains.

use std::collections::HashSet;

use mspec::term::{GROUP_OP, MAX_VARIABLE_DEPTH};
use mspec::{SimpleTypeReference, Term, TermError, TypeReference, VariableLiteral};

// ==================== Printing ====================

#[test]
fn test_literal_representation() {
    assert_eq!(Term::null().string_representation(), "null");
    assert_eq!(Term::boolean(false).string_representation(), "false");
    assert_eq!(Term::integer(-42).string_representation(), "-42");
    assert_eq!(Term::float(1.5).string_representation(), "1.5");
    assert_eq!(Term::float(2.0).string_representation(), "2.0");
    assert_eq!(Term::hex("0x0F").string_representation(), "0x0F");
    assert_eq!(Term::string("abc").string_representation(), "\"abc\"");
}

#[test]
fn test_float_prints_plain_decimal() {
    assert_eq!(Term::float(1e21).to_string(), "1000000000000000000000.0");
    assert_eq!(Term::float(0.001).to_string(), "0.001");
    assert_eq!(Term::float(-3.0).to_string(), "-3.0");
    assert_eq!(Term::float(f64::NAN).to_string(), "NaN");
    assert_eq!(Term::float(f64::INFINITY).to_string(), "Infinity");
    assert_eq!(Term::float(f64::NEG_INFINITY).to_string(), "-Infinity");
}

#[test]
fn test_variable_chain_with_index() {
    let b = VariableLiteral::new("b").with_index(2);
    let ab = VariableLiteral::new("a").with_child(b).expect("depth 2");
    assert_eq!(Term::from(ab).string_representation(), "a.b[2]");
}

#[test]
fn test_variable_with_args() {
    let call = VariableLiteral::new("STATIC_CALL")
        .with_args(vec![Term::variable("count"), Term::integer(1)]);
    assert_eq!(Term::from(call).to_string(), "STATIC_CALL(count,1)");

    let empty = VariableLiteral::new("lengthInBytes").with_args(Vec::new());
    assert_eq!(Term::from(empty).to_string(), "lengthInBytes()");
}

#[test]
fn test_unary_prefix_and_group() {
    let not = Term::unary(Term::variable("flag"), "!");
    assert_eq!(not.string_representation(), "!flag");
    let grouped = Term::group(Term::binary(Term::variable("a"), Term::integer(1), "+"));
    assert_eq!(grouped.string_representation(), "(a+1)");
}

#[test]
fn test_binary_prints_without_implicit_parentheses() {
    let sum = Term::binary(Term::variable("a"), Term::variable("b"), "+");
    let product = Term::binary(sum, Term::variable("c"), "*");
    assert_eq!(product.string_representation(), "a+b*c");
    assert_eq!(product.parenthesized_representation(), "((a+b)*c)");
}

#[test]
fn test_explicit_group_survives_printing() {
    let sum = Term::binary(Term::variable("a"), Term::variable("b"), "+");
    let product = Term::binary(Term::group(sum), Term::variable("c"), "*");
    assert_eq!(product.string_representation(), "(a+b)*c");
}

#[test]
fn test_ternary_representation() {
    let t = Term::ternary(
        Term::binary(Term::variable("type"), Term::hex("0x01"), "=="),
        Term::integer(4),
        Term::integer(8),
    );
    assert_eq!(t.string_representation(), "(type==0x01)?(4):(8)");
    assert_eq!(t.parenthesized_representation(), "((type==0x01))?(4):(8)");
}

#[test]
fn test_nested_args_use_same_mode() {
    let call = VariableLiteral::new("COUNT")
        .with_args(vec![Term::binary(Term::variable("n"), Term::integer(2), "-")]);
    let t = Term::binary(Term::from(call), Term::integer(1), "+");
    assert_eq!(t.string_representation(), "COUNT(n-2)+1");
    assert_eq!(t.parenthesized_representation(), "(COUNT((n-2))+1)");
}

// ==================== Equality ====================

#[test]
fn test_structural_equality() {
    let a = Term::binary(Term::variable("payloadLength"), Term::integer(4), "-");
    let b = Term::binary(Term::variable("payloadLength"), Term::integer(4), "-");
    assert_eq!(a, b);
    assert_ne!(a, Term::binary(Term::variable("payloadLength"), Term::integer(4), "+"));
    assert_ne!(a, Term::binary(Term::variable("payloadLength"), Term::integer(3), "-"));
    assert_ne!(a, Term::binary(Term::integer(4), Term::variable("payloadLength"), "-"));
}

#[test]
fn test_numeric_kinds_are_distinct() {
    assert_ne!(Term::integer(1), Term::float(1.0));
    assert_eq!(Term::float(0.5), Term::float(0.5));
}

#[test]
fn test_dedup_via_hashset() {
    let mut set = HashSet::new();
    for _ in 0..3 {
        set.insert(Term::binary(Term::variable("len"), Term::integer(2), "*"));
    }
    set.insert(Term::variable("len"));
    set.insert(Term::group(Term::variable("len")));
    assert_eq!(set.len(), 3);
}

#[test]
fn test_variable_equality_ignores_type_binding() {
    let bound = VariableLiteral::new("length");
    bound
        .bind_type_reference(TypeReference::from(SimpleTypeReference::byte()))
        .expect("bind");
    let unbound = VariableLiteral::new("length");
    assert_eq!(bound, unbound);

    let mut set = HashSet::new();
    set.insert(Term::from(bound));
    set.insert(Term::from(unbound));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_variable_equality_considers_chain_and_index() {
    let plain = VariableLiteral::path(["a", "b"]).expect("path");
    let other = VariableLiteral::path(["a", "c"]).expect("path");
    assert_ne!(plain, other);
    let indexed = VariableLiteral::new("a").with_index(0);
    assert_ne!(VariableLiteral::new("a"), indexed);
}

// ==================== Variables ====================

#[test]
fn test_path_builds_chain() {
    let v = VariableLiteral::path(["header", "flags", "ack"]).expect("path");
    assert_eq!(v.depth(), 3);
    let names: Vec<&str> = v.segments().map(VariableLiteral::name).collect();
    assert_eq!(names, ["header", "flags", "ack"]);
    assert_eq!(v.child().map(VariableLiteral::name), Some("flags"));
    assert_eq!(Term::from(v).to_string(), "header.flags.ack");
}

#[test]
fn test_path_rejects_empty() {
    let segments: Vec<String> = Vec::new();
    assert_eq!(VariableLiteral::path(segments).unwrap_err(), TermError::EmptyPath);
}

#[test]
fn test_depth_limit() {
    let at_limit: Vec<String> = (0..MAX_VARIABLE_DEPTH).map(|i| format!("s{i}")).collect();
    assert_eq!(
        VariableLiteral::path(at_limit).expect("at limit").depth(),
        MAX_VARIABLE_DEPTH
    );

    let over: Vec<String> = (0..=MAX_VARIABLE_DEPTH).map(|i| format!("s{i}")).collect();
    assert!(matches!(
        VariableLiteral::path(over),
        Err(TermError::TooDeep { max: MAX_VARIABLE_DEPTH, .. })
    ));
}

#[test]
fn test_bind_type_reference_once() {
    let v = VariableLiteral::new("length");
    assert!(v.type_reference().is_none());
    v.bind_type_reference(TypeReference::from(SimpleTypeReference::byte()))
        .expect("first bind");
    assert_eq!(
        v.bind_type_reference(TypeReference::from(SimpleTypeReference::bit())),
        Err(TermError::TypeAlreadyBound {
            name: "length".to_string()
        })
    );
    assert_eq!(v.type_reference().map(|r| r.to_string()).as_deref(), Some("byte"));
}

#[test]
fn test_contains_walks_whole_term() {
    let call = VariableLiteral::new("COUNT").with_args(vec![Term::variable("items")]);
    let chain = VariableLiteral::path(["header", "length"]).expect("path");
    let t = Term::ternary(
        Term::unary(Term::variable("flag"), "!"),
        Term::from(call),
        Term::binary(Term::from(chain), Term::integer(4), "-"),
    );
    for name in ["flag", "COUNT", "items", "header", "length"] {
        assert!(t.contains(name), "{name} should be found");
    }
    assert!(!t.contains("missing"));
    assert!(!Term::string("flag").contains("flag"), "string literals are not variables");
}

#[test]
fn test_as_variable() {
    assert_eq!(Term::variable("x").as_variable().map(VariableLiteral::name), Some("x"));
    assert!(Term::integer(1).as_variable().is_none());
    let grouped = Term::group(Term::variable("x"));
    let Term::Unary(u) = &grouped else {
        panic!("unary expected");
    };
    assert_eq!(u.op, GROUP_OP);
}
