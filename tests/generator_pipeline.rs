/// Pipeline verification tests: catalog building and both renderers
/// over hand-built clang AST documents.

use cpp_envoy::domain::ast::AstDocument;
use cpp_envoy::domain::catalog::build_catalogs;
use cpp_envoy::domain::diagnostics::GenError;
use cpp_envoy::ports::{BindingRenderer, HeaderRenderer};
use serde_json::json;

/// Helper to build a FunctionDecl node the way clang serializes it.
fn function_node(
    name: &str,
    ret: &str,
    params: &[(&str, &str)],
    file: &str,
    line: u32,
) -> serde_json::Value {
    let types: Vec<String> = params.iter().map(|(_, t)| t.to_string()).collect();
    let inner: Vec<_> = params
        .iter()
        .map(|(n, t)| {
            json!({
                "kind": "ParmVarDecl",
                "name": n,
                "loc": {"line": line, "col": 20},
                "type": {"qualType": t},
            })
        })
        .collect();
    json!({
        "kind": "FunctionDecl",
        "name": name,
        "loc": {"file": file, "line": line, "col": 5},
        "type": {"qualType": format!("{} ({})", ret, types.join(", "))},
        "inner": inner,
    })
}

fn record_node(name: &str, fields: &[(&str, &str, &str, u32)]) -> serde_json::Value {
    let inner: Vec<_> = fields
        .iter()
        .map(|(n, t, file, line)| {
            json!({
                "kind": "FieldDecl",
                "name": n,
                "loc": {"file": file, "line": line, "col": 7},
                "type": {"qualType": t},
            })
        })
        .collect();
    json!({
        "kind": "CXXRecordDecl",
        "name": name,
        "loc": {"file": fields.first().map(|f| f.2).unwrap_or("main.cpp"), "line": 1, "col": 8},
        "inner": inner,
    })
}

fn document(inner: Vec<serde_json::Value>) -> AstDocument {
    AstDocument::from_json(&json!({
        "kind": "TranslationUnitDecl",
        "inner": inner,
    }))
    .expect("document lowers")
}

/// Scenario: one plain function `int add(int a, int b)`.
#[test]
fn test_single_function_produces_one_entry_and_marshaling_blocks() {
    let doc = document(vec![function_node(
        "add",
        "int",
        &[("a", "int"), ("b", "int")],
        "main.cpp",
        3,
    )]);
    let set = build_catalogs(&doc).unwrap();

    assert_eq!(set.functions.len(), 1);
    assert!(set.diagnostics.is_empty());

    let bindings = BindingRenderer::render(&set.functions).unwrap();
    assert!(bindings.contains("def add(runner, a, b):"));
    assert!(bindings.contains("payload = struct.pack('<ii', a, b)"));
    assert!(bindings.contains("runner.invoke('add', payload)"));
    assert!(bindings.contains("(result,) = struct.unpack('<i', response)"));
}

#[test]
fn test_catalog_size_equals_qualifying_declarations() {
    let doc = document(vec![
        function_node("one", "void", &[], "main.cpp", 1),
        json!({"kind": "TypedefDecl", "name": "byte"}),
        function_node("two", "void", &[], "main.cpp", 2),
        record_node("Point", &[("x", "int", "main.cpp", 4), ("y", "int", "main.cpp", 5)]),
    ]);
    let set = build_catalogs(&doc).unwrap();
    assert_eq!(set.functions.len(), 2);
    assert_eq!(set.members.len(), 2);
}

#[test]
fn test_catalog_order_equals_declaration_order() {
    let doc = document(vec![
        function_node("zeta", "void", &[], "main.cpp", 1),
        function_node("alpha", "void", &[], "main.cpp", 2),
        function_node("beta", "void", &[], "main.cpp", 3),
    ]);
    let set = build_catalogs(&doc).unwrap();
    let keys: Vec<&str> = set.functions.keys().collect();
    assert_eq!(keys, vec!["zeta", "alpha", "beta"]);
}

/// Scenario: overloads `f(int)` and `f(float)` get distinct keys.
#[test]
fn test_overloaded_functions_are_disambiguated() {
    let doc = document(vec![
        function_node("f", "void", &[("x", "int")], "main.cpp", 1),
        function_node("f", "void", &[("x", "float")], "main.cpp", 2),
    ]);
    let set = build_catalogs(&doc).unwrap();
    assert_eq!(set.functions.len(), 2);
    assert!(set.functions.contains_key("f__int"));
    assert!(set.functions.contains_key("f__float"));

    let bindings = BindingRenderer::render(&set.functions).unwrap();
    assert!(bindings.contains("def f__int(runner, x):"));
    assert!(bindings.contains("def f__float(runner, x):"));
}

#[test]
fn test_colliding_overloads_abort_the_run() {
    let doc = document(vec![
        function_node("f", "void", &[("x", "int")], "main.cpp", 1),
        function_node("f", "void", &[("y", "int")], "main.cpp", 2),
    ]);
    let err = build_catalogs(&doc).unwrap_err();
    assert!(matches!(err, GenError::AmbiguousSymbol { .. }));
}

/// Scenario: a field of an unresolvable anonymous-union type is
/// excluded with one diagnostic and the run still succeeds.
#[test]
fn test_unresolvable_field_type_is_recovered() {
    let doc = document(vec![record_node(
        "Packet",
        &[
            ("tag", "int", "main.cpp", 2),
            ("body", "(anonymous union at main.cpp:3:3)", "main.cpp", 3),
        ],
    )]);
    let set = build_catalogs(&doc).unwrap();
    assert_eq!(set.members.len(), 1);
    assert!(set.members.contains_key("Packet::tag"));
    assert_eq!(set.diagnostics.len(), 1);
    assert_eq!(set.diagnostics[0].symbol, "Packet::body");

    // The surviving member still renders.
    let header = HeaderRenderer::render(&set.members);
    assert_eq!(header.matches("inline void *").count(), 1);
}

#[test]
fn test_unmapped_type_fails_rendering_with_no_output() {
    let doc = document(vec![
        function_node("fine", "int", &[], "main.cpp", 1),
        function_node("poke", "void", &[("p", "int *")], "main.cpp", 2),
    ]);
    let set = build_catalogs(&doc).unwrap();
    assert_eq!(set.functions.len(), 2, "catalog building itself succeeds");

    let result = BindingRenderer::render(&set.functions);
    let Err(GenError::UnsupportedType { symbol, type_name }) = result else {
        panic!("expected UnsupportedType, got {result:?}");
    };
    assert_eq!(symbol, "poke");
    assert_eq!(type_name, "int *");
}

#[test]
fn test_rendering_twice_is_byte_identical() {
    let doc = document(vec![
        function_node("add", "int", &[("a", "int"), ("b", "int")], "main.cpp", 1),
        record_node("Point", &[("x", "int", "main.cpp", 4), ("y", "int", "main.cpp", 5)]),
    ]);
    let set = build_catalogs(&doc).unwrap();
    assert_eq!(
        BindingRenderer::render(&set.functions).unwrap(),
        BindingRenderer::render(&set.functions).unwrap()
    );
    assert_eq!(
        HeaderRenderer::render(&set.members),
        HeaderRenderer::render(&set.members)
    );
}

#[test]
fn test_malformed_document_aborts() {
    let raw = json!({
        "kind": "TranslationUnitDecl",
        "inner": [
            {"kind": "FieldDecl", "name": "stray"}
        ]
    });
    let err = AstDocument::from_json(&raw).unwrap_err();
    assert!(matches!(err, GenError::MalformedAst { .. }));
}

#[test]
fn test_void_function_with_buffer_parameter() {
    let doc = document(vec![function_node(
        "send",
        "void",
        &[("data", "const char *")],
        "main.cpp",
        1,
    )]);
    let set = build_catalogs(&doc).unwrap();
    let bindings = BindingRenderer::render(&set.functions).unwrap();
    assert!(bindings.contains("data = data.encode() if isinstance(data, str) else bytes(data)"));
    assert!(bindings.contains("payload += struct.pack('<H', len(data)) + data"));
    assert!(bindings.contains("return None"));
}
