/// Benchmarks for the catalog building pipeline.
///
/// Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cpp_envoy::domain::ast::AstDocument;
use cpp_envoy::domain::catalog::build_catalogs;
use cpp_envoy::ports::{BindingRenderer, HeaderRenderer};
use serde_json::json;

/// Create a synthetic AST document with configurable size.
fn synthetic_document(num_functions: usize, num_records: usize) -> AstDocument {
    let mut inner = Vec::new();
    for i in 0..num_functions {
        inner.push(json!({
            "kind": "FunctionDecl",
            "name": format!("func_{i}"),
            "loc": {"file": "synthetic.cpp", "line": i + 1, "col": 1},
            "type": {"qualType": "int (int, int)"},
            "inner": [
                {"kind": "ParmVarDecl", "name": "a", "type": {"qualType": "int"}},
                {"kind": "ParmVarDecl", "name": "b", "type": {"qualType": "int"}},
            ],
        }));
    }
    for r in 0..num_records {
        let fields: Vec<_> = (0..8)
            .map(|f| {
                json!({
                    "kind": "FieldDecl",
                    "name": format!("field_{f}"),
                    "loc": {"line": r * 10 + f + 2, "col": 3},
                    "type": {"qualType": "int"},
                })
            })
            .collect();
        inner.push(json!({
            "kind": "CXXRecordDecl",
            "name": format!("Record{r}"),
            "loc": {"file": "synthetic.cpp", "line": r * 10 + 1, "col": 1},
            "inner": fields,
        }));
    }
    AstDocument::from_json(&json!({
        "kind": "TranslationUnitDecl",
        "inner": inner,
    }))
    .expect("synthetic document lowers")
}

fn bench_build_catalogs(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_catalogs");
    for size in [10, 100, 1000] {
        let doc = synthetic_document(size, size / 10);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| build_catalogs(black_box(doc)).unwrap());
        });
    }
    group.finish();
}

fn bench_renderers(c: &mut Criterion) {
    let doc = synthetic_document(500, 50);
    let set = build_catalogs(&doc).unwrap();

    let mut group = c.benchmark_group("renderers");
    group.bench_function("bindings_500_functions", |b| {
        b.iter(|| BindingRenderer::render(black_box(&set.functions)).unwrap());
    });
    group.bench_function("header_400_members", |b| {
        b.iter(|| HeaderRenderer::render(black_box(&set.members)));
    });
    group.finish();
}

criterion_group!(benches, bench_build_catalogs, bench_renderers);
criterion_main!(benches);
