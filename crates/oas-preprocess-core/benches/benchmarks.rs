//! Criterion benchmarks for the preprocessing pipeline.
//!
//! Fixtures are parsed outside the benchmark loop so only collection,
//! walking, and the rewrite passes are measured.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use serde_json::{json, Map, Value};

use oas_preprocess_core::{preprocess_document, PreprocessOptions};

fn load_fixture(name: &str) -> Value {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {path}: {e}"))
}

/// `count` components chained through properties, each with a date field.
fn chained_components(count: usize) -> Value {
    let mut schemas = Map::new();
    for i in 0..count {
        schemas.insert(
            format!("S{i}"),
            json!({
                "type": "object",
                "required": ["id", "at"],
                "properties": {
                    "id": { "type": "string", "readOnly": true },
                    "at": { "type": "string", "format": "date-time" },
                    "next": { "$ref": format!("#/components/schemas/S{}", (i + 1) % count) }
                }
            }),
        );
    }
    json!({ "openapi": "3.0.3", "paths": {}, "components": { "schemas": schemas } })
}

fn bench_petstore(c: &mut Criterion) {
    let document = load_fixture("petstore.json");
    let options = PreprocessOptions::default();

    c.bench_function("preprocess/petstore", |b| {
        b.iter_batched(
            || document.clone(),
            |doc| preprocess_document(black_box(doc), black_box(&options)).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_petstore_dedicated_response(c: &mut Criterion) {
    let document = load_fixture("petstore.json");
    let options = PreprocessOptions {
        use_dedicated_response_doc: true,
        ..PreprocessOptions::default()
    };

    c.bench_function("preprocess/petstore_dedicated_response", |b| {
        b.iter_batched(
            || document.clone(),
            |doc| preprocess_document(black_box(doc), black_box(&options)).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_cyclic_components(c: &mut Criterion) {
    let document = chained_components(500);
    let options = PreprocessOptions::default();

    c.bench_function("preprocess/cyclic_500", |b| {
        b.iter_batched(
            || document.clone(),
            |doc| preprocess_document(black_box(doc), black_box(&options)).unwrap(),
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_petstore,
    bench_petstore_dedicated_response,
    bench_cyclic_components,
);
criterion_main!(benches);
