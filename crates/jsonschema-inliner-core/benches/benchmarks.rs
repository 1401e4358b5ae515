//! Criterion benchmarks for the jsonschema-inliner-core inliner.
//!
//! Schemas are built outside the benchmark loop so each iteration measures
//! only analyze+rewrite, not JSON construction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use jsonschema_inliner_core::{inline, DocumentStore, InlineOptions};

fn simple_schema() -> Value {
    json!({
        "properties": { "user": { "$ref": "#/$defs/User" } },
        "$defs": {
            "User": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "age": { "type": "integer" }
                }
            }
        }
    })
}

fn cyclic_schema() -> Value {
    json!({
        "$defs": {
            "Node": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "children": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/Node" },
                        "minItems": 0
                    }
                },
                "required": ["name"]
            }
        },
        "properties": { "root": { "$ref": "#/$defs/Node" } }
    })
}

/// A schema with many sibling $defs, each inlined once — exercises the
/// consolidation and name-allocation path at width rather than depth.
fn wide_schema(n: usize) -> Value {
    let mut defs = serde_json::Map::new();
    let mut properties = serde_json::Map::new();
    for i in 0..n {
        let name = format!("Item{i}");
        defs.insert(name.clone(), json!({ "type": "object", "properties": { "id": { "type": "integer" } } }));
        properties.insert(format!("item{i}"), json!({ "$ref": format!("#/$defs/{name}") }));
    }
    json!({ "properties": properties, "$defs": defs })
}

fn bench_inline_simple(c: &mut Criterion) {
    let schema = simple_schema();

    c.bench_function("inline/simple", |b| {
        b.iter(|| {
            let store = DocumentStore::new(black_box(schema.clone())).unwrap();
            inline(black_box(schema.clone()), &store, &InlineOptions::default()).unwrap()
        })
    });
}

fn bench_inline_cyclic(c: &mut Criterion) {
    let schema = cyclic_schema();

    c.bench_function("inline/cyclic", |b| {
        b.iter(|| {
            let store = DocumentStore::new(black_box(schema.clone())).unwrap();
            inline(black_box(schema.clone()), &store, &InlineOptions::default()).unwrap()
        })
    });
}

fn bench_inline_wide(c: &mut Criterion) {
    let schema = wide_schema(200);

    c.bench_function("inline/wide_200", |b| {
        b.iter(|| {
            let store = DocumentStore::new(black_box(schema.clone())).unwrap();
            inline(black_box(schema.clone()), &store, &InlineOptions::default()).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_inline_simple,
    bench_inline_cyclic,
    bench_inline_wide,
);
criterion_main!(benches);
