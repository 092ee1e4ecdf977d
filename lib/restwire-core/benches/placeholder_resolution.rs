use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use indexmap::IndexMap;
use restwire_core::parameters::placeholder::{ConsumedKeys, Position, resolve};
use restwire_core::parameters::query::{build_url, merge_query};
use restwire_core::parameters::{ArgValue, bind};
use restwire_core::{BindingKind, ParamDecl};
use serde_json::{Value, json};

fn args(values: &[(&str, Value)]) -> IndexMap<String, ArgValue> {
    values
        .iter()
        .map(|(name, value)| {
            let arg = ArgValue::new(value).expect("serializable");
            ((*name).to_string(), arg)
        })
        .collect()
}

fn benchmark_placeholder_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("placeholder_resolution");

    let params = [
        ParamDecl::path("version"),
        ParamDecl::path("id"),
        ParamDecl::path("query"),
        ParamDecl::query("active"),
        ParamDecl::unbound("tags"),
    ];
    let values = args(&[
        ("version", json!("v1")),
        ("id", json!(789)),
        ("query", json!("hello world & special chars @#$%")),
        ("active", json!(true)),
        ("tags", json!(["rust", "web", "api"])),
    ]);
    let bindings = bind(&params, &values);

    let templates = [
        "/users/{id}",
        "/api/{version}/users/{id}/posts/{id}/comments/{version}",
        "/search/{query}",
        "/api/${version}/items/${missing:fallback}",
    ];

    for (i, template) in templates.iter().enumerate() {
        group.bench_function(format!("resolve_{i}"), |b| {
            b.iter(|| {
                let mut consumed = ConsumedKeys::default();
                let result = resolve(
                    black_box(template),
                    bindings.of(BindingKind::Path),
                    Position::Path,
                    &mut consumed,
                );
                black_box(result);
            });
        });
    }

    let static_query = vec![("lang".to_string(), "${lang:en}".to_string())];
    group.bench_function("assemble_url", |b| {
        b.iter(|| {
            let path = resolve(
                templates[1],
                bindings.of(BindingKind::Path),
                Position::Path,
                &mut ConsumedKeys::default(),
            );
            let pairs = merge_query(
                &static_query,
                bindings.of(BindingKind::Query),
                &mut ConsumedKeys::default(),
            );
            let url = build_url(black_box("http://api.test"), &path, &pairs).expect("valid url");
            black_box(url);
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_placeholder_resolution);
criterion_main!(benches);
