//! Performance benchmarks for observable models.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use observable_model::{to_options, Defaults, Model, Options, WatchConfig};
use serde_json::json;

fn wide_defaults(keys: usize) -> Defaults {
    let options: Options = (0..keys)
        .map(|i| (format!("key_{}", i), json!(i)))
        .collect();
    Defaults::new(options)
}

/// Benchmark set() with varying numbers of listeners on the changed key
fn bench_set_with_listeners(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_with_listeners");

    for listeners in [0, 1, 10, 100] {
        group.bench_with_input(
            BenchmarkId::new("listeners", listeners),
            &listeners,
            |b, &count| {
                let model = Model::new(wide_defaults(16));
                for _ in 0..count {
                    model.on_change("key_0", |value| {
                        black_box(value);
                    });
                }

                let mut n = 0u64;
                b.iter(|| {
                    n += 1;
                    model.set("key_0", n).unwrap();
                });
            },
        );
    }

    group.finish();
}

/// Benchmark patch() over models of different widths
fn bench_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch");

    for width in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("width", width), &width, |b, &width| {
            let model = Model::new(wide_defaults(width));
            let watch = model.watch(WatchConfig {
                buffer_size: 16,
                ..Default::default()
            });

            let mut n = 0u64;
            b.iter(|| {
                n += 1;
                let partial = to_options(&json!({"key_0": n, "key_1": {"nested": n}})).unwrap();
                model.patch(partial).unwrap();
                black_box(watch.drain());
            });
        });
    }

    group.finish();
}

/// Benchmark construction from a shared template
fn bench_construct(c: &mut Criterion) {
    let defaults = wide_defaults(32);

    c.bench_function("construct_32_keys", |b| {
        b.iter(|| black_box(Model::new(defaults.clone())));
    });
}

/// Benchmark serialization of models of different widths
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for width in [10, 100, 1000] {
        let model = Model::new(wide_defaults(width));
        group.bench_with_input(BenchmarkId::new("width", width), &model, |b, model| {
            b.iter(|| black_box(model.serialize().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_set_with_listeners,
    bench_patch,
    bench_construct,
    bench_serialize
);
criterion_main!(benches);
