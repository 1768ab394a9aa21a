//! Benchmarks for deck assembly and serialization.
//!
//! Run with: cargo bench
//!
//! Decks of increasing length are built on the built-in light frame.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use slidegen::pptx::Template;
use slidegen::{assemble, parse_bytes, DeckRequest, TemplateRegistry, TemplateStyle};
use std::sync::Arc;

const DECK_SIZES: [i64; 4] = [1, 10, 50, 200];

fn light_template() -> Arc<Template> {
    TemplateRegistry::builtin()
        .unwrap()
        .get(TemplateStyle::Light)
        .unwrap()
}

fn request(slides: i64) -> DeckRequest {
    DeckRequest::new("Benchmark deck", "criterion", "Python basics", slides)
}

fn bench_assembly(c: &mut Criterion) {
    let template = light_template();
    let mut group = c.benchmark_group("assemble");

    for slides in DECK_SIZES {
        group.throughput(Throughput::Elements(slides as u64));
        group.bench_with_input(BenchmarkId::from_parameter(slides), &slides, |b, &slides| {
            let request = request(slides);
            b.iter(|| assemble(black_box(&template), black_box(&request)).unwrap().len());
        });
    }

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let template = light_template();
    let mut group = c.benchmark_group("write_deck");

    for slides in DECK_SIZES {
        let deck = assemble(&template, &request(slides)).unwrap();
        group.throughput(Throughput::Elements(slides as u64));
        group.bench_with_input(BenchmarkId::from_parameter(slides), &deck, |b, deck| {
            b.iter(|| black_box(deck.to_bytes().unwrap()));
        });
    }

    group.finish();
}

fn bench_template_loading(c: &mut Criterion) {
    c.bench_function("load_builtin_registry", |b| {
        b.iter(|| black_box(TemplateRegistry::builtin().unwrap()));
    });
}

fn bench_read_back(c: &mut Criterion) {
    let template = light_template();
    let mut group = c.benchmark_group("read_back");

    for slides in DECK_SIZES {
        let bytes = assemble(&template, &request(slides))
            .unwrap()
            .to_bytes()
            .unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(slides), &bytes, |b, bytes| {
            b.iter(|| parse_bytes(black_box(bytes)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_assembly,
    bench_serialization,
    bench_template_loading,
    bench_read_back
);
criterion_main!(benches);
