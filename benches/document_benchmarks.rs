//! Benchmarks for document operations.
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use quire_core::{Command, Engine};
use quire_model::{MarkType, Schema, Selection, markup, resolve_mark_range};

/// Generates post markup with the given number of paragraphs.
fn generate_post(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                "<p>Paragraph {i} has <strong>bold</strong>, <em>italic</em> and a \
                 <a href=\"https://example.com/{i}\">link to somewhere</a>.</p>"
            )
        })
        .collect()
}

/// Benchmarks parsing stored markup.
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let schema = Schema::default();

    for size in [10, 100, 1000].iter() {
        let input = generate_post(*size);
        group.bench_with_input(BenchmarkId::new("set_content", size), &input, |b, input| {
            b.iter(|| black_box(markup::parse(black_box(input), &schema).unwrap()))
        });
    }

    group.finish();
}

/// Benchmarks serializing documents.
fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    let schema = Schema::default();

    for size in [10, 100, 1000].iter() {
        let doc = markup::parse(&generate_post(*size), &schema).unwrap();
        group.bench_with_input(BenchmarkId::new("serialized_content", size), &doc, |b, doc| {
            b.iter(|| black_box(markup::serialize(black_box(doc))))
        });
    }

    group.finish();
}

/// Benchmarks transactions on a large document.
fn bench_transactions(c: &mut Criterion) {
    let mut group = c.benchmark_group("transactions");
    let engine = Engine::default();
    let doc = engine.set_content(&generate_post(1000)).unwrap();
    let mid = doc.size() / 2;

    group.bench_function("bold_whole_document", |b| {
        let sel = Selection::all(&doc);
        b.iter(|| {
            black_box(
                engine
                    .apply_command(&doc, &sel, &Command::ToggleMark(MarkType::Bold))
                    .unwrap(),
            )
        })
    });

    group.bench_function("delete_middle_half", |b| {
        let sel = Selection::range(doc.size() / 4, doc.size() * 3 / 4);
        b.iter(|| {
            black_box(
                engine
                    .apply_command(&doc, &sel, &Command::DeleteSelection)
                    .unwrap(),
            )
        })
    });

    group.bench_function("resolve_mark_range", |b| {
        b.iter(|| black_box(resolve_mark_range(&doc, black_box(mid), MarkType::Link)))
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_serialize, bench_transactions);
criterion_main!(benches);
