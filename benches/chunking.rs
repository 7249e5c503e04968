use criterion::{Criterion, criterion_group, criterion_main};
use doc_qa::chunker::split_document;
use doc_qa::config::ChunkingConfig;
use doc_qa::loader::{Document, DocumentKind};
use std::hint::black_box;

pub fn criterion_benchmark(c: &mut Criterion) {
    let document = Document {
        text: "The quick brown fox jumps over the lazy dog. ".repeat(2000),
        source_name: "bench.json".to_string(),
        kind: DocumentKind::Json,
    };
    let config = ChunkingConfig::default();
    c.bench_function("chunking", |b| {
        b.iter(|| split_document(black_box(&document), black_box(&config)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
