//! Performance benchmarks for the PDF batch server
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdf_batch_server::pdf::{PdfReader, QpdfWrapper};
use pdf_batch_server::source::{IngestSource, WorkingSet};

/// Text-only PDF with `pages` pages
fn build_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::with_capacity(pages);
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {}", n))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Benchmark working set ingestion with heavy overlap between batches
fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for count in [100, 1_000, 10_000] {
        let paths: Vec<String> = (0..count).map(|i| format!("/scans/doc-{}.pdf", i)).collect();
        let half = &paths[..count / 2];
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("dialog", count), &paths, |b, paths| {
            b.iter(|| {
                let mut set = WorkingSet::default();
                set.ingest(half, IngestSource::Dialog);
                set.ingest(black_box(paths), IngestSource::Dialog);
                set.len()
            });
        });
    }

    group.finish();
}

/// Benchmark splitting and re-merging in memory
fn bench_split_merge(c: &mut Criterion) {
    let data = build_pdf(20);

    let mut group = c.benchmark_group("split_merge");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("split_20pages", |b| {
        b.iter(|| QpdfWrapper::split_each_page(black_box(&data)).unwrap());
    });

    let pages = QpdfWrapper::split_each_page(&data).unwrap();
    let refs: Vec<&[u8]> = pages.iter().map(Vec::as_slice).collect();
    group.bench_function("merge_20pages", |b| {
        b.iter(|| QpdfWrapper::merge(black_box(&refs)).unwrap());
    });

    group.finish();
}

/// Benchmark per-page text extraction
fn bench_text_extraction(c: &mut Criterion) {
    let data = build_pdf(20);

    c.bench_function("text_extraction_20pages", |b| {
        b.iter(|| {
            let reader = PdfReader::open_bytes(black_box(&data)).unwrap();
            reader.extract_all_text().unwrap()
        });
    });
}

criterion_group!(benches, bench_ingest, bench_split_merge, bench_text_extraction);

criterion_main!(benches);
