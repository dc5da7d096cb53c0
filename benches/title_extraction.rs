use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flix_catalog::archive::MemoryArchive;
use flix_catalog::catalog::identity;
use flix_catalog::{CatalogPipeline, MetadataResolver, OverrideSet};
use std::collections::HashMap;
use tokio::runtime::Runtime;

const FILENAMES: &[&str] = &[
    "Frieren.Beyond.Journeys.End.S01E01.1080p.BluRay.x265-Pahe.in.mkv",
    "Your.Name.2016.2160p.BluRay.x265-Pahe.in.mkv",
    "Movie_part001.mkv",
    "[SubsPlease] Sousou no Frieren - 07 (1080p) [A1B2C3D4].mkv",
    "Some.Movie.1080p.WEB-DL.DDP5.1.H.264-GRP.mkv",
    "Spirited Away (2001) [1080p].mp4",
];

/// Benchmark title extraction per filename shape
fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    for filename in FILENAMES {
        group.bench_with_input(BenchmarkId::from_parameter(filename), filename, |b, name| {
            b.iter(|| flix_catalog::extract(black_box(name)))
        });
    }
    group.finish();
}

/// Benchmark identifier derivation
fn bench_identity(c: &mut Criterion) {
    c.bench_function("identity_assign", |b| {
        b.iter(|| identity::assign(black_box("Frieren Beyond Journeys End")))
    });
}

/// Benchmark an offline scan of a synthetic archive
fn bench_offline_scan(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let files: Vec<(String, i64)> = (0..1000)
        .map(|i| (format!("Show.{}.S01E{:02}.1080p.mkv", i % 50, i % 24), 1_073_741_824))
        .collect();

    c.bench_function("offline_scan_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                let refs: Vec<(&str, i64)> = files.iter().map(|(n, s)| (n.as_str(), *s)).collect();
                let mut archive = MemoryArchive::from_files(-1001, &refs);
                let mut pipeline = CatalogPipeline::new(
                    MetadataResolver::disabled(),
                    Box::new(HashMap::<String, OverrideSet>::new()),
                );
                pipeline.run(&mut archive).await
            })
        })
    });
}

criterion_group!(benches, bench_extract, bench_identity, bench_offline_scan);
criterion_main!(benches);
