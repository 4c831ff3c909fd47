use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use svg_sprite_core::prelude::*;

fn generate_items(count: usize, min_size: u32, max_size: u32) -> Vec<LayoutItem> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| LayoutItem {
            image_id: ImageId(i as u64),
            name: format!("icon_{i}"),
            w: rng.gen_range(min_size..=max_size),
            h: rng.gen_range(min_size..=max_size),
        })
        .collect()
}

fn generate_uploads(count: usize) -> Vec<Upload> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let side = rng.gen_range(12..=64);
            let body = format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{side}" height="{side}" viewBox="0 0 24 24"><path d="M0 0h24v24H0z"/></svg>"#
            );
            Upload::new(format!("icon_{i}.svg"), "image/svg+xml", body.into_bytes())
        })
        .collect()
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    for count in [50, 200, 1000] {
        let items = generate_items(count, 16, 64);
        group.throughput(Throughput::Elements(count as u64));

        let original = LayoutConfig::builder().columns(16).spacing(2).build();
        group.bench_with_input(BenchmarkId::new("original", count), &items, |b, items| {
            b.iter(|| black_box(layout_items(items.clone(), &original)));
        });

        let custom = LayoutConfig::builder()
            .custom_size(32, 32)
            .columns(16)
            .spacing(2)
            .build();
        group.bench_with_input(BenchmarkId::new("custom", count), &items, |b, items| {
            b.iter(|| black_box(layout_items(items.clone(), &custom)));
        });
    }
    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    for count in [50, 200] {
        let mut session = SpriteSession::new();
        let report = session.ingest(generate_uploads(count));
        assert!(report.rejected.is_empty());
        let cfg = LayoutConfig::builder().columns(10).spacing(4).build();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("sheet", count), &session, |b, session| {
            b.iter(|| black_box(session.compose(&cfg)));
        });
    }
    group.finish();
}

fn bench_intake(c: &mut Criterion) {
    let uploads = generate_uploads(200);
    c.bench_function("ingest_200_svg", |b| {
        b.iter(|| {
            let mut session = SpriteSession::new();
            session.ingest(uploads.clone());
            black_box(session)
        });
    });
}

criterion_group!(benches, bench_layout, bench_compose, bench_intake);
criterion_main!(benches);
