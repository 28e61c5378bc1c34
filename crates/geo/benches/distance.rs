//! Benchmarks for geo crate distance calculations.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rider_geo::{GeoPoint, distance_meters, format_distance, haversine_meters};

fn create_drop_offs(count: usize) -> Vec<GeoPoint> {
    (0..count)
        .map(|i| {
            // Spread points over a ~20 km square around Gurgaon
            let lat = 28.35 + (i as f64 * 0.001) % 0.2;
            let lng = 76.95 + (i as f64 * 0.0007) % 0.2;
            GeoPoint::new(lat, lng)
        })
        .collect()
}

fn bench_single_distance(c: &mut Criterion) {
    let shop = GeoPoint::new(28.4595, 77.0266);
    let flat = GeoPoint::new(28.4945, 77.0935);

    c.bench_function("haversine_single", |b| {
        b.iter(|| haversine_meters(black_box(&shop), black_box(&flat)))
    });

    c.bench_function("format_distance", |b| b.iter(|| format_distance(black_box(4473.28))));
}

fn bench_nearest_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_scan");
    let rider = GeoPoint::new(28.4595, 77.0266);

    for size in [10, 100, 1000, 10000].iter() {
        let points = create_drop_offs(*size);

        group.bench_with_input(BenchmarkId::new("linear", size), size, |b, _| {
            b.iter(|| {
                points
                    .iter()
                    .map(|p| distance_meters(Some(black_box(&rider)), Some(p)))
                    .fold(f64::INFINITY, f64::min)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_distance, bench_nearest_scan);
criterion_main!(benches);
