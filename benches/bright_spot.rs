//! Bright-Spot Pipeline Benchmarks
//!
//! Measures the per-frame hot path at common camera resolutions: the
//! intensity-field scan, frame mirroring, record decoding and a complete
//! estimator tick.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glowtrack::tracking::{
    find_bright_spot, CursorEstimator, IntensityField, RecordDecoder, ScreenSize, TickControls,
};

/// Dim background with a saturated dot at the given position
fn field_with_dot(width: u32, height: u32, dot_x: u32, dot_y: u32) -> IntensityField {
    IntensityField::from_fn(width, height, |x, y| {
        if (x, y) == (dot_x, dot_y) {
            255
        } else {
            12
        }
    })
}

/// Uniform background with nothing to find
fn dark_field(width: u32, height: u32) -> IntensityField {
    IntensityField::from_fn(width, height, |_, _| 12)
}

const RESOLUTIONS: [(u32, u32, &str); 3] = [
    (640, 480, "480p"),
    (1280, 720, "720p"),
    (1920, 1080, "1080p"),
];

/// Benchmark the scan with a target present mid-frame
fn bench_locate_with_target(c: &mut Criterion) {
    let mut group = c.benchmark_group("bright_spot_locate");

    for (width, height, name) in RESOLUTIONS {
        let field = field_with_dot(width, height, width / 2, height / 2);
        let pixels = (width as u64) * (height as u64);

        group.throughput(Throughput::Elements(pixels));

        group.bench_with_input(BenchmarkId::new("target_center", name), &field, |b, field| {
            b.iter(|| black_box(find_bright_spot(black_box(field), 200)))
        });
    }

    group.finish();
}

/// Benchmark the scan when every pixel is below threshold
fn bench_locate_no_target(c: &mut Criterion) {
    let mut group = c.benchmark_group("bright_spot_no_target");

    for (width, height, name) in RESOLUTIONS {
        let field = dark_field(width, height);
        let pixels = (width as u64) * (height as u64);

        group.throughput(Throughput::Elements(pixels));

        group.bench_with_input(BenchmarkId::new("all_dark", name), &field, |b, field| {
            b.iter(|| black_box(find_bright_spot(black_box(field), 200)))
        });
    }

    group.finish();
}

/// Benchmark in-place horizontal mirroring
fn bench_mirror(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_mirror");

    for (width, height, name) in RESOLUTIONS {
        let pixels = (width as u64) * (height as u64);
        group.throughput(Throughput::Elements(pixels));

        group.bench_function(BenchmarkId::new("mirror_rows", name), |b| {
            let mut field = field_with_dot(width, height, width / 3, height / 3);

            b.iter(|| {
                field.mirror_rows();
                black_box(&field);
            })
        });
    }

    group.finish();
}

/// Benchmark a complete estimator tick (scan + map + decode + fuse + clamp)
fn bench_full_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimator_tick");

    let screen = ScreenSize::new(1920, 1080);
    let record = "0.0,512.3,384.9,0.0,0.0,0.0,0.0,0.8,0.1,1013.2";

    for (width, height, name) in RESOLUTIONS {
        let field = field_with_dot(width, height, width / 2, height / 2);
        let pixels = (width as u64) * (height as u64);

        group.throughput(Throughput::Elements(pixels));

        group.bench_function(BenchmarkId::new("camera_and_imu", name), |b| {
            let mut est = CursorEstimator::new(screen);
            let ctl = TickControls {
                imu_active: true,
                ..TickControls::default()
            };

            b.iter(|| black_box(est.tick(black_box(&field), Some(record), &ctl)))
        });
    }

    group.finish();
}

/// Benchmark record decoding on its own
fn bench_decode_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_decode");

    group.bench_function("orientation_6_field", |b| {
        let mut decoder = RecordDecoder::new();
        b.iter(|| black_box(decoder.decode(black_box("12.5,0.3,-4.2,0.0,1.0,9.8"), 0.5, 0.5)))
    });

    group.bench_function("position_10_field", |b| {
        let mut decoder = RecordDecoder::new();
        b.iter(|| {
            black_box(decoder.decode(
                black_box("0.0,512.3,384.9,0.0,0.0,0.0,0.0,0.8,0.1,1013.2"),
                0.5,
                0.5,
            ))
        })
    });

    group.bench_function("malformed", |b| {
        let mut decoder = RecordDecoder::new();
        b.iter(|| black_box(decoder.decode(black_box("garbage,not,numbers"), 0.5, 0.5)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_locate_with_target,
    bench_locate_no_target,
    bench_mirror,
    bench_full_tick,
    bench_decode_record
);
criterion_main!(benches);
