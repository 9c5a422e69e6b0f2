use criterion::{Criterion, black_box, criterion_group, criterion_main};
use lapsight::{
    AnalysisConfig, Session, TelemetryPoint, coach_session,
    analysis::{accumulate_distance, detect_braking_zones, segment_laps, theoretical_best},
    telemetry::{ExportSchema, parse_export},
};
use std::fmt::Write;
use std::time::Duration;

const POINTS_PER_LAP: usize = 600;
const LAP_COUNT: usize = 20;

/// ~10Hz export of a looping track with a braking zone and lean on every lap
fn create_sample_export() -> String {
    let mut export = String::from("Time,Lat,Lng,Speed,Rpm,Alt,Lean\n");
    let mut timestamp_ms = 1_700_000_000_000u64;
    for lap in 0..LAP_COUNT {
        for i in 0..POINTS_PER_LAP {
            let phase = i as f64 / POINTS_PER_LAP as f64 * std::f64::consts::TAU;
            let speed = 120. + 40. * phase.sin() - (lap % 3) as f64;
            writeln!(
                export,
                "{},{:.7},{:.7},{:.1},{:.0},{:.1},{:.0}",
                timestamp_ms,
                45.53 + 0.0004 * phase.cos(),
                9.28 + 0.0004 * phase.sin(),
                speed,
                6000. + speed * 50.,
                182. + phase.sin(),
                400. * (2. * phase).sin()
            )
            .unwrap();
            timestamp_ms += 100;
        }
        writeln!(export, "LAP,{},{}", lap + 1, 60_000 + lap * 137).unwrap();
    }
    export
}

fn sample_config() -> AnalysisConfig {
    AnalysisConfig {
        schema: ExportSchema::WITH_ALTITUDE_AND_LEAN,
        ..Default::default()
    }
}

fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion");

    let export = create_sample_export();
    let config = sample_config();

    group.bench_function("parse_export", |b| {
        b.iter(|| black_box(parse_export(black_box(&export), &config.schema)));
    });

    group.bench_function("ingest_csv", |b| {
        b.iter(|| black_box(Session::ingest_csv(black_box(&export), &config)));
    });

    group.finish();
}

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");

    let config = sample_config();
    let session = Session::ingest_csv(&create_sample_export(), &config);
    let points: &[TelemetryPoint] = session.points();

    group.bench_function("accumulate_distance", |b| {
        b.iter(|| black_box(accumulate_distance(points, config.max_segment_distance_m)));
    });

    group.bench_function("detect_braking_zones", |b| {
        b.iter(|| {
            black_box(detect_braking_zones(
                points,
                config.braking_threshold_kmh,
                config.braking_top_n,
            ))
        });
    });

    let segmentation = segment_laps(points, session.laps());
    let segments = segmentation.laps();
    group.bench_function("theoretical_best", |b| {
        b.iter(|| {
            black_box(theoretical_best(
                segments,
                config.sector_count,
                config.theoretical_best_method,
            ))
        });
    });

    group.bench_function("coach_session", |b| {
        b.iter(|| black_box(coach_session(&session, &config)));
    });

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    let point = TelemetryPoint {
        time: "1700000000000".to_string(),
        lat: 45.53,
        lng: 9.28,
        speed: 120.,
        rpm: 12000.,
        altitude: Some(182.),
        lean_angle: Some(-312.),
    };

    group.bench_function("serialize_point", |b| {
        b.iter(|| black_box(serde_json::to_string(&point).unwrap()));
    });

    let json = serde_json::to_string(&point).unwrap();
    group.bench_function("deserialize_point", |b| {
        b.iter(|| black_box(serde_json::from_str::<TelemetryPoint>(&json).unwrap()));
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = bench_ingestion, bench_analysis, bench_serialization
}
criterion_main!(benches);
