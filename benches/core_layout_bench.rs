use race_chart::api::{RaceChartConfig, RaceChartEngine};
use race_chart::core::{FrameBuilder, FrameBuilderConfig, PeriodKey, Record};
use race_chart::layout::{SimulationPoint, relax};
use race_chart::render::NullRenderer;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn generated_records(entities: usize, years: i32) -> Vec<Record> {
    (0..years)
        .flat_map(|year| {
            (0..entities).map(move |i| {
                let wobble = ((i as f64 * 1.7 + f64::from(year) * 3.1).sin() + 1.0) * 50.0;
                Record::new(
                    format!("firm-{i}"),
                    PeriodKey::year(2000 + year),
                    1_000.0 + wobble * (i % 13) as f64,
                )
            })
        })
        .collect()
}

fn bench_frame_build_10k(c: &mut Criterion) {
    let records = generated_records(500, 20);
    let builder = FrameBuilder::new(FrameBuilderConfig {
        rank_limit: Some(20),
        ..FrameBuilderConfig::default()
    })
    .expect("builder");

    c.bench_function("frame_build_10k", |b| {
        b.iter(|| {
            let _ = builder.build(black_box(&records), |record| record.period);
        })
    });
}

fn bench_race_playthrough_20_frames(c: &mut Criterion) {
    let config = RaceChartConfig::default().with_rank_limit(20);
    let frames = config
        .build_frames(&generated_records(500, 20), |record| record.period)
        .expect("frames");

    c.bench_function("race_playthrough_20_frames", |b| {
        b.iter(|| {
            let mut engine = RaceChartEngine::new(NullRenderer::default(), config.clone(), &frames)
                .expect("engine");
            for (i, frame) in frames.frames.iter().enumerate() {
                let _ = engine
                    .apply_frame(black_box(frame), i as f64 * 2_000.0)
                    .expect("apply frame");
            }
        })
    });
}

fn bench_relax_300_points(c: &mut Criterion) {
    let points: Vec<SimulationPoint> = (0..300)
        .map(|i| SimulationPoint::new(format!("p{i}"), 4.0))
        .collect();

    c.bench_function("relax_300_points_120_iterations", |b| {
        b.iter(|| {
            let mut points = points.clone();
            relax(
                &mut points,
                |point| (point.key.len() % 7) as f64 * 60.0,
                |_| 200.0,
                0.5,
                black_box(120),
            )
            .expect("relax");
        })
    });
}

criterion_group!(
    benches,
    bench_frame_build_10k,
    bench_race_playthrough_20_frames,
    bench_relax_300_points
);
criterion_main!(benches);
