use race_chart::api::{ReseedPolicy, SwarmChartConfig, SwarmEngine};
use race_chart::core::{PeriodKey, Record};
use race_chart::layout::{ForceConfig, ForceSimulation, SimulationPoint, relax};
use race_chart::render::RecordingRenderer;

fn cluster(count: usize) -> Vec<SimulationPoint> {
    (0..count)
        .map(|i| SimulationPoint::new(format!("p{i}"), 4.0))
        .collect()
}

fn positions(points: &[SimulationPoint]) -> Vec<(f64, f64)> {
    points.iter().map(|p| p.position).collect()
}

fn column_of(point: &SimulationPoint) -> f64 {
    let index: f64 = point.key[1..].parse().expect("index");
    (index % 3.0) * 40.0
}

#[test]
fn relax_is_bit_for_bit_deterministic() {
    let mut first = cluster(30);
    let mut second = cluster(30);
    relax(&mut first, column_of, |_| 100.0, 1.0, 120).expect("first");
    relax(&mut second, column_of, |_| 100.0, 1.0, 120).expect("second");
    assert_eq!(positions(&first), positions(&second));
}

#[test]
fn relaxed_points_stop_overlapping() {
    let mut points = cluster(2);
    relax(&mut points, |_| 50.0, |_| 50.0, 0.0, 300).expect("relax");
    let (a, b) = (points[0].position, points[1].position);
    let distance = (a.0 - b.0).hypot(a.1 - b.1);
    assert!(distance > 6.0, "points still overlap: {distance}");
    let centroid = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
    assert!((centroid.0 - 50.0).abs() < 1.0 && (centroid.1 - 50.0).abs() < 1.0);
}

#[test]
fn seeded_jitter_is_reproducible() {
    let config = ForceConfig {
        seed_jitter: 3.0,
        seed: 42,
        ..ForceConfig::default()
    };
    let run = || {
        let mut sim = ForceSimulation::new(config).expect("sim");
        sim.reseed(cluster(10));
        sim.run(50);
        positions(sim.points())
    };
    assert_eq!(run(), run());
}

#[test]
fn reseed_keeps_exactly_the_new_subset() {
    let mut sim = ForceSimulation::new(ForceConfig::default()).expect("sim");
    sim.reseed(vec![
        SimulationPoint::new("a", 4.0).with_target(0.0, 0.0),
        SimulationPoint::new("b", 4.0).with_target(20.0, 0.0),
        SimulationPoint::new("c", 4.0).with_target(40.0, 0.0),
    ]);
    sim.run(40);
    let b_before = sim.point("b").expect("b").position;

    sim.reseed(vec![
        SimulationPoint::new("b", 4.0).with_target(20.0, 30.0),
        SimulationPoint::new("d", 4.0).with_target(60.0, 0.0),
    ]);
    sim.reheat();

    assert_eq!(sim.len(), 2);
    assert!(sim.point("a").is_none());
    assert!(sim.point("c").is_none());
    assert_eq!(sim.point("b").expect("b").position, b_before);
    assert!(sim.point("d").expect("d").is_placed());
    assert_eq!(sim.alpha(), 1.0);
}

fn literal_point(key: &str, radius: f64) -> SimulationPoint {
    SimulationPoint {
        key: key.to_owned(),
        position: (f64::NAN, f64::NAN),
        velocity: (0.0, 0.0),
        target_x: 0.0,
        target_y: 0.0,
        radius,
    }
}

#[test]
#[should_panic(expected = "radius must be finite")]
fn relax_rejects_negative_radius_built_by_hand() {
    let mut points = vec![literal_point("a", 4.0), literal_point("b", -5.0)];
    let _ = relax(&mut points, |_| 0.0, |_| 0.0, 0.0, 10);
}

#[test]
#[should_panic(expected = "radius must be finite")]
fn reseed_rejects_non_finite_radius_built_by_hand() {
    let mut sim = ForceSimulation::new(ForceConfig::default()).expect("sim");
    sim.reseed(vec![literal_point("a", f64::NAN)]);
}

#[test]
#[should_panic(expected = "radius must be finite")]
fn reseed_rejects_negative_radius_from_json() {
    let json = r#"{
        "key": "a",
        "position": [0.0, 0.0],
        "velocity": [0.0, 0.0],
        "target_x": 0.0,
        "target_y": 0.0,
        "radius": -3.0
    }"#;
    let point: SimulationPoint = serde_json::from_str(json).expect("parse");
    let mut sim = ForceSimulation::new(ForceConfig::default()).expect("sim");
    sim.reseed(vec![point]);
}

fn swarm_records() -> Vec<Record> {
    let mut records = Vec::new();
    for (year, values) in [(2020, [10.0, 20.0, 30.0]), (2021, [25.0, 5.0, 15.0])] {
        for (name, value) in ["A", "B", "C"].iter().zip(values) {
            records.push(
                Record::new(*name, PeriodKey::year(year), value).with_category_color("#e45756"),
            );
        }
    }
    records.push(Record::new("D", PeriodKey::year(2021), 12.0));
    records
}

#[test]
fn swarm_shows_one_period_at_a_time() {
    let mut engine = SwarmEngine::from_records(
        RecordingRenderer::default(),
        SwarmChartConfig::default(),
        &swarm_records(),
    )
    .expect("engine");

    let first = engine.initial_layout().expect("initial");
    assert_eq!(first.period, Some(PeriodKey::year(2020)));
    let keys: Vec<&str> = first.points.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, vec!["C", "B", "A"]);
    assert_eq!(engine.simulation().ticks(), 120);
    assert_eq!(first.points[0].category_color, "#e45756");

    let next = engine.advance(PeriodKey::year(2021)).expect("2021");
    assert_eq!(next.points.len(), 4);
    assert!(engine.simulation().point("D").is_some());
    assert_eq!(engine.value_of("B"), Some(5.0));
    assert_eq!(engine.renderer().swarm_frames.len(), 2);
}

#[test]
fn swarm_columns_follow_first_seen_entity_order() {
    let engine = SwarmEngine::from_records(
        RecordingRenderer::default(),
        SwarmChartConfig::default(),
        &swarm_records(),
    )
    .expect("engine");
    let x = engine.x_scale();
    let a = x.center("A").expect("A");
    let d = x.center("D").expect("D");
    assert!(a < x.center("B").expect("B"));
    assert!(d > x.center("C").expect("C"));
    assert!(engine.y_scale().map(30.0).expect("max") < engine.y_scale().map(5.0).expect("min"));
}

#[test]
fn random_jitter_policy_is_seeded() {
    let config = SwarmChartConfig::default()
        .with_reseed_policy(ReseedPolicy::RandomJitter { seed: 9 })
        .with_iterations(60, 30);
    let run = || {
        let mut engine =
            SwarmEngine::from_records(RecordingRenderer::default(), config, &swarm_records())
                .expect("engine");
        engine.initial_layout().expect("initial");
        engine.advance(PeriodKey::year(2021)).expect("jitter");
        (engine.value_of("A"), engine.swarm_frame())
    };

    let (value, frame) = run();
    let (value_again, frame_again) = run();
    assert_eq!(value, value_again);
    assert_eq!(frame, frame_again);
    assert_eq!(frame.period, Some(PeriodKey::year(2020)));
    let value = value.expect("A shown");
    assert!((5.0..=30.0).contains(&value));
}

#[test]
fn unknown_period_is_an_error() {
    let mut engine = SwarmEngine::from_records(
        RecordingRenderer::default(),
        SwarmChartConfig::default(),
        &swarm_records(),
    )
    .expect("engine");
    assert!(engine.show_period(PeriodKey::year(1999)).is_err());
}
