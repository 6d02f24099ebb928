use race_chart::core::{
    BuildDiagnostic, FrameBuilder, FrameBuilderConfig, MISSING_VALUE, PeriodKey, Record,
    coerce_number,
};

fn record(entity: &str, year: i32, value: f64) -> Record {
    Record::new(entity, PeriodKey::year(year), value)
}

#[test]
fn rank_limit_drops_the_lowest_entities() {
    let records: Vec<Record> = (0..12)
        .map(|i| record(&format!("F{i:02}"), 2020, 100.0 - f64::from(i)))
        .collect();
    let builder = FrameBuilder::new(FrameBuilderConfig {
        rank_limit: Some(10),
        ..FrameBuilderConfig::default()
    })
    .expect("builder");

    let set = builder.build(&records, |r| r.period);
    let frame = &set.frames[0];
    assert_eq!(frame.len(), 10);
    assert_eq!(frame.rank_limit, Some(10));
    assert!(frame.get("F10").is_none());
    assert!(frame.get("F11").is_none());
}

#[test]
fn domain_is_computed_once_over_every_frame() {
    let records = vec![
        record("X", 2020, 10.0),
        record("Y", 2020, 50.0),
        record("Z", 2020, 30.0),
        record("X", 2021, 80.0),
        record("Y", 2021, 5.0),
        record("Z", 2021, 5.0),
    ];
    let set = FrameBuilder::default().build(&records, |r| r.period);
    assert_eq!(set.value_domain.0, 0.0);
    assert!((set.value_domain.1 - 88.0).abs() <= 1e-9);
    assert_eq!(set.value_extent, (5.0, 80.0));
}

#[test]
fn first_row_wins_for_duplicate_keys() {
    let records = vec![
        record("A", 2020, 1.0),
        record("A", 2020, 9.0),
        record("B", 2020, 2.0),
    ];
    let set = FrameBuilder::default().build(&records, |r| r.period);
    assert_eq!(set.duplicate_count(), 1);
    assert_eq!(set.frames[0].get("A").expect("A").primary_value, 1.0);
    assert_eq!(
        set.diagnostics[0],
        BuildDiagnostic::DuplicateKeyInFrame {
            period: PeriodKey::year(2020),
            entity: "A".to_owned(),
            index: 1,
        }
    );
}

#[test]
fn coerced_text_values_flow_into_diagnostics() {
    let records: Vec<Record> = [("A", "12.5"), ("B", "n/a"), ("C", "")]
        .iter()
        .map(|(entity, raw)| record(entity, 2020, coerce_number(raw)))
        .collect();
    let set = FrameBuilder::default().build(&records, |r| r.period);
    assert_eq!(set.malformed_count(), 1);
    let order: Vec<&str> = set.frames[0].keys().collect();
    assert_eq!(order, vec!["A", "C"]);
    assert!(MISSING_VALUE.is_nan());
}

#[test]
fn monthly_records_can_be_grouped_by_year() {
    let records = vec![
        Record::new("A", PeriodKey::month(2020, 3).expect("month"), 1.0),
        Record::new("B", PeriodKey::month(2020, 7).expect("month"), 2.0),
        Record::new("A", PeriodKey::month(2021, 1).expect("month"), 3.0),
    ];
    let set = FrameBuilder::default().build(&records, |r| r.period.to_year());
    let keys: Vec<String> = set.frames.iter().map(|f| f.key.to_string()).collect();
    assert_eq!(keys, vec!["2020", "2021"]);
    assert_eq!(set.frames[0].len(), 2);
    assert_eq!(set.frames[0].entities[0].period, PeriodKey::year(2020));
    assert!(set.frame(PeriodKey::year(2021)).is_some());
}

#[test]
fn empty_input_yields_fallback_domain() {
    let set = FrameBuilder::default().build(&[], |r| r.period);
    assert!(set.is_empty());
    assert_eq!(set.value_domain, (0.0, 1.0));
}

#[test]
fn raw_rows_with_calendar_dates_group_by_month() {
    let rows = [
        ("Acme", "2020-03-02", "4.5"),
        ("Globex", "2020-03-28", "7"),
        ("Acme", "2020-04", "5.0"),
        ("Initech", "2021", "oops"),
    ];
    let records: Vec<Record> = rows
        .iter()
        .map(|(entity, period, value)| Record::from_row(*entity, period, value).expect("row"))
        .collect();

    let by_month = FrameBuilder::default().build(&records, |r| r.period);
    let keys: Vec<String> = by_month.frames.iter().map(|f| f.key.to_string()).collect();
    assert_eq!(keys, vec!["2020-03", "2020-04"]);
    assert_eq!(by_month.frames[0].keys().collect::<Vec<_>>(), vec!["Globex", "Acme"]);
    assert_eq!(by_month.malformed_count(), 1);

    let by_year = FrameBuilder::default().build(&records, |r| r.period.to_year());
    assert_eq!(by_year.frames.len(), 1);
    assert_eq!(by_year.frames[0].key, PeriodKey::year(2020));
}

#[test]
fn unrecognized_periods_are_rejected() {
    assert!(Record::from_row("Acme", "2020-13", "1").is_err());
    assert!(Record::from_row("Acme", "2020-02-30", "1").is_err());
    assert!(Record::from_row("Acme", "last year", "1").is_err());
    assert_eq!(
        "2021-07-31".parse::<PeriodKey>().expect("date"),
        PeriodKey::month(2021, 7).expect("month")
    );
}
