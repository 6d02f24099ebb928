use std::collections::BTreeSet;

use indexmap::IndexMap;
use proptest::prelude::*;
use race_chart::core::{Frame, FrameBuilder, PeriodKey, Record};
use race_chart::reconcile::reconcile;

fn frame_of(keys: &BTreeSet<u8>) -> Frame {
    Frame {
        key: PeriodKey::year(2021),
        entities: keys
            .iter()
            .map(|k| Record::new(format!("E{k}"), PeriodKey::year(2021), f64::from(*k)))
            .collect(),
        rank_limit: None,
    }
}

proptest! {
    #[test]
    fn reconciliation_partitions_the_key_union(
        previous in prop::collection::btree_set(0u8..16, 0..16),
        next in prop::collection::btree_set(0u8..16, 0..16)
    ) {
        let previous_map: IndexMap<String, ()> =
            previous.iter().map(|k| (format!("E{k}"), ())).collect();
        let next_frame = frame_of(&next);

        let plan = reconcile(&previous_map, &next_frame);

        prop_assert!(plan.is_partition_of(
            previous_map.keys().map(String::as_str),
            next_frame.keys(),
        ));
        prop_assert_eq!(plan.entering.len(), next.difference(&previous).count());
        prop_assert_eq!(plan.updating.len(), next.intersection(&previous).count());
        prop_assert_eq!(plan.exiting.len(), previous.difference(&next).count());
        let next_order: Vec<&str> = next_frame
            .keys()
            .filter(|k| previous_map.contains_key(*k))
            .collect();
        let updating: Vec<&str> = plan.updating.iter().map(String::as_str).collect();
        prop_assert_eq!(updating, next_order);
    }

    #[test]
    fn built_frames_are_sorted_and_inside_the_domain(
        values in prop::collection::vec((0u8..20, -1_000.0f64..1_000.0), 1..60),
        limit in 1usize..12
    ) {
        let records: Vec<Record> = values
            .iter()
            .enumerate()
            .map(|(i, (entity, value))| {
                Record::new(format!("E{entity}"), PeriodKey::year(2000 + (i % 3) as i32), *value)
            })
            .collect();
        let builder = FrameBuilder::new(race_chart::core::FrameBuilderConfig {
            rank_limit: Some(limit),
            ..Default::default()
        })
        .expect("builder");
        let set = builder.build(&records, |r| r.period);

        prop_assert!(set.value_domain.1 > set.value_domain.0);
        for frame in &set.frames {
            prop_assert!(frame.len() <= limit);
            for pair in frame.entities.windows(2) {
                prop_assert!(pair[0].primary_value >= pair[1].primary_value);
            }
            for record in &frame.entities {
                prop_assert!(record.primary_value <= set.value_domain.1);
            }
        }
    }
}
