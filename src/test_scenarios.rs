// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

#[cfg(test)]
mod tests {
    use crate::changeset::ChangeAction;
    use crate::error::ReconcileError;
    use crate::matching::MatchWarning;
    use crate::policy::{PassthroughNaming, TitleCaseNaming};
    use crate::reconcile_stops;
    use crate::settings::Settings;
    use crate::sources::geo_stop_from_tags;
    use crate::stop::{RunIdAllocator, StopRecord, Tags, WheelchairAccess};

    fn settings() -> Settings {
        Settings {
            operator_name: "GTT".to_string(),
            ..Settings::default()
        }
    }

    fn schedule_stop(
        ids: &mut RunIdAllocator,
        gtfs_id: &str,
        code: &str,
        lat: f64,
        lon: f64,
    ) -> StopRecord {
        StopRecord::new_schedule(ids.next(), gtfs_id.into(), Some(code.into()), lat, lon)
            .with_name(format!("Stop {}", code))
            .with_operator("GTT")
            .with_wheelchair(WheelchairAccess::Accessible)
    }

    fn geo_stop(ids: &mut RunIdAllocator, osm_id: i64, tags: &[(&str, &str)], lat: f64, lon: f64) -> StopRecord {
        let tags: Tags = tags.iter().copied().collect();
        geo_stop_from_tags(osm_id, lat, lon, tags, ids, &PassthroughNaming)
    }

    #[test]
    fn scenario_a_matched_with_id_correction() {
        let mut ids = RunIdAllocator::new();
        let schedule = vec![schedule_stop(&mut ids, "100", "12", 45.0, 9.0)];
        let geo = vec![geo_stop(
            &mut ids,
            3001,
            &[("highway", "bus_stop"), ("ref", "12"), ("gtfs_id", "missing")],
            45.0002,
            9.0,
        )];

        let out = reconcile_stops(schedule, geo, &PassthroughNaming, &settings()).unwrap();

        assert_eq!(out.counts.matched, 1);
        assert_eq!(out.counts.id_corrected, 1);
        assert_eq!(out.counts.created, 0);
        assert!(out.unmatched_geo_stops.is_empty());

        let record = &out.matched_with_updates[0];
        assert_eq!(record.action, ChangeAction::Modify);
        assert_eq!(record.osm_id, 3001);
        let delta = record.delta("gtfs_id").unwrap();
        assert_eq!(delta.old.as_deref(), Some("missing"));
        assert_eq!(delta.new, "100");
        assert_eq!(record.tags.get("gtfs_id"), Some("100"));
        assert_eq!(record.tags.get("wheelchair"), Some("yes"));

        // roughly 22 m apart, above the 5 m report threshold
        assert_eq!(out.distance_notes.len(), 1);
        assert_eq!(out.distance_notes[0].osm_id, Some(3001));
        assert!(out.match_warnings.is_empty());
    }

    #[test]
    fn scenario_b_unmatched_geo_stop_is_unchanged() {
        let mut ids = RunIdAllocator::new();
        let schedule = vec![schedule_stop(&mut ids, "100", "12", 45.0, 9.0)];
        let geo = vec![geo_stop(
            &mut ids,
            3002,
            &[("highway", "bus_stop"), ("ref", "99"), ("name", "Old Stop")],
            45.2,
            9.3,
        )];

        let out = reconcile_stops(schedule, geo, &PassthroughNaming, &settings()).unwrap();

        assert_eq!(out.counts.unmatched, 1);
        let record = &out.unmatched_geo_stops[0];
        assert_eq!(record.osm_id, 3002);
        assert_eq!(record.tags.0.len(), 3);
        assert_eq!(record.tags.get("name"), Some("Old Stop"));
        assert!(record.deltas.is_empty());
    }

    #[test]
    fn distant_same_ref_warning_reaches_caller() {
        let mut ids = RunIdAllocator::new();
        let schedule = vec![schedule_stop(&mut ids, "100", "12", 45.0, 9.0)];
        let geo = vec![geo_stop(
            &mut ids,
            3005,
            &[("highway", "bus_stop"), ("ref", "12")],
            45.001,
            9.0,
        )];

        let out = reconcile_stops(schedule, geo, &PassthroughNaming, &settings()).unwrap();

        assert_eq!(out.counts.matched, 0);
        assert_eq!(out.counts.unmatched, 1);
        assert_eq!(out.counts.created, 1);
        assert_eq!(out.match_warnings.len(), 1);
        assert!(matches!(
            out.match_warnings[0],
            MatchWarning::DistantSameReference { distance_m, .. } if distance_m > 70.0
        ));
        assert!(out.distance_notes.is_empty());
    }

    #[test]
    fn scenario_c_new_stop_from_schedule() {
        let mut ids = RunIdAllocator::new();
        let schedule = vec![schedule_stop(&mut ids, "4242", "77", 45.07, 7.68)];

        let out = reconcile_stops(schedule, vec![], &PassthroughNaming, &settings()).unwrap();

        assert_eq!(out.counts.created, 1);
        let record = &out.new_stops_from_schedule[0];
        assert_eq!(record.action, ChangeAction::Create);
        assert_eq!(record.osm_id, -4242);
        assert_eq!(record.lat, 45.07);
        for (key, value) in [
            ("bus", "yes"),
            ("highway", "bus_stop"),
            ("public_transport", "platform"),
            ("operator", "GTT"),
            ("gtfs:reviewed", "no"),
            ("name", "Stop 77"),
            ("ref", "77"),
            ("gtfs_id", "4242"),
            ("wheelchair", "yes"),
        ] {
            assert_eq!(record.tags.get(key), Some(value), "tag {}", key);
        }
        assert!(out.bounds.is_some());
    }

    #[test]
    fn scenario_d_two_geo_stops_for_one_schedule_stop() {
        let mut ids = RunIdAllocator::new();
        let schedule = vec![schedule_stop(&mut ids, "100", "12", 45.0, 9.0)];
        let geo = vec![
            geo_stop(&mut ids, 3003, &[("highway", "bus_stop"), ("ref", "12")], 45.0001, 9.0),
            geo_stop(&mut ids, 3004, &[("highway", "bus_stop"), ("ref", "12")], 45.0, 9.0001),
        ];

        let err = reconcile_stops(schedule, geo, &PassthroughNaming, &settings()).unwrap_err();
        match err {
            ReconcileError::AmbiguousMatch {
                schedule_stop,
                geo_stop,
                existing,
                ..
            } => {
                assert!(schedule_stop.contains("gtfs_id=100"));
                assert!(geo_stop.contains("osm_id=3004"));
                assert!(existing.contains("osm_id=3003"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn tram_stop_positions_do_not_produce_new_stops() {
        let mut ids = RunIdAllocator::new();
        let schedule = vec![schedule_stop(&mut ids, "500", "5", 45.0, 9.0)];
        let geo = vec![
            geo_stop(
                &mut ids,
                4001,
                &[("public_transport", "stop_position"), ("tram", "yes"), ("ref", "5")],
                45.0001,
                9.0,
            ),
            geo_stop(
                &mut ids,
                4002,
                &[("public_transport", "stop_position"), ("tram", "yes"), ("ref", "5")],
                45.0,
                9.0001,
            ),
        ];

        let out = reconcile_stops(schedule, geo, &PassthroughNaming, &settings()).unwrap();
        assert_eq!(out.counts.matched, 2);
        assert_eq!(out.counts.created, 0);
        for record in &out.matched_with_updates {
            assert_eq!(record.tags.get("public_transport"), Some("stop_position"));
        }
    }

    #[test]
    fn naming_policy_applies_to_added_names() {
        let mut ids = RunIdAllocator::new();
        let schedule = vec![
            StopRecord::new_schedule(ids.next(), "1".into(), Some("12".into()), 45.0, 9.0)
                .with_name("FERMATA PORTA NUOVA"),
        ];
        let geo = vec![geo_stop(&mut ids, 5001, &[("ref", "12"), ("highway", "bus_stop")], 45.0, 9.0)];
        let policy = TitleCaseNaming::new(vec!["Fermata".to_string()]);

        let out = reconcile_stops(schedule, geo, &policy, &settings()).unwrap();
        assert_eq!(
            out.matched_with_updates[0].tags.get("name"),
            Some("Porta Nuova")
        );
    }

    #[test]
    fn synthetic_ids_are_stable_across_runs() {
        let run = || {
            let mut ids = RunIdAllocator::new();
            let schedule = vec![schedule_stop(&mut ids, "STOP-A", "1", 45.0, 9.0)];
            reconcile_stops(schedule, vec![], &PassthroughNaming, &settings())
                .unwrap()
                .new_stops_from_schedule[0]
                .osm_id
        };
        let first = run();
        assert!(first < 0);
        assert_eq!(first, run());
    }
}
