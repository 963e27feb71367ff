//! Tests for the proximity engine.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use super::*;
use crate::coord::{offset_north, GeoPoint};
use crate::marker::MarkerColor;
use crate::notify::{NotifierCall, RecordingNotifier};

const CAFE: GeoPoint = GeoPoint::new(58.0, 56.0);
const BRIDGE: GeoPoint = GeoPoint::new(58.01, 56.01);

fn marker(id: MarkerId, at: GeoPoint, title: &str) -> Marker {
    Marker {
        id,
        latitude: at.latitude,
        longitude: at.longitude,
        title: title.to_string(),
        description: None,
        color: MarkerColor::Red,
        created_at: Utc::now(),
    }
}

fn sample_at(point: GeoPoint) -> LocationSample {
    LocationSample::new(point.latitude, point.longitude)
}

fn engine() -> (ProximityEngine<Arc<RecordingNotifier>>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    (ProximityEngine::new(Arc::clone(&notifier)), notifier)
}

mod entry {
    use super::*;

    #[test]
    fn test_entering_radius_notifies_once() {
        let (mut engine, notifier) = engine();
        let markers = vec![marker(1, CAFE, "Cafe"), marker(2, BRIDGE, "Bridge")];

        let report = engine.evaluate(&sample_at(CAFE), &markers);

        assert_eq!(report.near, vec![1]);
        assert_eq!(report.notified, vec![1]);
        assert_eq!(notifier.scheduled_markers(), vec![1]);
        assert_eq!(engine.active_count(), 1);
        assert!(engine.is_active(1));
        assert!(!engine.is_active(2));
    }

    #[test]
    fn test_notification_content() {
        let (mut engine, notifier) = engine();
        engine.evaluate(&sample_at(CAFE), &[marker(9, CAFE, "Cafe")]);

        let calls = notifier.calls();
        let NotifierCall::Scheduled { id, request } = &calls[0] else {
            panic!("expected a scheduled notification, got {:?}", calls);
        };
        assert_eq!(request.title, DEFAULT_NOTIFICATION_TITLE);
        assert_eq!(request.body, "You are near \"Cafe\"");
        assert_eq!(request.payload.marker_id, 9);
        assert_eq!(&engine.active(9).unwrap().notification_id, id);
    }

    #[test]
    fn test_staying_inside_is_idempotent() {
        let (mut engine, notifier) = engine();
        let markers = vec![marker(1, CAFE, "Cafe")];

        engine.evaluate(&sample_at(CAFE), &markers);
        let report = engine.evaluate(&sample_at(offset_north(CAFE, 30.0)), &markers);

        assert!(report.is_noop());
        assert_eq!(report.near, vec![1]);
        assert_eq!(notifier.calls().len(), 1);
    }

    #[test]
    fn test_several_markers_in_range() {
        let (mut engine, notifier) = engine();
        let markers = vec![
            marker(1, CAFE, "Cafe"),
            marker(2, offset_north(CAFE, 40.0), "Kiosk"),
            marker(3, offset_north(CAFE, 400.0), "Far away"),
        ];

        let report = engine.evaluate(&sample_at(CAFE), &markers);

        assert_eq!(report.notified, vec![1, 2]);
        assert_eq!(notifier.scheduled_markers(), vec![1, 2]);
        assert_eq!(engine.active_ids(), vec![1, 2]);
    }

    #[test]
    fn test_duplicate_marker_rows_notify_once() {
        let (mut engine, notifier) = engine();
        let markers = vec![marker(1, CAFE, "Cafe"), marker(1, CAFE, "Cafe")];

        let report = engine.evaluate(&sample_at(CAFE), &markers);

        assert_eq!(report.near, vec![1]);
        assert_eq!(notifier.scheduled_markers(), vec![1]);
    }

    #[test]
    fn test_custom_radius() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut engine = ProximityEngine::builder()
            .notifier(Arc::clone(&notifier))
            .radius_meters(500.0)
            .build()
            .unwrap();

        engine.evaluate(
            &sample_at(CAFE),
            &[marker(1, offset_north(CAFE, 450.0), "Tower")],
        );
        assert_eq!(engine.active_ids(), vec![1]);
    }
}

mod retraction {
    use super::*;

    #[test]
    fn test_leaving_radius_does_not_retract() {
        let (mut engine, notifier) = engine();
        let markers = vec![marker(1, CAFE, "Cafe")];

        engine.evaluate(&sample_at(CAFE), &markers);
        let report = engine.evaluate(&sample_at(offset_north(CAFE, 5_000.0)), &markers);

        assert!(report.near.is_empty());
        assert!(report.retracted.is_empty());
        assert!(engine.is_active(1));
        assert_eq!(notifier.cancelled_count(), 0);
        assert_eq!(notifier.dismissed_count(), 0);
    }

    #[test]
    fn test_reentry_while_tracked_does_not_renotify() {
        let (mut engine, notifier) = engine();
        let markers = vec![marker(1, CAFE, "Cafe")];

        engine.evaluate(&sample_at(CAFE), &markers);
        engine.evaluate(&sample_at(offset_north(CAFE, 5_000.0)), &markers);
        let report = engine.evaluate(&sample_at(CAFE), &markers);

        assert!(report.notified.is_empty());
        assert_eq!(notifier.scheduled_markers(), vec![1]);
    }

    #[test]
    fn test_deleting_marker_retracts() {
        let (mut engine, notifier) = engine();
        let markers = vec![marker(1, CAFE, "Cafe"), marker(2, BRIDGE, "Bridge")];

        engine.evaluate(&sample_at(CAFE), &markers);
        let notification_id = engine.active(1).unwrap().notification_id.clone();

        // Marker 1 deleted; user still standing on it
        let report = engine.evaluate(&sample_at(CAFE), &markers[1..]);

        assert_eq!(report.retracted, vec![1]);
        assert_eq!(engine.active_count(), 0);
        let calls = notifier.calls();
        assert!(calls.contains(&NotifierCall::Cancelled(notification_id.clone())));
        assert!(calls.contains(&NotifierCall::Dismissed(notification_id)));
    }

    #[test]
    fn test_retraction_happens_once() {
        let (mut engine, notifier) = engine();
        engine.evaluate(&sample_at(CAFE), &[marker(1, CAFE, "Cafe")]);

        let first = engine.evaluate(&sample_at(CAFE), &[]);
        let second = engine.evaluate(&sample_at(CAFE), &[]);

        assert_eq!(first.retracted, vec![1]);
        assert!(second.retracted.is_empty());
        assert_eq!(notifier.cancelled_count(), 1);
        assert_eq!(notifier.dismissed_count(), 1);
    }

    #[test]
    fn test_dismiss_failure_still_clears_state() {
        let (mut engine, notifier) = engine();
        engine.evaluate(&sample_at(CAFE), &[marker(1, CAFE, "Cafe")]);

        notifier.set_fail_dismiss(true);
        let report = engine.evaluate(&sample_at(CAFE), &[]);

        assert_eq!(report.retracted, vec![1]);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_readded_marker_notifies_again() {
        let (mut engine, notifier) = engine();
        engine.evaluate(&sample_at(CAFE), &[marker(1, CAFE, "Cafe")]);
        engine.evaluate(&sample_at(CAFE), &[]);
        engine.evaluate(&sample_at(CAFE), &[marker(1, CAFE, "Cafe")]);

        assert_eq!(notifier.scheduled_markers(), vec![1, 1]);
        assert!(engine.is_active(1));
    }
}

mod reset {
    use super::*;

    #[test]
    fn test_reset_allows_second_notification() {
        let (mut engine, notifier) = engine();
        let markers = vec![marker(1, CAFE, "Cafe")];
        engine.evaluate(&sample_at(CAFE), &markers);

        assert!(engine.reset(1));
        assert_eq!(engine.active_count(), 0);
        engine.evaluate(&sample_at(CAFE), &markers);

        assert_eq!(notifier.scheduled_markers(), vec![1, 1]);
        // Reset touches state only, never the notification centre
        assert_eq!(notifier.cancelled_count(), 0);
    }

    #[test]
    fn test_reset_unknown_marker() {
        let (mut engine, _notifier) = engine();
        assert!(!engine.reset(42));
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_failed_notification_stays_idle_and_retries() {
        let (mut engine, notifier) = engine();
        let markers = vec![marker(1, CAFE, "Cafe")];

        notifier.set_fail_schedule(true);
        let report = engine.evaluate(&sample_at(CAFE), &markers);
        assert_eq!(report.failed, vec![1]);
        assert!(!engine.is_active(1));

        notifier.set_fail_schedule(false);
        let report = engine.evaluate(&sample_at(CAFE), &markers);
        assert_eq!(report.notified, vec![1]);
        assert!(engine.is_active(1));
    }

    #[test]
    fn test_permission_revoked() {
        let (mut engine, notifier) = engine();
        notifier.set_deny_permission(true);

        let report = engine.evaluate(&sample_at(CAFE), &[marker(1, CAFE, "Cafe")]);

        assert_eq!(report.failed, vec![1]);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_malformed_marker_skipped_but_not_retracted() {
        let (mut engine, _notifier) = engine();
        engine.evaluate(&sample_at(CAFE), &[marker(1, CAFE, "Cafe")]);

        let mut broken = marker(1, CAFE, "Cafe");
        broken.latitude = f64::NAN;
        let report = engine.evaluate(&sample_at(CAFE), &[broken]);

        assert_eq!(report.malformed, vec![1]);
        assert!(report.near.is_empty());
        assert!(report.retracted.is_empty());
        assert!(engine.is_active(1));
    }
}

mod builder {
    use super::*;

    #[test]
    fn test_missing_notifier_is_an_error() {
        let result = ProximityEngineBuilder::<RecordingNotifier>::new().build();
        assert!(matches!(result, Err(EngineError::NotConfigured(_))));
    }

    #[test]
    fn test_invalid_radius() {
        let result = ProximityEngine::builder()
            .notifier(RecordingNotifier::new())
            .radius_meters(0.0)
            .build();
        assert_eq!(result.unwrap_err(), EngineError::InvalidRadius(0.0));

        let result = ProximityEngine::builder()
            .notifier(RecordingNotifier::new())
            .radius_meters(f64::NAN)
            .build();
        assert!(matches!(result, Err(EngineError::InvalidRadius(_))));
    }

    #[test]
    fn test_custom_title() {
        let engine = ProximityEngine::builder()
            .notifier(RecordingNotifier::new())
            .title("Look around!")
            .build()
            .unwrap();
        assert_eq!(engine.config().title, "Look around!");
    }
}

#[test]
fn test_same_position_different_timestamps_same_state() {
    let (mut engine, notifier) = engine();
    let markers = vec![marker(1, CAFE, "Cafe"), marker(2, BRIDGE, "Bridge")];
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    engine.evaluate(
        &LocationSample::with_timestamp(CAFE.latitude, CAFE.longitude, t0),
        &markers,
    );
    let ids_before = engine.active_ids();
    let active_before = engine.active(1).cloned();

    let report = engine.evaluate(
        &LocationSample::with_timestamp(CAFE.latitude, CAFE.longitude, t0 + Duration::minutes(5)),
        &markers,
    );

    assert!(report.is_noop());
    assert_eq!(engine.active_ids(), ids_before);
    assert_eq!(engine.active(1).cloned(), active_before);
    assert_eq!(notifier.calls().len(), 1);
}

#[test]
fn test_mocked_fallback_sample_is_evaluated() {
    let (mut engine, _notifier) = engine();
    let sample = LocationSample::fallback(CAFE);
    let report = engine.evaluate(&sample, &[marker(1, CAFE, "Cafe")]);
    assert_eq!(report.notified, vec![1]);
}

proptest! {
    #[test]
    fn prop_active_ids_subset_of_markers(
        steps in prop::collection::vec(
            (prop::collection::vec(0i64..6, 0..6), 0.0f64..300.0),
            1..20,
        )
    ) {
        let (mut engine, _notifier) = engine();

        for (ids, offset) in steps {
            // Marker n sits 60m north of the previous one
            let markers: Vec<Marker> = ids
                .iter()
                .map(|&id| marker(id, offset_north(CAFE, id as f64 * 60.0), "m"))
                .collect();
            let sample = sample_at(offset_north(CAFE, offset));
            engine.evaluate(&sample, &markers);

            let current: HashSet<MarkerId> = ids.iter().copied().collect();
            let active = engine.active_ids();
            prop_assert_eq!(engine.active_count(), active.len());
            prop_assert!(active.iter().all(|id| current.contains(id)));
        }
    }

    #[test]
    fn prop_repeat_evaluate_is_noop(offset in 0.0f64..500.0) {
        let (mut engine, notifier) = engine();
        let markers = vec![
            marker(1, CAFE, "a"),
            marker(2, offset_north(CAFE, 150.0), "b"),
            marker(3, offset_north(CAFE, 300.0), "c"),
        ];
        let sample = sample_at(offset_north(CAFE, offset));

        engine.evaluate(&sample, &markers);
        let calls = notifier.calls().len();
        let report = engine.evaluate(&sample, &markers);

        prop_assert!(report.is_noop());
        prop_assert_eq!(notifier.calls().len(), calls);
    }
}
