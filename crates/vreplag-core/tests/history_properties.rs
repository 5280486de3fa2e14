use proptest::prelude::*;
use vreplag_core::{ChartPolicy, LagHistory, NullPolicy};
use vreplag_types::Observation;

fn observation() -> impl Strategy<Value = Observation> {
    (
        prop::option::weighted(0.9, 0i64..50),
        prop::option::weighted(0.9, 0i64..50),
    )
        .prop_map(|(updated, txn)| Observation::new(updated, txn))
}

/// Number of points a count-bounded history should end up with.
fn expected_len(observations: &[Observation], policy: &ChartPolicy) -> usize {
    let mut last_updated: Option<Option<i64>> = None;
    let mut accepted = 0usize;
    for obs in observations {
        if policy.null_policy == NullPolicy::Skip && !obs.is_computable() {
            continue;
        }
        if policy.dedup && last_updated == Some(obs.updated_at_seconds) {
            continue;
        }
        last_updated = Some(obs.updated_at_seconds);
        accepted += 1;
    }
    accepted.min(policy.window_size)
}

// Property: length is min(accepted observations, window size)
proptest! {
    #[test]
    fn prop_bounded_length(observations in prop::collection::vec(observation(), 0..200),
                           window in 1usize..40,
                           gap in any::<bool>()) {
        let policy = ChartPolicy::default()
            .with_window_size(window)
            .with_null_policy(if gap { NullPolicy::Gap } else { NullPolicy::Skip });

        let mut history = LagHistory::new();
        for (i, obs) in observations.iter().enumerate() {
            history = history.ingest(obs, &policy, i as i64 * 1_000);
            prop_assert!(history.len() <= window);
        }

        prop_assert_eq!(history.len(), expected_len(&observations, &policy));
    }
}

// Property: eviction is FIFO, so the survivors are the tail of everything accepted
proptest! {
    #[test]
    fn prop_fifo_eviction(count in 1i64..100, window in 1usize..20) {
        let policy = ChartPolicy::default().with_window_size(window);

        let mut history = LagHistory::new();
        for i in 0..count {
            history.push_observation(&Observation::complete(i, 0), &policy, i);
        }

        let kept = (count as usize).min(window);
        let expected: Vec<i64> = (count - kept as i64..count).collect();
        prop_assert_eq!(history.timestamps(), expected);
    }
}

// Property: re-ingesting the same time_updated never changes the history
proptest! {
    #[test]
    fn prop_dedup_is_idempotent(observations in prop::collection::vec(observation(), 1..50)) {
        let policy = ChartPolicy::sparkline();
        let mut history = LagHistory::new();
        for (i, obs) in observations.iter().enumerate() {
            history = history.ingest(obs, &policy, i as i64);
        }

        let last = *observations.last().unwrap();
        let again = history.ingest(&last, &policy, 1_000_000);
        prop_assert_eq!(again, history);
    }
}

// Property: window_for keeps only points in the span, order preserved
proptest! {
    #[test]
    fn prop_window_for_filters_by_span(count in 0i64..300, span in 0i64..400_000) {
        let policy = ChartPolicy::default().with_window_size(1_000);
        let mut history = LagHistory::new();
        for i in 0..count {
            history.push_observation(&Observation::complete(i, 0), &policy, i * 1_000);
        }
        let now = count * 1_000;

        let windowed = history.window_for(span, now);
        let expected: Vec<i64> = history
            .timestamps()
            .into_iter()
            .filter(|ts| *ts >= now - span)
            .collect();
        prop_assert_eq!(windowed.timestamps(), expected);
    }
}
