//! Property tests for phase counters.
//!
//! Core guarantees exercised here:
//! - `completed` is monotonically non-decreasing and never exceeds `total`,
//!   whatever mix of completions and failures is recorded.
//! - `AllComplete` is emitted at most once per aggregator.

use intake_progress::{ProgressAggregator, ProgressEvent};
use intake_tree::Phase;
use proptest::prelude::*;

fn phase() -> impl Strategy<Value = Phase> {
    prop_oneof![
        Just(Phase::Constraints),
        Just(Phase::Parser),
        Just(Phase::Messages),
    ]
}

proptest! {
    #[test]
    fn completed_is_monotonic_and_bounded(
        total in 1..8usize,
        ops in proptest::collection::vec((phase(), proptest::bool::ANY), 0..64),
    ) {
        let aggregator = ProgressAggregator::new(total);
        let mut last = [0usize; 3];
        let mut all_complete_events = 0usize;

        for (phase, succeed) in ops {
            let events = if succeed {
                aggregator.record_completion(phase)
            } else {
                vec![aggregator.record_failure(phase)]
            };
            all_complete_events += events
                .iter()
                .filter(|e| matches!(e, ProgressEvent::AllComplete))
                .count();

            for p in Phase::ALL {
                let completed = aggregator.completed(p);
                prop_assert!(completed >= last[p.index()]);
                prop_assert!(completed <= total);
                last[p.index()] = completed;
            }
        }

        prop_assert!(all_complete_events <= 1);
    }
}
