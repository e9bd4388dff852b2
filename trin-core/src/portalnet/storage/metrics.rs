//! Metrics the surrounding node process scrapes, labeled by protocol-id so
//! a node running several sub-protocols (history, state, ...) can tell
//! their ContentDBs' pruning behavior apart.

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    static ref PRUNING_EVENTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "portal_pruning_events_total",
        "Number of fractional pruning passes triggered while storing content",
        &["protocol_id"]
    )
    .unwrap();
    static ref PRUNING_DELETED_ELEMENTS: IntCounterVec = register_int_counter_vec!(
        "portal_pruning_deleted_elements",
        "Number of content entries deleted across all pruning passes",
        &["protocol_id"]
    )
    .unwrap();
}

pub fn record_pruning_event(protocol_id: &str, deleted_count: u64) {
    PRUNING_EVENTS_TOTAL.with_label_values(&[protocol_id]).inc();
    PRUNING_DELETED_ELEMENTS
        .with_label_values(&[protocol_id])
        .inc_by(deleted_count);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_pruning_event_increments_both_counters() {
        let before_events = PRUNING_EVENTS_TOTAL.with_label_values(&["test"]).get();
        let before_deleted = PRUNING_DELETED_ELEMENTS.with_label_values(&["test"]).get();

        record_pruning_event("test", 7);

        assert_eq!(PRUNING_EVENTS_TOTAL.with_label_values(&["test"]).get(), before_events + 1);
        assert_eq!(
            PRUNING_DELETED_ELEMENTS.with_label_values(&["test"]).get(),
            before_deleted + 7
        );
    }
}
