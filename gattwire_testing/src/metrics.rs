//! Helpers for asserting on counters recorded by `gattwire`.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

/// Create a debugging recorder and the snapshotter reading it.
#[must_use]
pub fn debugging_recorder() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

/// Sum of every counter called `name` whose labels include `label`, if given.
#[must_use]
pub fn counter_total(snapshotter: &Snapshotter, name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, _, _, _)| key.key().name() == name)
        .filter(|(key, _, _, _)| {
            label.is_none_or(|(wanted_key, wanted_value)| {
                key.key()
                    .labels()
                    .any(|l| l.key() == wanted_key && l.value() == wanted_value)
            })
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(count) => count,
            _ => 0,
        })
        .sum()
}
