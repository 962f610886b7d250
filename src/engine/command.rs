//! Command-queue draining rules for the render loop.

use std::sync::mpsc::Receiver;

/// Drain a queue, keeping only the most recent value.
///
/// Camera, sky, and exposure updates arrive faster than frames finish;
/// intermediate values are intentionally dropped so the engine never lags
/// behind the UI. Returns `None` when no value was pending.
pub(crate) fn drain_latest<T>(rx: &Receiver<T>) -> Option<T> {
    let mut latest = None;
    while let Ok(value) = rx.try_recv() {
        latest = Some(value);
    }
    latest
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn empty_queue_yields_none() {
        let (_tx, rx) = mpsc::channel::<u32>();
        assert_eq!(drain_latest(&rx), None);
    }

    #[test]
    fn keeps_only_the_last_value() {
        let (tx, rx) = mpsc::channel();
        for value in 0..100 {
            tx.send(value).unwrap();
        }
        assert_eq!(drain_latest(&rx), Some(99));
        // The queue is now empty.
        assert_eq!(drain_latest(&rx), None);
    }

    #[test]
    fn later_submissions_are_seen_on_the_next_drain() {
        let (tx, rx) = mpsc::channel();
        tx.send(1).unwrap();
        assert_eq!(drain_latest(&rx), Some(1));
        tx.send(2).unwrap();
        tx.send(3).unwrap();
        assert_eq!(drain_latest(&rx), Some(3));
    }
}
