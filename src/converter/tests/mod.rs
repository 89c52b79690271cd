use crate::converter::test_helpers::{create_test_converter, jpeg_candidate};
use crate::types::{Event, FileStatus};

mod download;

/// Drain all events currently buffered on a subscriber
fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
