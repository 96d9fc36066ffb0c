//! Event channel built on crossbeam-channel.
//!
//! The sending half is `Clone + Sync`, so the rayon workers of the
//! extraction and comparison phases can share one sender by reference.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sending half handed to the pipeline.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event.
    ///
    /// A dropped receiver is not an error: progress reporting is optional,
    /// so the event is discarded.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receiving half used by a UI layer.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create an unbounded channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone, for runs without a UI.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ExtractEvent, ExtractProgress, PipelineEvent};
    use rayon::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn events_can_be_sent_from_rayon_workers() {
        let (sender, receiver) = EventChannel::new();

        (0..8usize).into_par_iter().for_each(|i| {
            sender.send(Event::Extract(ExtractEvent::Progress(ExtractProgress {
                completed: i + 1,
                total: 8,
                current_path: PathBuf::from(format!("/test/{}.jpg", i)),
            })));
        });
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        assert_eq!(events.len(), 8);
        assert!(events
            .iter()
            .all(|e| matches!(e, Event::Extract(ExtractEvent::Progress(p)) if p.total == 8)));
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Started));
    }

    #[test]
    fn iteration_ends_when_senders_are_dropped() {
        let (sender, receiver) = EventChannel::new();
        let worker = sender.clone();

        sender.send(Event::Pipeline(PipelineEvent::Started));
        worker.send(Event::Pipeline(PipelineEvent::Started));
        drop(sender);
        drop(worker);

        assert_eq!(receiver.iter().count(), 2);
    }
}
