// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Events delivered to consumers of the synchronizer.

use crate::error::InformerError;
use tokio::sync::mpsc;
use tracing::warn;

/// A change to the local view of the collection
#[derive(Debug, Clone, PartialEq)]
pub enum Event<K> {
    /// An object appeared
    Added(K),
    /// An object changed, carries the previously cached copy and the new one
    Updated(K, K),
    /// An object disappeared, carries its last known state
    Deleted(K),
}

impl<K> Event<K> {
    /// The most recent state of the object this event refers to
    pub fn object(&self) -> &K {
        match self {
            Event::Added(obj) | Event::Updated(_, obj) | Event::Deleted(obj) => obj,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Added(_) => "added",
            Event::Updated(..) => "updated",
            Event::Deleted(_) => "deleted",
        }
    }
}

/// Sink for synchronizer events.
///
/// Invoked synchronously while the synchronizer holds its cache lock, so
/// a slow handler slows down the activity that produced the event.
pub trait EventHandler<K>: Send + 'static {
    fn on_event(&mut self, event: Event<K>);

    /// Called for per-object decode failures and non-fatal list failures
    fn on_error(&mut self, error: &InformerError) {
        let _ = error;
    }
}

impl<K, F> EventHandler<K> for F
where
    F: FnMut(Event<K>) + Send + 'static,
{
    fn on_event(&mut self, event: Event<K>) {
        self(event)
    }
}

/// Forwards events into an ordered channel
pub struct ChannelHandler<K> {
    tx: mpsc::UnboundedSender<Event<K>>,
}

impl<K> ChannelHandler<K> {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event<K>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl<K: Send + 'static> EventHandler<K> for ChannelHandler<K> {
    fn on_event(&mut self, event: Event<K>) {
        if self.tx.send(event).is_err() {
            warn!("Event receiver dropped, discarding event");
        }
    }

    fn on_error(&mut self, error: &InformerError) {
        warn!("Synchronizer error: {}", error);
    }
}
