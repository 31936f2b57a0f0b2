//! TouchClient: the single owner of reconciliation state for one session.
//!
//! Consumes [ServerEvent]s from a [CaressServer](crate::server::CaressServer)
//! subscription and rebroadcasts the resulting [TouchEvent]s.

use crate::config::{DuplicatePolicy, DEFAULT_CHANNEL_CAPACITY};
use crate::event::TouchEvent;
use crate::reconcile::Reconciler;
use crate::server::ServerEvent;
use crate::touch::{TouchSurface, Viewport};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

pub struct TouchClient<S = Viewport> {
    reconciler: Reconciler<S>,
    event_tx: broadcast::Sender<TouchEvent>,
}

impl<S: TouchSurface> TouchClient<S> {
    pub fn new(surface: S, duplicates: DuplicatePolicy) -> Self {
        Self::with_capacity(surface, duplicates, DEFAULT_CHANNEL_CAPACITY)
    }

    /// Like [new](Self::new) with a touch-event channel of `capacity` events.
    /// Subscribers falling further behind lose the oldest events.
    pub fn with_capacity(surface: S, duplicates: DuplicatePolicy, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            reconciler: Reconciler::new(surface).with_duplicate_policy(duplicates),
            event_tx,
        }
    }

    /// Touch events in the order they were produced.
    pub fn subscribe(&self) -> broadcast::Receiver<TouchEvent> {
        self.event_tx.subscribe()
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    /// Applies one server event, broadcasts and returns the touch events it produced.
    pub fn handle(&mut self, event: &ServerEvent) -> Vec<TouchEvent> {
        let events = match event {
            ServerEvent::Packet(packet) => self.reconciler.apply_packet(packet),
            ServerEvent::Disconnected { peer } => {
                tracing::info!(%peer, "transport disconnected, cancelling touches");
                self.reconciler.disconnect()
            }
            _ => Vec::new(),
        };
        self.broadcast(&events);
        events
    }

    /// Consumes server events until the channel closes, then cancels what is
    /// left. Returns the client so its final state can be inspected.
    pub async fn run(mut self, mut rx: broadcast::Receiver<ServerEvent>) -> Self {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    self.handle(&event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "touch client lagging, server events lost");
                }
                Err(RecvError::Closed) => {
                    let events = self.reconciler.disconnect();
                    self.broadcast(&events);
                    break;
                }
            }
        }
        self
    }

    fn broadcast(&self, events: &[TouchEvent]) {
        for event in events {
            let _ = self.event_tx.send(event.clone());
        }
    }
}
