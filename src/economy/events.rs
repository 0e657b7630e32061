//! Fan-out of [`GameEvent`]s to external collaborators.
//!
//! Subscribers either take a channel receiver or register a callback. The core never knows
//! their concrete types. Closed channels are pruned on the next publish.

use tokio::sync::mpsc;

use super::types::GameEvent;

type Listener = Box<dyn Fn(&GameEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    channels: Vec<mpsc::UnboundedSender<GameEvent>>,
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event published from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<GameEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels.push(tx);
        rx
    }

    /// Register a synchronous observer. It runs while the engine lock is held, so it must not
    /// call back into the engine.
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn subscriber_count(&self) -> usize {
        self.channels.len() + self.listeners.len()
    }

    pub fn publish_all(&mut self, events: Vec<GameEvent>) {
        if events.is_empty() {
            return;
        }
        for event in &events {
            for listener in &self.listeners {
                listener(event);
            }
        }
        self.channels.retain(|tx| {
            events
                .iter()
                .all(|event| tx.send(event.clone()).is_ok())
        });
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("channels", &self.channels.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
