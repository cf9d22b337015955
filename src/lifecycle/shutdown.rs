//! Shutdown coordination between the relay and the gateway server.

use tokio::sync::broadcast;

/// Broadcasts a single stop signal to every running listener.
///
/// Each server takes its own receiver through [`Shutdown::subscribe`] and
/// drains in-flight requests once the signal arrives.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Returns how many listeners were notified.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
