//! Stop signaling shared by every component loop.

use tokio::sync::watch;

/// Create a connected [`StopHandle`] / [`StopSignal`] pair.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle(tx), StopSignal(rx))
}

/// Sender side; owned by whoever decides when components stop.
#[derive(Debug)]
pub struct StopHandle(watch::Sender<bool>);

impl StopHandle {
    /// Ask every [`StopSignal`] to fire. Calling it again is harmless.
    pub fn stop(&self) {
        self.0.send_replace(true);
    }
}

/// Receiver side, cloned into each component.
#[derive(Debug, Clone)]
pub struct StopSignal(watch::Receiver<bool>);

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once a stop was requested or the [`StopHandle`] was dropped.
    pub async fn stopped(&mut self) {
        while !*self.0.borrow_and_update() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_wakes_every_clone() {
        let (handle, signal) = stop_channel();
        let mut a = signal.clone();
        let mut b = signal;
        assert!(!a.is_stopped());

        let waiter = tokio::spawn(async move {
            b.stopped().await;
        });
        handle.stop();
        a.stopped().await;
        assert!(a.is_stopped());
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("clone woke up")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_handle_counts_as_stop() {
        let (handle, mut signal) = stop_channel();
        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), signal.stopped())
            .await
            .expect("resolves once the handle is gone");
    }

    #[tokio::test]
    async fn test_stopped_is_pending_until_stop() {
        let (_handle, mut signal) = stop_channel();
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.stopped()).await;
        assert!(waited.is_err());
    }
}
