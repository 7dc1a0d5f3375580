use tokio::sync::watch;

/// One-way barrier that opens once the store connection is established.
///
/// Operations started before the gate opens wait for it; once open it stays
/// open until explicitly closed by a disconnect.
#[derive(Debug)]
pub struct ConnectionGate {
    tx: watch::Sender<bool>,
}

impl ConnectionGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub fn close(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves as soon as the gate is open.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for ConnectionGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_wait_pends_until_open() {
        let gate = ConnectionGate::new();
        let mut waiter = task::spawn(gate.wait());

        assert_pending!(waiter.poll());
        gate.open();
        assert!(waiter.is_woken());
        assert_ready!(waiter.poll());
        assert!(gate.is_open());
    }

    #[test]
    fn test_open_gate_does_not_block() {
        let gate = ConnectionGate::new();
        gate.open();
        let mut waiter = task::spawn(gate.wait());
        assert_ready!(waiter.poll());
    }

    #[tokio::test]
    async fn test_queued_waiters_all_proceed() {
        let gate = Arc::new(ConnectionGate::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        gate.open();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[test]
    fn test_close_reopens_barrier() {
        let gate = ConnectionGate::new();
        gate.open();
        gate.close();
        let mut waiter = task::spawn(gate.wait());
        assert_pending!(waiter.poll());
    }
}
