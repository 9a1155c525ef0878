use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

/// Quiet period before a map viewport change triggers a groups query.
pub const MAP_BOUNDS_DEBOUNCE: Duration = Duration::from_millis(500);

/// Buffer size for pending debounced values.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Emits the latest pushed value once `delay` passes without a newer one.
///
/// Dropping the `Debouncer` flushes a pending value and stops the task.
pub struct Debouncer<T> {
    tx: mpsc::Sender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Must be called inside a Tokio runtime.
    pub fn new(delay: Duration) -> (Self, mpsc::Receiver<T>) {
        let (in_tx, mut in_rx) = mpsc::channel::<T>(CHANNEL_BUFFER_SIZE);
        let (out_tx, out_rx) = mpsc::channel::<T>(CHANNEL_BUFFER_SIZE);

        tokio::spawn(async move {
            while let Some(mut latest) = in_rx.recv().await {
                loop {
                    match timeout(delay, in_rx.recv()).await {
                        Ok(Some(newer)) => latest = newer,
                        Ok(None) => {
                            let _ = out_tx.send(latest).await;
                            return;
                        }
                        Err(_) => break,
                    }
                }
                if out_tx.send(latest).await.is_err() {
                    return;
                }
            }
        });

        (Self { tx: in_tx }, out_rx)
    }

    /// Queue a value. Returns false once the output side is gone.
    pub async fn push(&self, value: T) -> bool {
        self.tx.send(value).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_emits_only_latest() {
        let (debouncer, mut rx) = Debouncer::new(MAP_BOUNDS_DEBOUNCE);
        for i in 0..5 {
            assert!(debouncer.push(i).await);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(rx.recv().await, Some(4));

        assert!(debouncer.push(10).await);
        assert_eq!(rx.recv().await, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_values_all_emitted() {
        let (debouncer, mut rx) = Debouncer::new(Duration::from_millis(50));
        debouncer.push("a").await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        debouncer.push("b").await;
        assert_eq!(rx.recv().await, Some("a"));
        assert_eq!(rx.recv().await, Some("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_flushes_pending_value() {
        let (debouncer, mut rx) = Debouncer::new(MAP_BOUNDS_DEBOUNCE);
        debouncer.push(1).await;
        debouncer.push(2).await;
        drop(debouncer);
        assert_eq!(rx.recv().await, Some(2));
        assert_eq!(rx.recv().await, None);
    }
}
