//! Trailing-edge debounce for async functions.
//!
//! [`Debounced::call`] hands a value to a background task. The task waits for
//! a quiet period with no further calls, then runs the wrapped function once
//! with the most recent value. Values are never queued: a call made while an
//! earlier value is pending replaces it.
//!
//! Liveness caveat: a pending value is discarded if the debouncer is dropped
//! or the process exits before the quiet period ends. Call [`Debounced::flush`]
//! to force it out.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum Command<T> {
    Call(T),
    Flush(oneshot::Sender<()>),
}

/// Handle to a debounced function. Requires a tokio runtime.
pub struct Debounced<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
    task: JoinHandle<()>,
}

impl<T> std::fmt::Debug for Debounced<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounced")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

impl<T: Send + 'static> Debounced<T> {
    /// Wrap `func` so it runs at most once per `delay` of quiet.
    pub fn new<F, Fut>(delay: Duration, func: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(delay, func, rx));
        Self { tx, task }
    }

    /// Schedule `value`, restarting the quiet period.
    pub fn call(&self, value: T) {
        // The task only stops once every sender is gone
        let _ = self.tx.send(Command::Call(value));
    }

    /// Run any pending value now and wait for it to finish.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Discard any pending value and wait for an in-flight run to finish.
    pub async fn cancel(self) {
        let Self { tx, task } = self;
        drop(tx);
        let _ = task.await;
    }
}

async fn run<T, F, Fut>(delay: Duration, func: F, mut rx: mpsc::UnboundedReceiver<Command<T>>)
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut pending: Option<T> = None;

    loop {
        let command = if pending.is_some() {
            tokio::select! {
                command = rx.recv() => command,
                _ = tokio::time::sleep(delay) => {
                    if let Some(value) = pending.take() {
                        func(value).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Call(value)) => pending = Some(value),
            Some(Command::Flush(ack)) => {
                if let Some(value) = pending.take() {
                    func(value).await;
                }
                let _ = ack.send(());
            }
            // Senders gone: pending value is dropped
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, Debounced<u32>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let debounced = Debounced::new(Duration::from_millis(200), move |value| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(value);
            }
        });
        (seen, debounced)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_value() {
        let (seen, debounced) = recorder();

        for value in 1..=5 {
            debounced.call(value);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_pauses_each_fire() {
        let (seen, debounced) = recorder();

        debounced.call(1);
        tokio::time::sleep(Duration::from_millis(300)).await;
        debounced.call(2);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_runs_before_quiet_period() {
        let (seen, debounced) = recorder();

        debounced.call(1);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flush_runs_pending_immediately() {
        let (seen, debounced) = recorder();

        debounced.call(7);
        debounced.flush().await;

        assert_eq!(*seen.lock().unwrap(), vec![7]);

        // Nothing pending: flush is a no-op
        debounced.flush().await;
        assert_eq!(*seen.lock().unwrap(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending() {
        let (seen, debounced) = recorder();

        debounced.call(9);
        debounced.cancel().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(seen.lock().unwrap().is_empty());
    }
}
