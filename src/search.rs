use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

/// Forward only the latest query once input has been quiet for `delay`.
///
/// A burst of queries arriving faster than `delay` collapses into its last
/// element. When the input closes, any pending query is flushed first.
pub fn spawn_debouncer(
    mut input: mpsc::Receiver<String>,
    delay: Duration,
) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        while let Some(first) = input.recv().await {
            let mut latest = first;
            let closed = loop {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(query) => latest = query,
                        None => break true,
                    },
                    _ = sleep(delay) => break false,
                }
            };
            if tx.send(latest).await.is_err() || closed {
                return;
            }
        }
    });

    rx
}
