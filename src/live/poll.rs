use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use super::sheet::parse_sheet;
use super::LiveSheet;

/// Download the sheet export as raw CSV text.
pub async fn fetch_sheet(client: &reqwest::Client, url: &str) -> Result<String> {
    client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch live sheet {}", url))?
        .error_for_status()
        .context("Live sheet export returned an error status")?
        .text()
        .await
        .context("Failed to read live sheet body")
}

/// Fetch and re-parse the sheet every `every`, handing each fresh snapshot
/// to `on_update`, until `shutdown` flips to true or its sender is dropped.
///
/// A fetch still in flight at shutdown is dropped and never reported. Failed
/// fetches are logged and retried on the next tick.
pub async fn poll_sheet<F, Fut, U>(
    every: Duration,
    mut fetch: F,
    mut on_update: U,
    mut shutdown: watch::Receiver<bool>,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String>>,
    U: FnMut(LiveSheet),
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick = 0u64;

    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        tick += 1;
        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = fetch() => result,
        };

        match result {
            Ok(text) => {
                let sheet = parse_sheet(&text);
                info!(
                    "Live sheet tick {}: {} groups, {} coordinators, {} judges",
                    tick,
                    sheet.groups.len(),
                    sheet.coordinators.len(),
                    sheet.judges.len()
                );
                on_update(sheet);
            }
            Err(e) => warn!("Live sheet tick {} failed: {:#}", tick, e),
        }
    }

    info!("Live sheet polling stopped after {} ticks", tick);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::{mpsc, oneshot};

    const SHEET: &str = "Judges\nName,Room,Time\nDr. Wu,Hall B,2pm\n";

    #[tokio::test]
    async fn delivers_parsed_snapshot_then_stops() {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (update_tx, mut update_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(poll_sheet(
            Duration::from_secs(60),
            || async { Ok(SHEET.to_string()) },
            move |sheet| {
                let _ = update_tx.send(sheet);
            },
            stop_rx,
        ));

        let first = update_rx.recv().await.unwrap();
        assert_eq!(first.judges.len(), 1);
        assert_eq!(first.judges[0].room, "Hall B");

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn failed_fetch_is_not_fatal() {
        let (stop_tx, stop_rx) = watch::channel(false);
        let calls = Arc::new(AtomicUsize::new(0));
        let (update_tx, mut update_rx) = mpsc::unbounded_channel();

        let counter = Arc::clone(&calls);
        let handle = tokio::spawn(poll_sheet(
            Duration::from_millis(5),
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        anyhow::bail!("sheet offline");
                    }
                    Ok(SHEET.to_string())
                }
            },
            move |sheet| {
                let _ = update_tx.send(sheet);
            },
            stop_rx,
        ));

        let sheet = update_rx.recv().await.unwrap();
        assert_eq!(sheet.judges.len(), 1);
        assert!(calls.load(Ordering::SeqCst) >= 2);

        stop_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn in_flight_fetch_is_discarded_on_shutdown() {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let updates = Arc::new(AtomicUsize::new(0));

        let mut started_tx = Some(started_tx);
        let mut release_rx = Some(release_rx);
        let seen = Arc::clone(&updates);
        let handle = tokio::spawn(poll_sheet(
            Duration::from_secs(60),
            move || {
                if let Some(tx) = started_tx.take() {
                    let _ = tx.send(());
                }
                let release = release_rx.take();
                async move {
                    if let Some(release) = release {
                        let _ = release.await;
                    }
                    Ok(SHEET.to_string())
                }
            },
            move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            },
            stop_rx,
        ));

        started_rx.await.unwrap();
        stop_tx.send(true).unwrap();
        handle.await.unwrap();
        let _ = release_tx.send(());

        assert_eq!(updates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dropped_sender_ends_loop() {
        let (stop_tx, stop_rx) = watch::channel(false);
        drop(stop_tx);
        poll_sheet(
            Duration::from_secs(60),
            || async { Ok(String::new()) },
            |_| {},
            stop_rx,
        )
        .await;
    }
}
