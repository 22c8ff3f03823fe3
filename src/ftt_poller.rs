// Periodic feed fetch with an explicit start/stop lifecycle.
use crate::ftt_models::{FeedSource, TrainRecord};
use crate::ftt_state::ViewStore;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Runs one feed tick immediately and then one per interval, publishing each
/// result to the store, until stopped or dropped.
pub struct FeedPoller {
    store: ViewStore,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl FeedPoller {
    pub fn start<S: FeedSource>(runtime: &Handle, source: S, store: ViewStore, interval: Duration) -> Self {
        let (cancel, cancelled) = watch::channel(false);
        let task = runtime.spawn(run_feed_loop(source, store.clone(), interval, cancelled));
        info!("Feed poller started, refreshing every {}s", interval.as_secs());

        FeedPoller {
            store,
            cancel,
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the timer and any in-flight fetch. No publish happens after this returns.
    pub fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };

        {
            // Publishing checks the flag under this lock.
            let _state = self.store.lock();
            self.cancel.send_replace(true);
        }
        task.abort();
        info!("Feed poller stopped");
    }
}

impl Drop for FeedPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_feed_loop<S: FeedSource>(
    source: S,
    store: ViewStore,
    interval: Duration,
    mut cancelled: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancelled.changed() => break,
            _ = ticker.tick() => {}
        }

        let trains = tokio::select! {
            biased;
            _ = cancelled.changed() => break,
            trains = poll_once(&source) => trains,
        };

        if !store.publish_trains(&cancelled, trains) {
            break;
        }
    }

    debug!("Feed loop exited");
}

/// One feed tick. Every failure becomes an empty collection.
async fn poll_once<S: FeedSource>(source: &S) -> Vec<TrainRecord> {
    match source.fetch().await {
        Ok(trains) => {
            debug!("Feed tick: {} trains", trains.len());
            trains
        }
        Err(e) => {
            warn!("Feed tick failed, clearing trains: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ftt_config::FTTConfig;
    use crate::ftt_models::{FTTError, HttpFeedSource, Result};
    use futures::future::BoxFuture;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use warp::Filter;

    fn train(number: i64, speed: f64) -> TrainRecord {
        TrainRecord {
            train_number: Some(number),
            speed: Some(speed),
            ..TrainRecord::default()
        }
    }

    struct ScriptedSource {
        calls: Arc<AtomicUsize>,
        response: fn() -> Result<Vec<TrainRecord>>,
    }

    impl ScriptedSource {
        fn new(response: fn() -> Result<Vec<TrainRecord>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                ScriptedSource {
                    calls: calls.clone(),
                    response,
                },
                calls,
            )
        }
    }

    impl FeedSource for ScriptedSource {
        fn fetch(&self) -> BoxFuture<'_, Result<Vec<TrainRecord>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = (self.response)();
            Box::pin(async move { result })
        }
    }

    /// Fetch that only completes once the gate is opened.
    struct GatedSource {
        calls: Arc<AtomicUsize>,
        gate: Arc<Notify>,
    }

    impl FeedSource for GatedSource {
        fn fetch(&self) -> BoxFuture<'_, Result<Vec<TrainRecord>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.clone();
            Box::pin(async move {
                gate.notified().await;
                Ok(vec![train(9, 50.0)])
            })
        }
    }

    const TICK: Duration = Duration::from_secs(10);

    #[tokio::test(start_paused = true)]
    async fn publishes_immediately_then_every_interval() {
        let (source, calls) = ScriptedSource::new(|| Ok(vec![train(1, 80.0), train(2, 130.0)]));
        let store = ViewStore::default();
        let mut poller = FeedPoller::start(&Handle::current(), source, store.clone(), TICK);

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(*snapshot.trains, vec![train(1, 80.0), train(2, 130.0)]);

        time::sleep(TICK).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.snapshot().revision, 2);

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_clears_trains_and_keeps_polling() {
        let (source, calls) = ScriptedSource::new(|| {
            Err(FTTError::NetworkError("API returned error: 500 Internal Server Error".to_string()))
        });
        let store = ViewStore::default();
        store.set_trains(vec![train(1, 10.0)]);
        let mut poller = FeedPoller::start(&Handle::current(), source, store.clone(), TICK);

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.snapshot().trains.is_empty());
        assert!(poller.is_running());

        time::sleep(TICK).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.snapshot().revision, 3);

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_fetch_is_discarded_after_stop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Notify::new());
        let source = GatedSource {
            calls: calls.clone(),
            gate: gate.clone(),
        };
        let store = ViewStore::default();
        let mut poller = FeedPoller::start(&Handle::current(), source, store.clone(), TICK);

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        poller.stop();
        gate.notify_waiters();
        time::sleep(TICK * 3).await;

        assert!(!poller.is_running());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision, 0);
        assert!(snapshot.trains.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_stops_it() {
        let (source, calls) = ScriptedSource::new(|| Ok(Vec::new()));
        let store = ViewStore::default();
        let poller = FeedPoller::start(&Handle::current(), source, store.clone(), TICK);

        time::sleep(Duration::from_millis(1)).await;
        drop(poller);
        time::sleep(TICK * 5).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.snapshot().revision, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let (source, _calls) = ScriptedSource::new(|| Ok(Vec::new()));
        let mut poller = FeedPoller::start(&Handle::current(), source, ViewStore::default(), TICK);
        poller.stop();
        poller.stop();
        assert!(!poller.is_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn server_error_from_feed_empties_the_list() {
        let route = warp::any().map(|| {
            warp::reply::with_status("unavailable", warp::http::StatusCode::INTERNAL_SERVER_ERROR)
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let config = FTTConfig {
            feed_url: format!("http://{}/", addr),
            ..FTTConfig::default()
        };
        let store = ViewStore::default();
        store.set_trains(vec![train(4, 60.0)]);
        let source = HttpFeedSource::new(&config).unwrap();
        let mut poller = FeedPoller::start(&Handle::current(), source, store.clone(), TICK);

        for _ in 0..100 {
            if store.snapshot().revision > 1 {
                break;
            }
            time::sleep(Duration::from_millis(50)).await;
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.revision, 2);
        assert!(snapshot.trains.is_empty());
        poller.stop();
    }
}
