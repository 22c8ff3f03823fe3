// Shared view state: the latest feed snapshot plus the user's map and filter choices.
use crate::ftt_models::TrainRecord;
use crate::ftt_regions::Region;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    /// Helsinki, zoomed out to show southern Finland.
    fn default() -> Self {
        Viewport {
            center_lat: 60.1695,
            center_lon: 24.9354,
            zoom: 6.0,
        }
    }
}

/// Immutable copy of the state used for one render pass.
#[derive(Debug, Clone, Default)]
pub struct ViewSnapshot {
    pub trains: Arc<Vec<TrainRecord>>,
    pub viewport: Viewport,
    pub region: Region,
    /// Bumped on every feed tick, including ticks that published an empty list.
    pub revision: u64,
    pub last_tick: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub(crate) struct ViewState {
    trains: Arc<Vec<TrainRecord>>,
    viewport: Viewport,
    region: Region,
    revision: u64,
    last_tick: Option<DateTime<Utc>>,
}

/// Cloneable handle to the single view state of the application.
#[derive(Debug, Clone, Default)]
pub struct ViewStore {
    inner: Arc<Mutex<ViewState>>,
}

impl ViewStore {
    pub fn new(viewport: Viewport, region: Region) -> Self {
        ViewStore {
            inner: Arc::new(Mutex::new(ViewState {
                viewport,
                region,
                ..ViewState::default()
            })),
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let state = self.lock();
        ViewSnapshot {
            trains: state.trains.clone(),
            viewport: state.viewport,
            region: state.region,
            revision: state.revision,
            last_tick: state.last_tick,
        }
    }

    /// Replace the whole train collection.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn set_trains(&self, trains: Vec<TrainRecord>) {
        Self::replace_trains(&mut self.lock(), trains);
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.lock().viewport = viewport;
    }

    pub fn set_region(&self, region: Region) {
        self.lock().region = region;
    }

    /// Publish from a poller; dropped when `cancelled` is already set.
    /// The flag is read under the state lock, so a canceller holding the same
    /// lock knows no publish can follow.
    pub(crate) fn publish_trains(&self, cancelled: &watch::Receiver<bool>, trains: Vec<TrainRecord>) -> bool {
        let mut state = self.lock();
        if *cancelled.borrow() {
            return false;
        }
        Self::replace_trains(&mut state, trains);
        true
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace_trains(state: &mut ViewState, trains: Vec<TrainRecord>) {
        state.trains = Arc::new(trains);
        state.revision += 1;
        state.last_tick = Some(Utc::now());
    }
}
