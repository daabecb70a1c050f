//! # Live market data
//!
//! View-binding adapter over [`DataSource`]: publishes a [`Snapshot`]
//! (`data`, `loading`, `error`) through a `watch` channel and drives it with
//! an initial load, optional polling and manual refetches.
//!
//! Ordering rules per instance:
//! - every request takes a generation number when it is issued; only the
//!   latest generation may publish (last-request-wins, not last-resolved-wins);
//! - polling ticks are skipped while any request is in flight;
//! - after `teardown()` nothing is published any more.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::FetchError;
use crate::source::DataSource;
use crate::types::MarketIntelligenceData;

#[derive(Debug, Clone, Copy, Default)]
pub struct LiveOptions {
    /// `None` loads once and never polls.
    pub poll_interval: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Idle,
    Loading,
    Success,
    Failure,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub state: LoadState,
    /// Latest successful payload, or the last-known-good cache entry.
    pub data: Option<Arc<MarketIntelligenceData>>,
    /// User-visible message once retries are exhausted.
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn idle() -> Self {
        Self {
            state: LoadState::Idle,
            data: None,
            error: None,
            updated_at: None,
        }
    }

    pub fn loading(&self) -> bool {
        self.state == LoadState::Loading
    }
}

struct Shared {
    source: DataSource,
    tx: watch::Sender<Snapshot>,
    generation: AtomicU64,
    in_flight: AtomicUsize,
    mounted: AtomicBool,
}

/// One issued request. Releases its in-flight slot on drop; if it is dropped
/// before publishing while still the latest request, the `Loading` it set is
/// rolled back to the last settled state.
struct InFlight {
    shared: Arc<Shared>,
    generation: u64,
    published: bool,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.published {
            self.shared.abandon(self.generation);
        }
    }
}

/// State the snapshot settles back to when no request can publish.
fn settled_state(s: &Snapshot) -> LoadState {
    if s.error.is_some() {
        LoadState::Failure
    } else if s.data.is_some() {
        LoadState::Success
    } else {
        LoadState::Idle
    }
}

impl Shared {
    fn is_latest(&self, generation: u64) -> bool {
        generation == self.generation.load(Ordering::SeqCst)
    }

    /// Synchronous part (generation, in-flight, `Loading`) runs now; the
    /// returned future does the I/O and publishes. After teardown nothing is
    /// issued and the future is a no-op.
    fn begin(self: &Arc<Self>, force: bool) -> impl Future<Output = ()> + Send + 'static {
        let request = self.mounted.load(Ordering::SeqCst).then(|| {
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            self.tx.send_modify(|s| s.state = LoadState::Loading);
            InFlight {
                shared: Arc::clone(self),
                generation,
                published: false,
            }
        });

        async move {
            let Some(mut req) = request else {
                tracing::debug!("market data request ignored after teardown");
                return;
            };
            let result = req.shared.source.load(force).await;
            req.shared.publish(req.generation, result);
            req.published = true;
        }
    }

    fn publish(&self, generation: u64, result: Result<Arc<MarketIntelligenceData>, FetchError>) {
        if !self.mounted.load(Ordering::SeqCst) {
            tracing::debug!(generation, "discarding market data after teardown");
            return;
        }
        if !self.is_latest(generation) {
            tracing::debug!(generation, "discarding superseded market data response");
            return;
        }

        let last_known_good = match &result {
            Err(_) if self.tx.borrow().data.is_none() => self.source.stale(),
            _ => None,
        };

        // Re-checked under the channel lock: a newer request may have been
        // issued while the stale entry was read.
        let applied = self.tx.send_if_modified(|s| {
            if !self.is_latest(generation) {
                return false;
            }
            match &result {
                Ok(data) => {
                    s.state = LoadState::Success;
                    s.data = Some(Arc::clone(data));
                    s.error = None;
                    s.updated_at = Some(Utc::now());
                }
                Err(e) => {
                    s.state = LoadState::Failure;
                    s.error = Some(e.to_string());
                    if s.data.is_none() {
                        s.data = last_known_good.clone();
                    }
                }
            }
            true
        });

        if !applied {
            tracing::debug!(generation, "discarding superseded market data response");
        } else if let Err(e) = &result {
            tracing::warn!(error = %e, generation, "market data unavailable");
        }
    }

    /// The latest request went away without a result (dropped or aborted).
    fn abandon(&self, generation: u64) {
        if !self.mounted.load(Ordering::SeqCst) {
            return;
        }
        let restored = self.tx.send_if_modified(|s| {
            if !self.is_latest(generation) || s.state != LoadState::Loading {
                return false;
            }
            s.state = settled_state(s);
            true
        });
        if restored {
            tracing::debug!(generation, "market data request abandoned before completion");
        }
    }
}

pub struct LiveData {
    shared: Arc<Shared>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl LiveData {
    /// Bound but not started; first `refresh`/`refetch` leaves `Idle`.
    pub fn idle(source: DataSource) -> Self {
        let (tx, _rx) = watch::channel(Snapshot::idle());
        Self {
            shared: Arc::new(Shared {
                source,
                tx,
                generation: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                mounted: AtomicBool::new(true),
            }),
            poller: Mutex::new(None),
        }
    }

    /// Mount: go to `Loading` immediately, load (cache allowed), and start
    /// polling. Must be called inside a Tokio runtime.
    pub fn spawn(source: DataSource, opts: LiveOptions) -> Self {
        let live = Self::idle(source);
        tokio::spawn(live.shared.begin(false));

        let Some(every) = opts.poll_interval else {
            return live;
        };
        let shared = Arc::clone(&live.shared);
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if !shared.mounted.load(Ordering::SeqCst) {
                    break;
                }
                if shared.in_flight.load(Ordering::SeqCst) > 0 {
                    tracing::debug!("poll tick skipped: request still in flight");
                    continue;
                }
                shared.begin(true).await;
            }
        });

        if let Ok(mut slot) = live.poller.lock() {
            *slot = Some(handle);
        }
        live
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.shared.tx.subscribe()
    }

    /// Forced network load; the generation is taken now, not when first polled.
    pub fn refresh(&self) -> impl Future<Output = ()> + Send + 'static {
        self.shared.begin(true)
    }

    /// Soft load that a fresh cache entry may satisfy.
    pub fn refresh_cached(&self) -> impl Future<Output = ()> + Send + 'static {
        self.shared.begin(false)
    }

    /// Fire-and-forget forced refresh.
    pub fn refetch(&self) -> JoinHandle<()> {
        tokio::spawn(self.refresh())
    }

    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::SeqCst)
    }

    /// Stop polling and drop every result that resolves from now on.
    /// Requests already in flight run to completion but publish nothing.
    pub fn teardown(&self) {
        self.shared.mounted.store(false, Ordering::SeqCst);
        let handle = match self.poller.lock() {
            Ok(mut slot) => slot.take(),
            Err(poison) => poison.into_inner().take(),
        };
        if let Some(h) = handle {
            h.abort();
        }
    }
}

impl Drop for LiveData {
    fn drop(&mut self) {
        self.teardown();
    }
}
