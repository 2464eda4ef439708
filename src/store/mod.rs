//! In-memory record store.
//!
//! The dataset is read once into an immutable [`Snapshot`] and shared as an
//! `Arc`. Queries clone the `Arc` and scan without any further coordination.
//! A reload builds a complete new snapshot first and only then swaps the
//! pointer, so a query that started on the old snapshot finishes on it.
//!
//! Load failures never escape: the store caches an empty snapshot carrying the
//! [`DatasetError`], and every consumer degrades to "no data".

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::domain::{DatasetStats, PriceRecord};
use crate::error::{AppError, DatasetError};
use crate::io::ingest::{RowError, load_dataset};
use crate::pricing::parse_arrival_date;

/// One immutable generation of the dataset.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<PriceRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub loaded_at: DateTime<Utc>,
    /// File the snapshot was read from (`None` for in-memory stores).
    pub source: Option<PathBuf>,
    /// Set when the file could not be loaded; `records` is then empty.
    pub error: Option<DatasetError>,
}

impl Snapshot {
    /// Load `path`, turning any failure into an empty snapshot.
    pub fn load(path: &Path) -> Self {
        match load_dataset(path) {
            Ok(data) => Self {
                records: data.records,
                row_errors: data.row_errors,
                rows_read: data.rows_read,
                loaded_at: Utc::now(),
                source: Some(path.to_path_buf()),
                error: None,
            },
            Err(err) => {
                error!(path = %path.display(), error = %err, "dataset unavailable");
                Self {
                    records: Vec::new(),
                    row_errors: Vec::new(),
                    rows_read: 0,
                    loaded_at: Utc::now(),
                    source: Some(path.to_path_buf()),
                    error: Some(err),
                }
            }
        }
    }

    pub fn from_records(records: Vec<PriceRecord>) -> Self {
        Self {
            rows_read: records.len(),
            records,
            row_errors: Vec::new(),
            loaded_at: Utc::now(),
            source: None,
            error: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }

    pub fn stats(&self) -> DatasetStats {
        let usable: Vec<&PriceRecord> = self.records.iter().filter(|r| r.is_usable()).collect();
        let states: HashSet<&str> = usable.iter().map(|r| r.state.as_str()).collect();
        let commodities: HashSet<&str> = usable.iter().map(|r| r.commodity.as_str()).collect();

        let dates: Vec<_> = self
            .records
            .iter()
            .filter_map(|r| parse_arrival_date(&r.arrival_date))
            .collect();

        DatasetStats {
            rows: self.records.len(),
            usable_rows: usable.len(),
            states: states.len(),
            commodities: commodities.len(),
            earliest_arrival: dates.iter().min().copied(),
            latest_arrival: dates.iter().max().copied(),
            undated_rows: self.records.len() - dates.len(),
            priced_rows: self
                .records
                .iter()
                .filter(|r| r.modal_price.is_some_and(|p| p.is_finite() && p > 0.0))
                .count(),
        }
    }
}

/// Shared, lazily loaded, atomically replaceable dataset.
#[derive(Debug)]
pub struct RecordStore {
    source: Option<PathBuf>,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl RecordStore {
    /// A store backed by `path`; nothing is read until the first query.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            current: RwLock::new(None),
        }
    }

    /// A store over fixed in-memory records.
    pub fn from_records(records: Vec<PriceRecord>) -> Self {
        Self {
            source: None,
            current: RwLock::new(Some(Arc::new(Snapshot::from_records(records)))),
        }
    }

    /// The current snapshot, loading it on first use.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        if let Some(snapshot) = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(snapshot);
        }

        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have loaded while we waited for the write lock.
        if let Some(snapshot) = slot.as_ref() {
            return Arc::clone(snapshot);
        }
        let snapshot = Arc::new(self.build());
        *slot = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Build a fresh snapshot and swap it in.
    ///
    /// Loading happens outside the lock; readers only ever wait for the
    /// pointer swap itself. A failed load never replaces a usable snapshot:
    /// the previous data stays in place and the error is returned. The error
    /// snapshot is only cached when nothing usable was loaded before.
    pub fn reload(&self) -> Result<Arc<Snapshot>, DatasetError> {
        if self.source.is_none() {
            return Ok(self.snapshot());
        }

        let fresh = self.build();
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(err) = fresh.error.clone() {
            if slot.as_ref().is_some_and(|current| current.is_available()) {
                warn!(error = %err, "dataset reload failed; keeping previous snapshot");
            } else {
                *slot = Some(Arc::new(fresh));
            }
            return Err(err);
        }

        let snapshot = Arc::new(fresh);
        *slot = Some(Arc::clone(&snapshot));
        drop(slot);
        info!(records = snapshot.records.len(), "dataset snapshot swapped");
        Ok(snapshot)
    }

    /// Records of the current snapshot satisfying `predicate`, in dataset order.
    pub fn filter<P>(&self, predicate: P) -> Vec<PriceRecord>
    where
        P: Fn(&PriceRecord) -> bool + Sync + Send,
    {
        self.snapshot()
            .records
            .par_iter()
            .filter(|r| predicate(*r))
            .cloned()
            .collect()
    }

    /// Reload the dataset every `interval` on a background thread.
    ///
    /// Refreshing stops when the returned handle is stopped or dropped.
    pub fn spawn_refresh(self: &Arc<Self>, interval: Duration) -> Result<RefreshHandle, AppError> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let store = Arc::clone(self);

        let thread = thread::Builder::new()
            .name("dataset-refresh".to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            // Failures are logged by the load and the previous data is kept.
                            let _ = store.reload();
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| AppError::new(2, format!("Failed to start dataset refresh thread: {e}")))?;

        info!(interval_ms = interval.as_millis() as u64, "dataset refresh started");
        Ok(RefreshHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    fn build(&self) -> Snapshot {
        match &self.source {
            Some(path) => Snapshot::load(path),
            None => Snapshot::from_records(Vec::new()),
        }
    }
}

/// Keeps a background refresh alive.
#[derive(Debug)]
pub struct RefreshHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Stop refreshing and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
