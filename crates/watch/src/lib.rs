//! Config change watcher.
//!
//! Polls the profile document, and when its content hash changes and then
//! stays stable for the debounce period, parses it into a fresh
//! [`LayerStore`] and swaps it into the [`SharedStore`]. A document that
//! fails validation is reported and remembered by hash; the previous store
//! stays in service.

mod shared;

pub use shared::SharedStore;

use hearth_config::{ConfigError, Format, LayerStore, StoreSummary, WatchConfig};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of a reload attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReloadEvent {
    /// A new store is in service.
    Applied { hash: String, summary: StoreSummary },
    /// The document was rejected; the previous store is still in service.
    Rejected { hash: String, error: String },
}

/// Reload events buffered for a slow receiver before new ones are dropped.
const EVENT_QUEUE: usize = 16;

/// Watches one document and keeps a [`SharedStore`] in sync with it.
pub struct ConfigWatcher {
    path: PathBuf,
    shared: SharedStore,
    config: WatchConfig,
    /// Hash of the last content handled, applied or rejected.
    last_hash: Arc<Mutex<Option<String>>>,
}

impl ConfigWatcher {
    /// The file's current content is treated as already handled, on the
    /// assumption that `shared` was loaded from it.
    pub fn new(path: impl Into<PathBuf>, shared: SharedStore, config: WatchConfig) -> Self {
        let path = path.into();
        let initial = std::fs::read(&path).ok().map(|bytes| content_hash(&bytes));
        Self {
            path,
            shared,
            config,
            last_hash: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shared(&self) -> &SharedStore {
        &self.shared
    }

    /// Read, validate and apply the document right away, bypassing the
    /// debounce.
    pub fn reload_now(&self) -> hearth_core::Result<ReloadEvent> {
        let bytes = std::fs::read(&self.path)?;
        let hash = content_hash(&bytes);
        let result = parse(&self.path, &bytes);
        let event = apply(&self.shared, &self.path, hash, result);
        set_last_hash(&self.last_hash, event_hash(&event));
        match &event {
            ReloadEvent::Applied { .. } => Ok(event),
            ReloadEvent::Rejected { error, .. } => Err(hearth_core::Error::Config {
                message: error.clone(),
            }),
        }
    }

    /// Start the polling loop.
    ///
    /// Returns a receiver of reload events and the loop's join handle. The
    /// loop keeps running if the receiver is dropped.
    pub fn start(&self) -> (mpsc::Receiver<ReloadEvent>, tokio::task::JoinHandle<()>) {
        let path = self.path.clone();
        let shared = self.shared.clone();
        let last_hash = self.last_hash.clone();
        let poll = self.config.poll_interval();
        let debounce = self.config.debounce();
        let (tx, rx) = mpsc::channel::<ReloadEvent>(EVENT_QUEUE);

        info!(
            path = %path.display(),
            poll_ms = poll.as_millis() as u64,
            debounce_ms = debounce.as_millis() as u64,
            "Config watcher started"
        );

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut pending: Option<(String, Instant)> = None;
            let mut missing = false;

            loop {
                interval.tick().await;

                let bytes = match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        if missing {
                            info!(path = %path.display(), "Config file is back");
                            missing = false;
                        }
                        bytes
                    }
                    Err(e) => {
                        if !missing {
                            warn!(path = %path.display(), error = %e, "Config file unreadable; keeping current store");
                            missing = true;
                        }
                        pending = None;
                        continue;
                    }
                };

                let hash = content_hash(&bytes);
                if get_last_hash(&last_hash).as_deref() == Some(hash.as_str()) {
                    pending = None;
                    continue;
                }

                let settled = match &pending {
                    Some((seen, since)) if *seen == hash => since.elapsed() >= debounce,
                    _ => {
                        debug!(hash = %short(&hash), "Config change detected; waiting for it to settle");
                        pending = Some((hash.clone(), Instant::now()));
                        debounce.is_zero()
                    }
                };
                if !settled {
                    continue;
                }
                pending = None;

                let event = apply(&shared, &path, hash, parse(&path, &bytes));
                set_last_hash(&last_hash, event_hash(&event));
                match tx.try_send(event) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(event)) => {
                        warn!(hash = %short(&event_hash(&event)), "Reload event queue full; dropping event");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        debug!("Reload event receiver dropped");
                    }
                }
            }
        });

        (rx, handle)
    }
}

fn parse(path: &Path, bytes: &[u8]) -> Result<LayerStore, ConfigError> {
    let format = Format::from_path(path)?;
    let content = std::str::from_utf8(bytes).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    LayerStore::parse(content, format, &path.display().to_string())
}

fn apply(
    shared: &SharedStore,
    path: &Path,
    hash: String,
    result: Result<LayerStore, ConfigError>,
) -> ReloadEvent {
    match result {
        Ok(store) => {
            let summary = store.summary();
            shared.replace(store);
            info!(path = %path.display(), hash = %short(&hash), "Config reloaded");
            ReloadEvent::Applied { hash, summary }
        }
        Err(e) => {
            warn!(path = %path.display(), hash = %short(&hash), error = %e, "Config reload rejected; previous store stays in service");
            ReloadEvent::Rejected {
                hash,
                error: e.to_string(),
            }
        }
    }
}

fn event_hash(event: &ReloadEvent) -> String {
    match event {
        ReloadEvent::Applied { hash, .. } | ReloadEvent::Rejected { hash, .. } => hash.clone(),
    }
}

fn get_last_hash(slot: &Mutex<Option<String>>) -> Option<String> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

fn set_last_hash(slot: &Mutex<Option<String>>, hash: String) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(hash);
}

/// Hex SHA-256 of the document bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}
