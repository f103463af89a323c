// Cooperative batch loading: a task queue advanced one batch per step by the host loop

use crossbeam_channel::Sender;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::event::{LoadMsg, LoadedItem, Thumbnail};
use crate::model::asset::AssetId;
use crate::pipeline::thumbnail_cache::Raster;

#[derive(Debug, Clone)]
pub struct LoadSession {
    pub directory: PathBuf,
    pub entries: Vec<AssetId>,
    pub loaded: usize,
}

impl LoadSession {
    pub fn percent(&self) -> u8 {
        if self.entries.is_empty() {
            return 100;
        }
        (self.loaded * 100 / self.entries.len()) as u8
    }

    pub fn is_done(&self) -> bool {
        self.loaded >= self.entries.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing queued.
    Idle,
    /// A batch was delivered and the session has more to load.
    Continue,
    Completed(PathBuf),
    /// The session's directory is no longer current; it was dropped silently.
    Cancelled(PathBuf),
}

pub struct BatchLoader {
    tx: Sender<LoadMsg>,
    batch_size: usize,
    cooldown: Duration,
    queue: VecDeque<LoadSession>,
    recent_starts: HashMap<PathBuf, Instant>,
}

impl BatchLoader {
    pub fn new(tx: Sender<LoadMsg>, batch_size: usize, cooldown: Duration) -> Self {
        Self {
            tx,
            batch_size: batch_size.max(1),
            cooldown,
            queue: VecDeque::new(),
            recent_starts: HashMap::new(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// True while a start for `directory` would be rejected as a duplicate.
    pub fn recently_started(&self, directory: &Path) -> bool {
        self.recent_starts
            .get(directory)
            .is_some_and(|started| started.elapsed() < self.cooldown)
    }

    /// Queues a load of `entries` (already in display order). Returns false when
    /// the same directory was started within the cooldown and `force` is unset.
    pub fn start(&mut self, directory: &Path, entries: Vec<AssetId>, force: bool) -> bool {
        if !force && self.recently_started(directory) {
            log::debug!("ignoring repeated load of {}", directory.display());
            return false;
        }

        let cooldown = self.cooldown;
        self.recent_starts.retain(|_, started| started.elapsed() < cooldown);
        self.recent_starts.insert(directory.to_path_buf(), Instant::now());

        // one session per directory at a time
        self.queue.retain(|s| s.directory != directory);

        log::info!("loading {} entries from {}", entries.len(), directory.display());
        let _ = self.tx.send(LoadMsg::Started {
            directory: directory.to_path_buf(),
            total: entries.len(),
        });

        self.queue.push_back(LoadSession {
            directory: directory.to_path_buf(),
            entries,
            loaded: 0,
        });
        true
    }

    /// Advances the oldest queued session by one batch. Sessions whose
    /// directory differs from `current_dir` are dropped before any work.
    pub fn step<F>(&mut self, current_dir: Option<&Path>, mut render: F) -> StepOutcome
    where
        F: FnMut(AssetId) -> Result<Raster>,
    {
        let Some(mut session) = self.queue.pop_front() else {
            return StepOutcome::Idle;
        };

        if current_dir != Some(session.directory.as_path()) {
            log::debug!(
                "dropping stale load of {} after {}/{} entries",
                session.directory.display(),
                session.loaded,
                session.entries.len()
            );
            // a later return to this directory must be able to start over
            self.recent_starts.remove(&session.directory);
            return StepOutcome::Cancelled(session.directory);
        }

        if !session.is_done() {
            let end = (session.loaded + self.batch_size).min(session.entries.len());
            let mut items = Vec::with_capacity(end - session.loaded);

            for &id in &session.entries[session.loaded..end] {
                let thumbnail = match render(id) {
                    Ok(raster) => Thumbnail::Raster(raster),
                    Err(e) => {
                        log::warn!("using placeholder for {:?} in {}: {}", id, session.directory.display(), e);
                        let _ = self.tx.send(LoadMsg::ItemFailed {
                            directory: session.directory.clone(),
                            id,
                            reason: e.to_string(),
                        });
                        Thumbnail::Fallback
                    }
                };
                items.push(LoadedItem { id, thumbnail });
            }

            session.loaded = end;
            let _ = self.tx.send(LoadMsg::Batch {
                directory: session.directory.clone(),
                items,
            });
            let _ = self.tx.send(LoadMsg::Progress {
                directory: session.directory.clone(),
                percent: session.percent(),
            });
        }

        if session.is_done() {
            log::info!("finished loading {}", session.directory.display());
            let _ = self.tx.send(LoadMsg::Complete {
                directory: session.directory.clone(),
                loaded: session.loaded,
            });
            return StepOutcome::Completed(session.directory);
        }

        self.queue.push_back(session);
        StepOutcome::Continue
    }
}
