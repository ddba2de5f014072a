//! Bounded background pool for preview jobs.
//!
//! Submitting never blocks: each job is spawned immediately and waits for
//! a worker slot on a semaphore. Results are delivered as [`PreviewEvent`]s
//! on an unbounded channel the session drains at its own pace.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn, Instrument};

use cutline_media::fs_utils::remove_file_if_exists;
use cutline_media::FilterChainBuilder;
use cutline_models::{Clip, ClipId};

use crate::config::EditorConfig;
use crate::logging::JobLogger;
use crate::metrics::{record_preview_job, record_superseded_result, set_active_preview_jobs};
use crate::preview::cache::ArtifactCache;
use crate::preview::jobs::{attach_proxy, bake_effect_preview, decorate, JobKind};

/// Notification from a preview job.
#[derive(Debug, Clone)]
pub enum PreviewEvent {
    /// The job holds a worker slot and is about to touch the filesystem.
    Started { clip_id: ClipId, kind: JobKind },
    /// The job finished; `clip` is the snapshot with its artifacts filled in.
    Done { kind: JobKind, clip: Clip },
    /// Only effect previews fail; other jobs degrade to missing artifacts.
    Failed {
        clip_id: ClipId,
        kind: JobKind,
        message: String,
    },
}

impl PreviewEvent {
    pub fn clip_id(&self) -> ClipId {
        match self {
            PreviewEvent::Started { clip_id, .. } | PreviewEvent::Failed { clip_id, .. } => *clip_id,
            PreviewEvent::Done { clip, .. } => clip.id(),
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            PreviewEvent::Started { kind, .. }
            | PreviewEvent::Done { kind, .. }
            | PreviewEvent::Failed { kind, .. } => *kind,
        }
    }
}

/// Latest generation per (clip, kind). Only the latest job may deliver.
#[derive(Debug, Default)]
struct Generations {
    latest: Mutex<HashMap<(ClipId, JobKind), u64>>,
}

impl Generations {
    fn next(&self, key: (ClipId, JobKind)) -> u64 {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        *latest.entry(key).and_modify(|g| *g += 1).or_insert(0)
    }

    fn is_current(&self, key: (ClipId, JobKind), generation: u64) -> bool {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.get(&key) == Some(&generation)
    }

    /// Supersede every outstanding job of `clip_id`.
    fn retire(&self, clip_id: ClipId) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        for ((id, _), generation) in latest.iter_mut() {
            if *id == clip_id {
                *generation += 1;
            }
        }
    }
}

/// Runs preview jobs on at most `max_preview_jobs` workers.
#[derive(Debug, Clone)]
pub struct PreviewJobRunner {
    config: Arc<EditorConfig>,
    cache: Arc<ArtifactCache>,
    filters: FilterChainBuilder,
    semaphore: Arc<Semaphore>,
    generations: Arc<Generations>,
    active: Arc<AtomicUsize>,
    events: mpsc::UnboundedSender<PreviewEvent>,
}

impl PreviewJobRunner {
    /// Create a runner and the receiving end of its event channel.
    pub fn new(
        config: Arc<EditorConfig>,
        cache: Arc<ArtifactCache>,
    ) -> (Self, mpsc::UnboundedReceiver<PreviewEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let runner = Self {
            filters: FilterChainBuilder::new(&config.lut_dir),
            semaphore: Arc::new(Semaphore::new(config.max_preview_jobs.max(1))),
            config,
            cache,
            generations: Arc::new(Generations::default()),
            active: Arc::new(AtomicUsize::new(0)),
            events,
        };
        (runner, receiver)
    }

    pub fn cache(&self) -> &Arc<ArtifactCache> {
        &self.cache
    }

    /// Queue a job for a snapshot of `clip`.
    ///
    /// Any earlier job of the same kind for the same clip is superseded: if
    /// it has not started it is skipped, otherwise its result is dropped.
    pub fn submit(&self, kind: JobKind, clip: Clip) -> JoinHandle<()> {
        let generation = self.generations.next((clip.id(), kind));
        debug!(clip_id = %clip.id(), kind = %kind, generation, "Queued preview job");

        let runner = self.clone();
        tokio::spawn(async move { runner.run(kind, clip, generation).await })
    }

    /// Drop the results of every outstanding job for a clip that left the timeline.
    pub fn retire(&self, clip_id: ClipId) {
        self.generations.retire(clip_id);
    }

    /// Jobs currently holding a worker slot.
    pub fn active_jobs(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    async fn run(&self, kind: JobKind, clip: Clip, generation: u64) {
        let clip_id = clip.id();
        let key = (clip_id, kind);

        let permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                warn!(clip_id = %clip_id, kind = %kind, "Preview pool closed");
                return;
            }
        };
        let _permit = permit;

        if !self.generations.is_current(key, generation) {
            debug!(clip_id = %clip_id, kind = %kind, generation, "Skipping superseded preview job");
            record_superseded_result(kind.as_str());
            return;
        }

        self.send(PreviewEvent::Started { clip_id, kind });
        set_active_preview_jobs(self.active.fetch_add(1, Ordering::SeqCst) + 1);

        let logger = JobLogger::for_clip(&clip_id, kind.as_str());
        let started = Instant::now();
        let result = self
            .execute(kind, clip, generation)
            .instrument(logger.create_span())
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        set_active_preview_jobs(self.active.fetch_sub(1, Ordering::SeqCst).saturating_sub(1));

        if !self.generations.is_current(key, generation) {
            debug!(clip_id = %clip_id, kind = %kind, generation, "Dropping superseded preview result");
            record_superseded_result(kind.as_str());
            if let Ok(stale) = &result {
                if kind == JobKind::EffectPreview {
                    if let Some(path) = &stale.artifacts.effect_preview_path {
                        discard_stale_output(path).await;
                    }
                }
            }
            return;
        }

        match result {
            Ok(clip) => {
                record_preview_job(kind.as_str(), "done", elapsed);
                logger.log_completion(&format!("{:.2}s", elapsed));
                self.send(PreviewEvent::Done { kind, clip });
            }
            Err(message) => {
                record_preview_job(kind.as_str(), "failed", elapsed);
                logger.log_error(&message);
                self.send(PreviewEvent::Failed {
                    clip_id,
                    kind,
                    message,
                });
            }
        }
    }

    async fn execute(&self, kind: JobKind, clip: Clip, generation: u64) -> Result<Clip, String> {
        match kind {
            JobKind::Decorations => Ok(decorate(clip, &self.config, &self.cache).await),
            JobKind::EffectPreview => bake_effect_preview(clip, &self.config, &self.filters, generation)
                .await
                .map_err(|e| e.diagnostic()),
            JobKind::Proxy => Ok(attach_proxy(clip, &self.config, &self.cache).await),
        }
    }

    fn send(&self, event: PreviewEvent) {
        if self.events.send(event).is_err() {
            debug!("Preview event receiver dropped");
        }
    }
}

/// Delete a superseded job's output. Returns true if a file was removed.
async fn discard_stale_output(path: &Path) -> bool {
    match remove_file_if_exists(path).await {
        Ok(removed) => removed,
        Err(e) => {
            warn!(path = %path.display(), "Failed to remove superseded preview: {}", e);
            false
        }
    }
}
