//! The editing session: library, timeline, background jobs and export.
//!
//! Every user action is an [`EditCommand`] applied through
//! [`EditSession::apply`]. Preview results arrive as [`PreviewEvent`]s and
//! are merged back into the live timeline by [`EditSession::handle_event`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use cutline_media::fs_utils::remove_file_if_exists;
use cutline_media::{ExportReport, FilterChainBuilder, RenderPipeline};
use cutline_models::{
    Clip, ClipId, ClipRecord, EditError, MediaAsset, ProjectFile, Timeline, Transition, LUT_NONE,
};

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::library::MediaLibrary;
use crate::logging::JobLogger;
use crate::luts::list_luts;
use crate::metrics::record_export;
use crate::preview::{ArtifactCache, JobKind, PreviewEvent, PreviewJobRunner};
use crate::project::{read_project, write_project};

/// A user action.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    // Library
    ImportMedia { path: PathBuf },

    // Timeline structure
    AddToTimeline { media: PathBuf, track: u32 },
    Remove { clip: ClipId },
    Duplicate { clip: ClipId },
    Move { clip: ClipId, to_index: usize },
    /// Split whichever clip plays at this timeline position.
    SplitAt { seconds: f64 },

    // Clip parameters
    Trim { clip: ClipId, start: f64, end: Option<f64> },
    SetTitle {
        clip: ClipId,
        text: String,
        size: Option<u32>,
        position: Option<String>,
    },
    /// LUT file name inside the LUT directory, or `"none"`.
    SetLut { clip: ClipId, lut: String },
    /// Transition name, e.g. `"crossfade"`.
    SetTransition { clip: ClipId, transition: String },
    SetSpeed { clip: ClipId, speed: f64 },

    // Project
    SetBackgroundMusic { path: Option<PathBuf> },
    ClearProxy { clip: ClipId },
    RegenerateProxy { clip: ClipId },
}

/// What applying a command did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Applied,
    /// A new clip was placed on the timeline.
    Added(ClipId),
    Split { left: ClipId, right: ClipId },
    /// Valid command that changed nothing, e.g. a split at a clip edge.
    Unchanged,
    /// Applied with an adjustment the user should hear about.
    Warning(String),
}

/// Counts from loading a project file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub media_imported: usize,
    pub clips_loaded: usize,
    pub clips_dropped: usize,
}

pub struct EditSession {
    config: Arc<EditorConfig>,
    library: MediaLibrary,
    timeline: Timeline,
    bg_music: Option<PathBuf>,
    runner: PreviewJobRunner,
    events: mpsc::UnboundedReceiver<PreviewEvent>,
    in_flight: Vec<JoinHandle<()>>,
    export_guard: Arc<Mutex<()>>,
}

impl EditSession {
    pub fn new(config: EditorConfig) -> Self {
        let config = Arc::new(config);
        let (runner, events) = PreviewJobRunner::new(config.clone(), Arc::new(ArtifactCache::new()));
        Self {
            config,
            library: MediaLibrary::new(),
            timeline: Timeline::new(),
            bg_music: None,
            runner,
            events,
            in_flight: Vec::new(),
            export_guard: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn library(&self) -> &MediaLibrary {
        &self.library
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn clip(&self, id: ClipId) -> Option<&Clip> {
        self.timeline.get(id)
    }

    pub fn bg_music(&self) -> Option<&Path> {
        self.bg_music.as_deref()
    }

    pub fn cache(&self) -> &Arc<ArtifactCache> {
        self.runner.cache()
    }

    /// LUT names available to [`EditCommand::SetLut`].
    pub async fn list_luts(&self) -> Vec<String> {
        list_luts(&self.config.lut_dir).await
    }

    pub async fn import_media(&mut self, path: impl AsRef<Path>) -> EditorResult<Arc<MediaAsset>> {
        self.library
            .import(path, self.config.render.timeouts.probe)
            .await
    }

    /// Apply one user action.
    ///
    /// Rejected numeric input leaves the clip exactly as it was.
    pub async fn apply(&mut self, command: EditCommand) -> EditorResult<CommandOutcome> {
        debug!(?command, "Applying edit");
        match command {
            EditCommand::ImportMedia { path } => {
                self.import_media(&path).await?;
                Ok(CommandOutcome::Applied)
            }

            EditCommand::AddToTimeline { media, track } => {
                let asset = self.import_media(&media).await?;
                let mut clip = Clip::new(asset);
                clip.track = track;
                let id = self.timeline.push(clip.clone());
                self.submit(JobKind::Decorations, clip);
                Ok(CommandOutcome::Added(id))
            }

            EditCommand::Remove { clip } => {
                self.timeline
                    .remove(clip)
                    .ok_or(EditorError::ClipNotFound(clip))?;
                self.runner.retire(clip);
                Ok(CommandOutcome::Applied)
            }

            EditCommand::Duplicate { clip } => {
                let copy = self
                    .timeline
                    .duplicate(clip)
                    .ok_or(EditorError::ClipNotFound(clip))?;
                if let Some(new_clip) = self.timeline.get(copy).cloned() {
                    self.submit(JobKind::Decorations, new_clip);
                }
                Ok(CommandOutcome::Added(copy))
            }

            EditCommand::Move { clip, to_index } => {
                let from = self
                    .timeline
                    .index_of(clip)
                    .ok_or(EditorError::ClipNotFound(clip))?;
                self.timeline.move_clip(clip, to_index);
                if self.timeline.index_of(clip) == Some(from) {
                    Ok(CommandOutcome::Unchanged)
                } else {
                    Ok(CommandOutcome::Applied)
                }
            }

            EditCommand::SplitAt { seconds } => {
                let original = self.timeline.locate(seconds).map(|(c, _)| c.id());
                let Some((left, right)) = self.timeline.split_at(seconds) else {
                    return Ok(CommandOutcome::Unchanged);
                };
                if let Some(original) = original {
                    self.runner.retire(original);
                }
                for id in [left, right] {
                    if let Some(half) = self.timeline.get(id).cloned() {
                        self.submit(JobKind::Decorations, half);
                    }
                }
                Ok(CommandOutcome::Split { left, right })
            }

            EditCommand::Trim { clip, start, end } => {
                self.clip_mut(clip)?.set_trim(start, end)?;
                self.refresh_effect_preview(clip);
                Ok(CommandOutcome::Applied)
            }

            EditCommand::SetTitle {
                clip,
                text,
                size,
                position,
            } => {
                if size == Some(0) {
                    return Err(EditError::InvalidTitleSize(0).into());
                }
                let target = self.clip_mut(clip)?;
                target.title = text;
                if let Some(size) = size {
                    target.title_size = size;
                }
                if let Some(position) = position.filter(|p| !p.trim().is_empty()) {
                    target.title_position = position;
                }
                self.refresh_effect_preview(clip);
                Ok(CommandOutcome::Applied)
            }

            EditCommand::SetLut { clip, lut } => {
                let lut_dir = self.config.lut_dir.clone();
                let target = self.clip_mut(clip)?;
                let requested = lut.trim();

                let outcome = if requested.is_empty() || requested.eq_ignore_ascii_case(LUT_NONE) {
                    target.set_lut_name(LUT_NONE);
                    CommandOutcome::Applied
                } else if lut_dir.join(requested).is_file() {
                    target.set_lut_name(requested);
                    CommandOutcome::Applied
                } else {
                    target.set_lut_name(LUT_NONE);
                    let message = format!(
                        "Cannot find LUT file {}, using none",
                        lut_dir.join(requested).display()
                    );
                    warn!(clip_id = %clip, "{}", message);
                    CommandOutcome::Warning(message)
                };

                self.refresh_effect_preview(clip);
                Ok(outcome)
            }

            EditCommand::SetTransition { clip, transition } => {
                let parsed: Transition = transition.parse().map_err(EditError::from)?;
                self.clip_mut(clip)?.transition = parsed;
                Ok(CommandOutcome::Applied)
            }

            EditCommand::SetSpeed { clip, speed } => {
                let applied = self.clip_mut(clip)?.set_speed(speed);
                self.refresh_effect_preview(clip);
                if applied == speed {
                    Ok(CommandOutcome::Applied)
                } else {
                    Ok(CommandOutcome::Warning(format!(
                        "Invalid speed {}, using {}",
                        speed, applied
                    )))
                }
            }

            EditCommand::SetBackgroundMusic { path } => {
                if let Some(path) = &path {
                    if !path.exists() {
                        return Err(EditorError::MediaNotFound(path.clone()));
                    }
                }
                self.bg_music = path;
                Ok(CommandOutcome::Applied)
            }

            EditCommand::ClearProxy { clip } => {
                if self.clear_proxy(clip).await? {
                    Ok(CommandOutcome::Applied)
                } else {
                    Ok(CommandOutcome::Unchanged)
                }
            }

            EditCommand::RegenerateProxy { clip } => {
                self.clear_proxy(clip).await?;
                if let Some(target) = self.timeline.get(clip).cloned() {
                    self.submit(JobKind::Proxy, target);
                }
                Ok(CommandOutcome::Applied)
            }
        }
    }

    /// Merge a preview result into the live timeline.
    ///
    /// Returns true if any clip changed. Results for clips that are no
    /// longer on the timeline are ignored.
    pub fn handle_event(&mut self, event: &PreviewEvent) -> bool {
        match event {
            PreviewEvent::Started { clip_id, kind } => {
                debug!(clip_id = %clip_id, kind = %kind, "Preview job started");
                false
            }
            PreviewEvent::Failed {
                clip_id,
                kind,
                message,
            } => {
                warn!(clip_id = %clip_id, kind = %kind, "Preview failed: {}", message);
                false
            }
            PreviewEvent::Done { kind, clip: result } => {
                let proxy = result.artifacts.proxy_path.clone();
                let mut changed = false;

                if let Some(live) = self.timeline.get_mut(result.id()) {
                    let artifacts = &result.artifacts;
                    if live.artifacts.preview_dir.is_none() {
                        live.artifacts.preview_dir = artifacts.preview_dir.clone();
                    }
                    match kind {
                        JobKind::Decorations => {
                            live.artifacts.thumbnail_paths = artifacts.thumbnail_paths.clone();
                            live.artifacts.waveform_path = artifacts.waveform_path.clone();
                        }
                        JobKind::EffectPreview => {
                            live.artifacts.effect_preview_path = artifacts.effect_preview_path.clone();
                        }
                        JobKind::Proxy => {}
                    }
                    changed = true;
                } else {
                    debug!(clip_id = %result.id(), kind = %kind, "Ignoring result for removed clip");
                }

                // Proxies belong to the asset, so every clip of it gets one
                if let Some(proxy) = proxy {
                    let asset = result.media().path();
                    for clip in self.timeline.clips_mut() {
                        if clip.media().path() == asset && clip.artifacts.proxy_path.as_ref() != Some(&proxy) {
                            clip.artifacts.proxy_path = Some(proxy.clone());
                            changed = true;
                        }
                    }
                }
                changed
            }
        }
    }

    /// Wait for the next preview event, apply it and hand it to the caller.
    pub async fn next_event(&mut self) -> Option<PreviewEvent> {
        let event = self.events.recv().await?;
        self.handle_event(&event);
        Some(event)
    }

    /// Apply every event already delivered, without waiting.
    pub fn drain_events(&mut self) -> Vec<PreviewEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(&event);
            drained.push(event);
        }
        drained
    }

    /// Wait for every submitted preview job, then apply their events.
    pub async fn wait_for_jobs(&mut self) -> Vec<PreviewEvent> {
        let handles = std::mem::take(&mut self.in_flight);
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("Preview job panicked: {}", e);
            }
        }
        self.drain_events()
    }

    /// Snapshot the project for an export that runs independently of further edits.
    pub fn prepare_export(&self, output: impl Into<PathBuf>) -> EditorResult<ExportJob> {
        if self.timeline.is_empty() {
            return Err(EditorError::EmptyTimeline);
        }

        let pipeline = RenderPipeline::new(
            self.config.render.clone(),
            FilterChainBuilder::new(&self.config.lut_dir),
        )
        .with_work_root(self.config.export_work_dir());

        Ok(ExportJob {
            clips: self.timeline.clips().to_vec(),
            bg_music: self.bg_music.clone(),
            output: output.into(),
            pipeline,
            guard: self.export_guard.clone(),
        })
    }

    /// Export the timeline to `output`.
    pub async fn export(&self, output: impl Into<PathBuf>) -> EditorResult<ExportReport> {
        self.prepare_export(output)?.run().await
    }

    pub fn to_project_file(&self) -> ProjectFile {
        ProjectFile {
            media: self.library.paths(),
            timeline: self.timeline.clips().iter().map(ClipRecord::from_clip).collect(),
            bg_music: self.bg_music.clone(),
        }
    }

    pub async fn save_project(&self, path: impl AsRef<Path>) -> EditorResult<()> {
        let path = path.as_ref();
        write_project(path, &self.to_project_file()).await?;
        info!(path = %path.display(), clips = self.timeline.len(), "Project saved");
        Ok(())
    }

    /// Replace the session's contents with a saved project.
    ///
    /// Clips whose media no longer exists are dropped.
    pub async fn load_project(&mut self, path: impl AsRef<Path>) -> EditorResult<LoadReport> {
        let path = path.as_ref();
        let project = read_project(path).await?;

        for clip in self.timeline.clips() {
            self.runner.retire(clip.id());
        }
        self.timeline = Timeline::new();
        self.library.clear();

        let mut report = LoadReport::default();
        for media in &project.media {
            match self.import_media(media).await {
                Ok(_) => report.media_imported += 1,
                Err(e) => warn!(asset = %media.display(), "Skipping project media: {}", e),
            }
        }

        for record in &project.timeline {
            let asset = match self.library.get(&record.media_path) {
                Some(asset) => asset,
                None => match self.import_media(&record.media_path).await {
                    Ok(asset) => asset,
                    Err(e) => {
                        warn!(asset = %record.media_path.display(), "Dropping clip: {}", e);
                        report.clips_dropped += 1;
                        continue;
                    }
                },
            };
            let clip = record.to_clip(asset);
            self.timeline.push(clip.clone());
            self.submit(JobKind::Decorations, clip);
            report.clips_loaded += 1;
        }

        self.bg_music = match project.bg_music {
            Some(music) if music.exists() => Some(music),
            Some(music) => {
                warn!(path = %music.display(), "Background music missing, clearing it");
                None
            }
            None => None,
        };

        info!(
            path = %path.display(),
            clips = report.clips_loaded,
            dropped = report.clips_dropped,
            "Project loaded"
        );
        Ok(report)
    }

    fn clip_mut(&mut self, id: ClipId) -> EditorResult<&mut Clip> {
        self.timeline.get_mut(id).ok_or(EditorError::ClipNotFound(id))
    }

    fn submit(&mut self, kind: JobKind, clip: Clip) {
        if !self.config.previews_enabled {
            return;
        }
        self.in_flight.retain(|handle| !handle.is_finished());
        self.in_flight.push(self.runner.submit(kind, clip));
    }

    /// Drop the stale baked preview and queue a new one.
    fn refresh_effect_preview(&mut self, id: ClipId) {
        let enabled = self.config.effect_preview_enabled;
        let Some(clip) = self.timeline.get_mut(id) else {
            return;
        };
        clip.invalidate_effect_preview();
        // Thumbnails and waveform keep showing the previous trim window
        if enabled {
            let snapshot = clip.clone();
            self.submit(JobKind::EffectPreview, snapshot);
        }
    }

    /// Delete the proxy of the clip's asset. Returns false if it had none.
    async fn clear_proxy(&mut self, id: ClipId) -> EditorResult<bool> {
        let clip = self.timeline.get(id).ok_or(EditorError::ClipNotFound(id))?;
        let asset = clip.media().path().to_path_buf();

        let mut stale: Vec<PathBuf> = self.cache().remove_proxy(&asset).await.into_iter().collect();
        for clip in self.timeline.clips_mut() {
            if clip.media().path() == asset {
                if let Some(proxy) = clip.artifacts.proxy_path.take() {
                    if !stale.contains(&proxy) {
                        stale.push(proxy);
                    }
                }
            }
        }

        let mut removed = false;
        for proxy in &stale {
            removed |= remove_file_if_exists(proxy).await?;
        }
        if !stale.is_empty() {
            info!(asset = %asset.display(), "Proxy cleared");
        }
        Ok(removed || !stale.is_empty())
    }
}

/// A snapshot of the timeline waiting to be exported.
///
/// Only one export per session runs at a time; a second one fails fast
/// with [`EditorError::ExportInProgress`].
pub struct ExportJob {
    clips: Vec<Clip>,
    bg_music: Option<PathBuf>,
    output: PathBuf,
    pipeline: RenderPipeline,
    guard: Arc<Mutex<()>>,
}

impl ExportJob {
    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub async fn run(self) -> EditorResult<ExportReport> {
        let _exclusive = self
            .guard
            .clone()
            .try_lock_owned()
            .map_err(|_| EditorError::ExportInProgress)?;

        let logger = JobLogger::for_project("export");
        logger.log_start(&format!(
            "{} clips to {}",
            self.clips.len(),
            self.output.display()
        ));

        let started = Instant::now();
        let result = self
            .pipeline
            .export(&self.clips, self.bg_music.as_deref(), &self.output)
            .await;
        let elapsed = started.elapsed().as_secs_f64();
        record_export(result.is_ok(), elapsed);

        match result {
            Ok(report) => {
                for warning in &report.warnings {
                    logger.log_warning(warning);
                }
                logger.log_completion(&format!("{:.1}s", elapsed));
                Ok(report)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_in(dir: &Path) -> EditSession {
        EditSession::new(EditorConfig {
            temp_root: dir.join("tmp"),
            lut_dir: dir.join("luts"),
            effect_preview_enabled: false,
            ..Default::default()
        })
    }

    /// A timeline of still images, which need no probing.
    async fn with_images(session: &mut EditSession, dir: &Path, count: usize) -> Vec<ClipId> {
        let mut ids = Vec::new();
        for i in 0..count {
            let path = dir.join(format!("still_{}.png", i));
            std::fs::write(&path, b"png").unwrap();
            match session
                .apply(EditCommand::AddToTimeline { media: path, track: 0 })
                .await
                .unwrap()
            {
                CommandOutcome::Added(id) => ids.push(id),
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        ids
    }

    #[tokio::test]
    async fn test_add_duplicate_move_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let ids = with_images(&mut session, dir.path(), 2).await;
        assert_eq!(session.library().len(), 2);

        let copy = match session.apply(EditCommand::Duplicate { clip: ids[0] }).await.unwrap() {
            CommandOutcome::Added(copy) => copy,
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(session.timeline().index_of(copy), Some(1));

        let moved = session
            .apply(EditCommand::Move { clip: copy, to_index: 10 })
            .await
            .unwrap();
        assert_eq!(moved, CommandOutcome::Applied);
        assert_eq!(session.timeline().index_of(copy), Some(2));

        session.apply(EditCommand::Remove { clip: ids[0] }).await.unwrap();
        assert_eq!(session.timeline().len(), 2);
        assert!(matches!(
            session.apply(EditCommand::Remove { clip: ids[0] }).await,
            Err(EditorError::ClipNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_trim_keeps_previous_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let asset = session.library.insert(MediaAsset::new(dir.path().join("a.mp4"), Some(10.0)));
        let id = session.timeline.push(Clip::new(asset));

        session
            .apply(EditCommand::Trim { clip: id, start: 2.0, end: Some(6.0) })
            .await
            .unwrap();

        let err = session
            .apply(EditCommand::Trim { clip: id, start: f64::NAN, end: None })
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Edit(_)));

        let clip = session.clip(id).unwrap();
        assert_eq!((clip.start(), clip.end()), (2.0, Some(6.0)));
    }

    #[tokio::test]
    async fn test_speed_and_transition() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let ids = with_images(&mut session, dir.path(), 1).await;

        let outcome = session
            .apply(EditCommand::SetSpeed { clip: ids[0], speed: -3.0 })
            .await
            .unwrap();
        assert!(matches!(outcome, CommandOutcome::Warning(_)));
        assert_eq!(session.clip(ids[0]).unwrap().speed(), 1.0);

        session
            .apply(EditCommand::SetTransition { clip: ids[0], transition: "crossfade".into() })
            .await
            .unwrap();
        assert!(session.clip(ids[0]).unwrap().transition.is_crossfade());

        let err = session
            .apply(EditCommand::SetTransition { clip: ids[0], transition: "spin".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Edit(EditError::Transition(_))));
        assert!(session.clip(ids[0]).unwrap().transition.is_crossfade());
    }

    #[tokio::test]
    async fn test_missing_lut_resets_to_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("luts")).unwrap();
        std::fs::write(dir.path().join("luts").join("warm.cube"), b"").unwrap();

        let mut session = session_in(dir.path());
        let ids = with_images(&mut session, dir.path(), 1).await;
        assert_eq!(session.list_luts().await, vec!["warm.cube"]);

        let ok = session
            .apply(EditCommand::SetLut { clip: ids[0], lut: "warm.cube".into() })
            .await
            .unwrap();
        assert_eq!(ok, CommandOutcome::Applied);
        assert_eq!(session.clip(ids[0]).unwrap().lut_name(), "warm.cube");

        let missing = session
            .apply(EditCommand::SetLut { clip: ids[0], lut: "gone.cube".into() })
            .await
            .unwrap();
        assert!(matches!(missing, CommandOutcome::Warning(_)));
        assert_eq!(session.clip(ids[0]).unwrap().lut_name(), "none");
    }

    #[tokio::test]
    async fn test_title_size_must_be_positive() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let ids = with_images(&mut session, dir.path(), 1).await;

        let err = session
            .apply(EditCommand::SetTitle {
                clip: ids[0],
                text: "Hello".into(),
                size: Some(0),
                position: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Edit(EditError::InvalidTitleSize(0))));
        assert_eq!(session.clip(ids[0]).unwrap().title, "");

        session
            .apply(EditCommand::SetTitle {
                clip: ids[0],
                text: "Hello".into(),
                size: Some(48),
                position: Some("  ".into()),
            })
            .await
            .unwrap();
        let clip = session.clip(ids[0]).unwrap();
        assert_eq!((clip.title.as_str(), clip.title_size), ("Hello", 48));
        assert_eq!(clip.title_position, cutline_models::DEFAULT_TITLE_POSITION);
    }

    #[tokio::test]
    async fn test_split_replaces_clip() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let asset = session.library.insert(MediaAsset::new(dir.path().join("a.mp4"), Some(10.0)));
        let id = session.timeline.push(Clip::new(asset));

        let edge = session.apply(EditCommand::SplitAt { seconds: 0.01 }).await.unwrap();
        assert_eq!(edge, CommandOutcome::Unchanged);

        let (left, right) = match session.apply(EditCommand::SplitAt { seconds: 4.0 }).await.unwrap() {
            CommandOutcome::Split { left, right } => (left, right),
            other => panic!("unexpected outcome {:?}", other),
        };
        assert!(session.clip(id).is_none());
        assert_eq!(session.clip(left).unwrap().end(), Some(4.0));
        assert_eq!(session.clip(right).unwrap().start(), 4.0);
    }

    #[tokio::test]
    async fn test_result_for_removed_clip_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let ids = with_images(&mut session, dir.path(), 1).await;

        let mut snapshot = session.clip(ids[0]).unwrap().clone();
        session.apply(EditCommand::Remove { clip: ids[0] }).await.unwrap();

        snapshot.artifacts.thumbnail_paths = vec![dir.path().join("thumb_00.jpg")];
        let event = PreviewEvent::Done {
            kind: JobKind::Decorations,
            clip: snapshot,
        };
        assert!(!session.handle_event(&event));
        assert!(session.timeline().is_empty());
    }

    #[tokio::test]
    async fn test_proxy_result_reaches_every_clip_of_asset() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let asset = session.library.insert(MediaAsset::new(dir.path().join("a.mp4"), Some(10.0)));
        let first = session.timeline.push(Clip::new(asset.clone()));
        let second = session.timeline.push(Clip::new(asset));

        let mut result = session.clip(first).unwrap().clone();
        result.artifacts.proxy_path = Some(dir.path().join("a_proxy_640w.mp4"));
        assert!(session.handle_event(&PreviewEvent::Done { kind: JobKind::Proxy, clip: result }));

        for id in [first, second] {
            assert_eq!(
                session.clip(id).unwrap().artifacts.proxy_path,
                Some(dir.path().join("a_proxy_640w.mp4"))
            );
        }
    }

    #[tokio::test]
    async fn test_clear_proxy_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let asset = session.library.insert(MediaAsset::new(dir.path().join("a.mp4"), Some(10.0)));
        let id = session.timeline.push(Clip::new(asset.clone()));

        let proxy = dir.path().join("a_proxy_640w.mp4");
        std::fs::write(&proxy, b"proxy").unwrap();
        session.cache().put_proxy(asset.path(), proxy.clone()).await;
        session.timeline.get_mut(id).unwrap().artifacts.proxy_path = Some(proxy.clone());

        let outcome = session.apply(EditCommand::ClearProxy { clip: id }).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Applied);
        assert!(!proxy.exists());
        assert_eq!(session.clip(id).unwrap().artifacts.proxy_path, None);

        let again = session.apply(EditCommand::ClearProxy { clip: id }).await.unwrap();
        assert_eq!(again, CommandOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_export_requires_clips_and_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        assert!(matches!(
            session.prepare_export(dir.path().join("out.mp4")),
            Err(EditorError::EmptyTimeline)
        ));

        with_images(&mut session, dir.path(), 1).await;
        let held = session.export_guard.clone().try_lock_owned().unwrap();
        let err = session.export(dir.path().join("out.mp4")).await.unwrap_err();
        assert!(matches!(err, EditorError::ExportInProgress));
        drop(held);
    }

    #[tokio::test]
    async fn test_background_music_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        let err = session
            .apply(EditCommand::SetBackgroundMusic { path: Some(dir.path().join("song.mp3")) })
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::MediaNotFound(_)));

        let song = dir.path().join("song.mp3");
        std::fs::write(&song, b"mp3").unwrap();
        session
            .apply(EditCommand::SetBackgroundMusic { path: Some(song.clone()) })
            .await
            .unwrap();
        assert_eq!(session.bg_music(), Some(song.as_path()));

        session
            .apply(EditCommand::SetBackgroundMusic { path: None })
            .await
            .unwrap();
        assert_eq!(session.bg_music(), None);
    }
}
