//! Project export.
//!
//! [`RenderPipeline`] runs four strictly ordered stages over a clip list:
//!
//! 1. render every clip to `clip_<n>.mp4` with its filter chains
//! 2. assemble: stream-copy concat, or a pairwise transition fold when any
//!    clip asks for a crossfade
//! 3. optionally mix in background music
//! 4. move the result to the requested output path
//!
//! All intermediates live in a temp directory that is removed when the export
//! returns. Any stage failure aborts the export with a single
//! [`MediaError::ExportFailed`]; nothing is written to the output path unless
//! every stage succeeded.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use cutline_models::{Clip, EncodingConfig, MediaKind, RenderConfig, Transition};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::concat::write_manifest;
use crate::error::{MediaError, MediaResult};
use crate::filters::{concat_pair_graph, music_mix_graph, xfade_graph, FilterChainBuilder, FilterChains};
use crate::fs_utils::move_file;
use crate::metrics;
use crate::segment::{segment_command, SegmentWindow};

/// Pipeline stage, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    /// Per-clip render of the clip at this index
    RenderClip(usize),
    /// Stream-copy concatenation
    Concat,
    /// Transition fold step joining clip `n` and `n + 1`
    Transition(usize),
    /// Background music attenuation
    MusicPrepare,
    /// Background music mix
    MusicMix,
    /// Placing the result at the output path
    Finalize,
}

impl ExportStage {
    /// Stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ExportStage::RenderClip(_) => "render_clip",
            ExportStage::Concat => "concat",
            ExportStage::Transition(_) => "transition",
            ExportStage::MusicPrepare => "music_prepare",
            ExportStage::MusicMix => "music_mix",
            ExportStage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStage::RenderClip(i) => write!(f, "render of clip {}", i),
            ExportStage::Transition(i) => write!(f, "transition step {}", i),
            other => write!(f, "{}", other.label().replace('_', " ")),
        }
    }
}

/// How rendered clips were joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyMode {
    Concat,
    Transitions,
}

impl AssemblyMode {
    /// Transition assembly is only used when some clip crossfades.
    pub fn for_clips(clips: &[Clip]) -> Self {
        if clips.iter().any(|c| c.transition.is_crossfade()) {
            AssemblyMode::Transitions
        } else {
            AssemblyMode::Concat
        }
    }
}

/// Summary of a finished export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub output: PathBuf,
    pub clip_count: usize,
    pub assembly: AssemblyMode,
    pub music_mixed: bool,
    /// Non-fatal conditions, e.g. LUTs that were skipped
    pub warnings: Vec<String>,
    pub elapsed_secs: f64,
}

/// Renders a clip list into one output file.
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    config: RenderConfig,
    filters: FilterChainBuilder,
    work_root: Option<PathBuf>,
}

impl RenderPipeline {
    pub fn new(config: RenderConfig, filters: FilterChainBuilder) -> Self {
        Self {
            config,
            filters,
            work_root: None,
        }
    }

    /// Create the export's temp directory under `root` instead of the system default.
    pub fn with_work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Export `clips` in order to `output`, mixing `bg_music` underneath if given.
    pub async fn export(
        &self,
        clips: &[Clip],
        bg_music: Option<&Path>,
        output: &Path,
    ) -> MediaResult<ExportReport> {
        if clips.is_empty() {
            return Err(MediaError::NothingToExport);
        }
        check_renderable(clips)?;

        let started = Instant::now();
        let work_dir = self.create_work_dir()?;
        let work = work_dir.path();
        let assembly = AssemblyMode::for_clips(clips);
        let mut warnings = Vec::new();

        info!(
            clips = clips.len(),
            ?assembly,
            output = %output.display(),
            "Export started"
        );

        let rendered = self.render_clips(clips, work, &mut warnings).await?;

        let assembled = match assembly {
            AssemblyMode::Concat => self.concat_simple(&rendered, work).await?,
            AssemblyMode::Transitions => self.concat_with_transitions(clips, &rendered, work).await?,
        };

        let final_source = match bg_music {
            Some(music) => self.mix_music(&assembled, music, work).await?,
            None => assembled,
        };

        self.finalize(&final_source, output).await?;

        let elapsed_secs = started.elapsed().as_secs_f64();
        info!(output = %output.display(), elapsed_secs, "Export finished");

        Ok(ExportReport {
            output: output.to_path_buf(),
            clip_count: clips.len(),
            assembly,
            music_mixed: bg_music.is_some(),
            warnings,
            elapsed_secs,
        })
    }

    fn create_work_dir(&self) -> MediaResult<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cutline_export_");

        let dir = match &self.work_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn runner(&self, stage: ExportStage) -> FfmpegRunner {
        FfmpegRunner::new()
            .with_timeout(self.config.timeouts.render)
            .with_operation(stage.label())
    }

    /// Run one stage command, converting any failure into the export error.
    async fn run_stage(&self, stage: ExportStage, cmd: &FfmpegCommand) -> MediaResult<()> {
        let started = Instant::now();
        let result = self.runner(stage).run(cmd).await;
        metrics::record_export_stage(stage.label(), started.elapsed().as_secs_f64());

        result.map_err(|e| {
            warn!(%stage, "Export stage failed: {}", e);
            MediaError::export_failed(stage, e)
        })
    }

    async fn render_clips(
        &self,
        clips: &[Clip],
        work: &Path,
        warnings: &mut Vec<String>,
    ) -> MediaResult<Vec<PathBuf>> {
        let mut rendered = Vec::with_capacity(clips.len());

        for (index, clip) in clips.iter().enumerate() {
            let output = work.join(format!("clip_{}.mp4", index));
            let chains = self.filters.build(clip);
            warnings.extend(chains.warnings.iter().cloned());

            info!(index, clip_id = %clip.id(), "Rendering clip");
            let cmd = clip_render_command(clip, &chains, &self.config.encoding, &output);
            self.run_stage(ExportStage::RenderClip(index), &cmd).await?;
            rendered.push(output);
        }

        Ok(rendered)
    }

    async fn concat_simple(&self, rendered: &[PathBuf], work: &Path) -> MediaResult<PathBuf> {
        let manifest = work.join("concat_list.txt");
        let output = work.join("concatenated.mp4");

        write_manifest(&manifest, rendered)
            .await
            .map_err(|e| MediaError::export_failed(ExportStage::Concat, e))?;

        info!(clips = rendered.len(), "Concatenating clips");
        self.run_stage(ExportStage::Concat, &concat_command(&manifest, &output))
            .await?;
        Ok(output)
    }

    /// Fold rendered clips left to right, joining each pair according to the
    /// left clip's transition.
    async fn concat_with_transitions(
        &self,
        clips: &[Clip],
        rendered: &[PathBuf],
        work: &Path,
    ) -> MediaResult<PathBuf> {
        let mut current = rendered[0].clone();
        let mut accumulated = clips[0].effective_duration();

        for i in 1..rendered.len() {
            let step = i - 1;
            let output = work.join(format!("xfade_{}.mp4", step));
            let transition = clips[step].transition;
            let next_len = clips[i].effective_duration();

            info!(step, %transition, "Joining clips");
            let cmd = transition_step_command(
                &current,
                &rendered[i],
                transition,
                &self.config,
                accumulated,
                &output,
            );
            self.run_stage(ExportStage::Transition(step), &cmd).await?;

            accumulated = match transition.xfade_name() {
                Some(_) => xfade_offset(&self.config, accumulated) + next_len,
                None => accumulated + next_len,
            };
            current = output;
        }

        Ok(current)
    }

    async fn mix_music(&self, video: &Path, music: &Path, work: &Path) -> MediaResult<PathBuf> {
        if !music.exists() {
            return Err(MediaError::export_failed(
                ExportStage::MusicPrepare,
                MediaError::FileNotFound(music.to_path_buf()),
            ));
        }

        let attenuated = work.join("bg.aac");
        let mixed = work.join("mixed.mp4");

        info!(music = %music.display(), "Mixing background music");
        let prepare = music_prepare_command(music, self.config.music_volume, &self.config.encoding, &attenuated);
        self.run_stage(ExportStage::MusicPrepare, &prepare).await?;

        let mix = music_mix_command(video, &attenuated, &self.config, &mixed);
        self.run_stage(ExportStage::MusicMix, &mix).await?;

        Ok(mixed)
    }

    /// Move the result into place, re-muxing with a stream copy if the move fails.
    async fn finalize(&self, source: &Path, output: &Path) -> MediaResult<()> {
        match move_file(source, output).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(output = %output.display(), "Move failed, copying streams instead: {}", e);
                let cmd = FfmpegCommand::new(source, output).stream_copy();
                self.run_stage(ExportStage::Finalize, &cmd).await
            }
        }
    }
}

/// Every clip must carry a picture; audio-only and unknown media would
/// leave a segment without a video stream for assembly.
fn check_renderable(clips: &[Clip]) -> MediaResult<()> {
    for (index, clip) in clips.iter().enumerate() {
        let kind = clip.media().kind();
        if !matches!(kind, MediaKind::Video | MediaKind::Image) {
            return Err(MediaError::export_failed(
                ExportStage::RenderClip(index),
                MediaError::UnsupportedMedia {
                    path: clip.media().path().to_path_buf(),
                    kind,
                },
            ));
        }
    }
    Ok(())
}

/// Start of the xfade overlap inside the accumulated stream.
///
/// The configured offset is clamped so the overlap never runs past the end
/// of what has been assembled so far.
pub fn xfade_offset(config: &RenderConfig, accumulated_secs: f64) -> f64 {
    let latest = (accumulated_secs - config.crossfade_duration).max(0.0);
    config.transition_offset.clamp(0.0, latest)
}

/// Per-clip render: raw trim window as input options, speed via filters.
pub fn clip_render_command(
    clip: &Clip,
    chains: &FilterChains,
    encoding: &EncodingConfig,
    output: &Path,
) -> FfmpegCommand {
    let kind = clip.media().kind();
    let window = match (kind, clip.media().duration()) {
        (MediaKind::Image, _) => SegmentWindow::new(0.0, Some(clip.base_duration())),
        // Unprobed video: read exactly what the timeline shows for it
        (_, None) => SegmentWindow::new(clip.start(), Some(clip.base_duration())),
        _ => SegmentWindow::new(clip.start(), clip.trim_duration()),
    };

    segment_command(clip.media().path(), kind, window, chains, encoding, output)
}

/// Stream-copy concat of a manifest.
pub fn concat_command(manifest: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(manifest, output)
        .format("concat")
        .input_args(["-safe", "0"])
        .stream_copy()
}

/// One fold step joining the accumulated stream with the next clip.
///
/// A hard cut concatenates both video and audio; any other transition runs
/// `xfade` on the video streams only.
pub fn transition_step_command(
    current: &Path,
    next: &Path,
    transition: Transition,
    config: &RenderConfig,
    accumulated_secs: f64,
    output: &Path,
) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(current, output).input(next);

    let cmd = match transition.xfade_name() {
        None => cmd
            .filter_complex(concat_pair_graph())
            .map("[v]")
            .map("[a]"),
        Some(name) => cmd.filter_complex(xfade_graph(
            name,
            config.crossfade_duration,
            xfade_offset(config, accumulated_secs),
        )),
    };

    cmd.output_args(config.encoding.to_ffmpeg_args())
}

/// Re-encode the music track with its volume lowered.
pub fn music_prepare_command(
    music: &Path,
    volume: f64,
    encoding: &EncodingConfig,
    output: &Path,
) -> FfmpegCommand {
    FfmpegCommand::new(music, output)
        .output_arg("-filter:a")
        .output_arg(format!("volume={}", volume))
        .audio_codec(encoding.audio_codec.clone())
        .audio_bitrate(encoding.audio_bitrate.clone())
}

/// Mix the prepared music under the video's audio, copying the video stream.
pub fn music_mix_command(video: &Path, music: &Path, config: &RenderConfig, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(video, output)
        .input(music)
        .filter_complex(music_mix_graph(config.dropout_transition))
        .map("0:v")
        .map("[aout]")
        .video_codec("copy")
        .audio_codec(config.encoding.audio_codec.clone())
        .audio_bitrate(config.encoding.audio_bitrate.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_models::MediaAsset;
    use std::sync::Arc;

    fn clip(path: &str, duration: Option<f64>) -> Clip {
        Clip::new(Arc::new(MediaAsset::new(path, duration)))
    }

    fn arg_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        &args[args.iter().position(|a| a == flag).unwrap() + 1]
    }

    #[test]
    fn test_assembly_mode() {
        let mut clips = vec![clip("/m/a.mp4", Some(4.0)), clip("/m/b.mp4", Some(4.0))];
        clips[0].transition = Transition::WipeLeft;
        assert_eq!(AssemblyMode::for_clips(&clips), AssemblyMode::Concat);

        clips[1].transition = "fade".parse().unwrap();
        assert_eq!(AssemblyMode::for_clips(&clips), AssemblyMode::Transitions);
    }

    #[test]
    fn test_clip_render_uses_raw_window() {
        let mut c = clip("/m/a.mp4", Some(20.0));
        c.set_trim(4.0, Some(10.0)).unwrap();
        c.set_speed(2.0);

        let chains = FilterChainBuilder::new("/luts").build(&c);
        let args = clip_render_command(&c, &chains, &EncodingConfig::for_export(), Path::new("/w/clip_0.mp4"))
            .build_args();

        assert_eq!(arg_after(&args, "-ss"), "4.000");
        assert_eq!(arg_after(&args, "-t"), "6.000");
        assert_eq!(arg_after(&args, "-vf"), "setpts=PTS/2");
        assert_eq!(arg_after(&args, "-af"), "atempo=2.000000");
        assert_eq!(arg_after(&args, "-preset"), "fast");
        assert_eq!(arg_after(&args, "-b:a"), "192k");
    }

    #[test]
    fn test_image_render_uses_still_duration() {
        let still = clip("/m/title.png", None);
        let args = clip_render_command(
            &still,
            &FilterChains::default(),
            &EncodingConfig::for_export(),
            Path::new("/w/clip_1.mp4"),
        )
        .build_args();
        assert_eq!(arg_after(&args, "-t"), "5.000");
        assert!(args.contains(&"-loop".to_string()));
    }

    #[test]
    fn test_unprobed_video_render_matches_timeline() {
        let broken = clip("/m/broken.mp4", None);
        let args = clip_render_command(
            &broken,
            &FilterChains::default(),
            &EncodingConfig::for_export(),
            Path::new("/w/clip_0.mp4"),
        )
        .build_args();

        assert_eq!(broken.effective_duration(), 5.0);
        assert_eq!(arg_after(&args, "-t"), "5.000");
        assert!(!args.contains(&"-loop".to_string()));
    }

    #[tokio::test]
    async fn test_audio_only_clip_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let clips = vec![clip("/m/a.mp4", Some(3.0)), clip("/m/song.mp3", Some(30.0))];
        let pipeline = RenderPipeline::new(RenderConfig::default(), FilterChainBuilder::new("/luts"))
            .with_work_root(dir.path().join("work"));

        let result = pipeline.export(&clips, None, &dir.path().join("out.mp4")).await;
        match result {
            Err(MediaError::ExportFailed { stage, diagnostic }) => {
                assert_eq!(stage, ExportStage::RenderClip(1));
                assert!(diagnostic.contains("song.mp3"));
                assert!(diagnostic.contains("audio"));
            }
            other => panic!("expected ExportFailed, got {:?}", other),
        }
        assert!(!dir.path().join("work").exists());
    }

    #[test]
    fn test_xfade_offset_is_clamped() {
        let config = RenderConfig::default();
        assert_eq!(xfade_offset(&config, 5.0), config.transition_offset);

        // Short accumulated stream: overlap has to start earlier
        let short = config.crossfade_duration + 0.4;
        assert!((xfade_offset(&config, short) - 0.4).abs() < 1e-9);
        assert_eq!(xfade_offset(&config, 0.5), 0.0);

        let args = transition_step_command(
            Path::new("clip_0.mp4"),
            Path::new("clip_1.mp4"),
            Transition::Crossfade,
            &config,
            0.5,
            Path::new("xfade_0.mp4"),
        )
        .build_args();
        assert!(arg_after(&args, "-filter_complex").ends_with("offset=0,format=yuv420p"));
    }

    #[test]
    fn test_concat_command() {
        let args = concat_command(Path::new("/w/concat_list.txt"), Path::new("/w/concatenated.mp4")).build_args();
        let tail: Vec<&str> = args[5..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec!["-f", "concat", "-safe", "0", "-i", "/w/concat_list.txt", "-c", "copy", "/w/concatenated.mp4"]
        );
    }

    #[test]
    fn test_transition_step_commands() {
        let config = RenderConfig::default();

        let cut = transition_step_command(
            Path::new("clip_0.mp4"),
            Path::new("clip_1.mp4"),
            Transition::None,
            &config,
            5.0,
            Path::new("xfade_0.mp4"),
        )
        .build_args();
        assert_eq!(arg_after(&cut, "-filter_complex"), "[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[v][a]");
        assert!(cut.contains(&"[a]".to_string()));

        let fade = transition_step_command(
            Path::new("xfade_0.mp4"),
            Path::new("clip_2.mp4"),
            Transition::Crossfade,
            &config,
            5.0,
            Path::new("xfade_1.mp4"),
        )
        .build_args();
        assert_eq!(
            arg_after(&fade, "-filter_complex"),
            "[0:v][1:v]xfade=transition=fade:duration=1:offset=1,format=yuv420p"
        );
        assert!(!fade.contains(&"-map".to_string()));
    }

    #[test]
    fn test_music_commands() {
        let config = RenderConfig::default();

        let prepare = music_prepare_command(Path::new("song.mp3"), 0.6, &config.encoding, Path::new("bg.aac"))
            .build_args();
        assert_eq!(arg_after(&prepare, "-filter:a"), "volume=0.6");

        let mix = music_mix_command(Path::new("video.mp4"), Path::new("bg.aac"), &config, Path::new("mixed.mp4"))
            .build_args();
        assert_eq!(arg_after(&mix, "-c:v"), "copy");
        assert!(arg_after(&mix, "-filter_complex").contains("dropout_transition=2[aout]"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ExportStage::RenderClip(2).to_string(), "render of clip 2");
        assert_eq!(ExportStage::MusicMix.to_string(), "music mix");
    }

    #[tokio::test]
    async fn test_empty_timeline_is_rejected() {
        let pipeline = RenderPipeline::new(RenderConfig::default(), FilterChainBuilder::new("/luts"));
        let dir = tempfile::tempdir().unwrap();
        let result = pipeline.export(&[], None, &dir.path().join("out.mp4")).await;
        assert!(matches!(result, Err(MediaError::NothingToExport)));
    }

    #[tokio::test]
    async fn test_failed_render_promotes_nothing() {
        if crate::command::check_ffmpeg().is_err() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        let clips = vec![clip(dir.path().join("missing.mp4").to_str().unwrap(), Some(3.0))];

        let pipeline = RenderPipeline::new(RenderConfig::default(), FilterChainBuilder::new(dir.path()))
            .with_work_root(dir.path().join("work"));
        let result = pipeline.export(&clips, None, &output).await;

        match result {
            Err(MediaError::ExportFailed { stage, diagnostic }) => {
                assert_eq!(stage, ExportStage::RenderClip(0));
                assert!(diagnostic.contains("missing.mp4"));
            }
            other => panic!("expected ExportFailed, got {:?}", other),
        }
        assert!(!output.exists());
    }
}
