//! Background preview jobs and export against the real FFmpeg binaries.
//!
//! Each test returns early when ffmpeg/ffprobe are not on PATH.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cutline_editor::{CommandOutcome, EditCommand, EditSession, EditorConfig, JobKind, PreviewEvent};
use cutline_media::{check_ffmpeg, check_ffprobe, probe_duration_strict, FfmpegCommand, FfmpegRunner};
use cutline_models::{ClipId, EncodingConfig};

fn tools_available() -> bool {
    check_ffmpeg().is_ok() && check_ffprobe().is_ok()
}

async fn make_source(dir: &Path, seconds: f64) -> PathBuf {
    let output = dir.join("source.mp4");
    let cmd = FfmpegCommand::new(
        format!("testsrc=size=320x240:rate=25:duration={}", seconds),
        &output,
    )
    .format("lavfi")
    .input(format!("sine=frequency=440:sample_rate=44100:duration={}", seconds))
    .format("lavfi")
    .output_args(EncodingConfig::for_proxy().to_ffmpeg_args())
    .output_args(["-pix_fmt", "yuv420p"]);

    FfmpegRunner::new().with_timeout(60).run(&cmd).await.unwrap();
    output
}

fn session_in(dir: &Path, effect_previews: bool) -> EditSession {
    EditSession::new(EditorConfig {
        temp_root: dir.join("tmp"),
        lut_dir: dir.join("luts"),
        thumbnail_count: 3,
        effect_preview_enabled: effect_previews,
        ..Default::default()
    })
}

async fn add(session: &mut EditSession, media: &Path) -> ClipId {
    match session
        .apply(EditCommand::AddToTimeline {
            media: media.to_path_buf(),
            track: 0,
        })
        .await
        .unwrap()
    {
        CommandOutcome::Added(id) => id,
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_decorations_are_generated_and_shared() {
    if !tools_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let source = make_source(dir.path(), 2.0).await;
    let mut session = session_in(dir.path(), false);

    let first = add(&mut session, &source).await;
    let events = session.wait_for_jobs().await;
    assert!(events
        .iter()
        .any(|e| matches!(e, PreviewEvent::Done { kind: JobKind::Decorations, .. })));

    let decorated = session.clip(first).unwrap();
    assert_eq!(decorated.artifacts.thumbnail_paths.len(), 3);
    assert!(decorated.artifacts.thumbnail_paths.iter().all(|p| p.exists()));
    assert!(decorated.artifacts.waveform_path.as_ref().is_some_and(|p| p.exists()));

    // Same asset: served from the cache
    let second = add(&mut session, &source).await;
    session.wait_for_jobs().await;
    assert_eq!(
        session.clip(second).unwrap().artifacts.thumbnail_paths,
        session.clip(first).unwrap().artifacts.thumbnail_paths
    );
}

#[tokio::test]
async fn test_edit_rebuilds_effect_preview() {
    if !tools_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let source = make_source(dir.path(), 3.0).await;
    let mut session = session_in(dir.path(), true);

    let id = add(&mut session, &source).await;
    session.wait_for_jobs().await;

    session
        .apply(EditCommand::Trim {
            clip: id,
            start: 0.5,
            end: Some(2.0),
        })
        .await
        .unwrap();
    assert!(session.clip(id).unwrap().artifacts.effect_preview_path.is_none());

    let mut baked = None;
    loop {
        let next = tokio::time::timeout(Duration::from_secs(60), session.next_event()).await;
        let Ok(Some(event)) = next else {
            break;
        };
        match event {
            PreviewEvent::Done {
                kind: JobKind::EffectPreview,
                ..
            } => {
                baked = session.clip(id).unwrap().artifacts.effect_preview_path.clone();
                break;
            }
            PreviewEvent::Failed { message, .. } => panic!("effect preview failed: {}", message),
            _ => {}
        }
    }

    let baked = baked.expect("effect preview should finish");
    let duration = probe_duration_strict(&baked, 5).await.unwrap();
    assert!((duration - 1.5).abs() < 0.3, "got {duration}s");
}

#[tokio::test]
async fn test_session_export() {
    if !tools_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let source = make_source(dir.path(), 2.0).await;
    let mut session = session_in(dir.path(), false);

    let id = add(&mut session, &source).await;
    add(&mut session, &source).await;
    session
        .apply(EditCommand::SetSpeed { clip: id, speed: 2.0 })
        .await
        .unwrap();

    let output = dir.path().join("final.mp4");
    let report = session.export(&output).await.unwrap();
    assert_eq!(report.clip_count, 2);

    let expected = session.timeline().total_duration();
    let actual = probe_duration_strict(&output, 5).await.unwrap();
    assert!((actual - expected).abs() < 0.3, "expected ~{expected}s, got {actual}s");
}
