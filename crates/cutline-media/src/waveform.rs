//! Waveform images.

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::filters::waveform_graph;

/// File name of a clip's waveform image.
pub const WAVEFORM_FILE_NAME: &str = "wave.png";

/// Size and colors of a waveform image.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformStyle {
    pub width: u32,
    pub height: u32,
    /// Wave color, e.g. `0x4488ff`
    pub foreground: String,
    /// Background color, e.g. `0x161616`
    pub background: String,
}

impl Default for WaveformStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 100,
            foreground: "0x4488ff".to_string(),
            background: "0x161616".to_string(),
        }
    }
}

/// Command rendering the waveform of `[start, start + duration)`.
pub fn waveform_command(
    source: &Path,
    start: f64,
    duration: f64,
    style: &WaveformStyle,
    output: &Path,
) -> FfmpegCommand {
    FfmpegCommand::new(source, output)
        .seek(start)
        .duration(duration)
        .filter_complex(waveform_graph(
            style.width,
            style.height,
            &style.foreground,
            &style.background,
        ))
        .single_frame()
}

/// Render a waveform image, returning `None` on any failure.
pub async fn generate_waveform(
    source: &Path,
    output: &Path,
    start: f64,
    duration: f64,
    style: &WaveformStyle,
    timeout_secs: u64,
) -> Option<PathBuf> {
    let cmd = waveform_command(source, start, duration, style, output);
    let result = FfmpegRunner::new()
        .with_timeout(timeout_secs)
        .with_operation("waveform")
        .run(&cmd)
        .await;

    match result {
        Ok(()) if output.exists() => Some(output.to_path_buf()),
        Ok(()) => None,
        Err(e) => {
            warn!(source = %source.display(), "Waveform failed: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_command() {
        let args = waveform_command(
            Path::new("a.mp4"),
            1.0,
            4.0,
            &WaveformStyle::default(),
            Path::new("wave.png"),
        )
        .build_args();

        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert_eq!(
            graph,
            "[0:a]showwavespic=s=1000x100:colors=0x4488ff[fg];color=s=1000x100:color=0x161616[bg];[bg][fg]overlay=format=auto"
        );
        assert!(args.contains(&"4.000".to_string()));
    }
}
