//! FFprobe duration lookup.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Default probe timeout in seconds.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Ask FFprobe for the container duration in seconds.
pub async fn probe_duration_strict(path: impl AsRef<Path>, timeout_secs: u64) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), output)
        .await
        .map_err(|_| MediaError::Timeout(timeout_secs))??;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_duration_output(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        MediaError::FfprobeFailed {
            message: "FFprobe reported no duration".to_string(),
            stderr: None,
        }
    })
}

/// Probe a duration, degrading every failure to `None`.
///
/// A missing duration is a normal condition (images, broken files) so this is
/// what import uses.
pub async fn probe_duration(path: impl AsRef<Path>, timeout_secs: u64) -> Option<f64> {
    let path = path.as_ref();
    let result = probe_duration_strict(path, timeout_secs).await;
    metrics::record_probe(result.is_ok());

    match result {
        Ok(duration) => {
            debug!(path = %path.display(), duration, "Probed media duration");
            Some(duration)
        }
        Err(e) => {
            warn!(path = %path.display(), "Duration probe failed: {}", e);
            None
        }
    }
}

/// Parse FFprobe's bare `format=duration` output.
fn parse_duration_output(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}
