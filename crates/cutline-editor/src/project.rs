//! Reading and writing project files.

use std::path::Path;
use tracing::debug;

use cutline_models::ProjectFile;

use crate::error::EditorResult;

pub async fn read_project(path: &Path) -> EditorResult<ProjectFile> {
    let data = tokio::fs::read_to_string(path).await?;
    let project = ProjectFile::from_json(&data)?;
    debug!(
        path = %path.display(),
        media = project.media.len(),
        clips = project.timeline.len(),
        "Read project"
    );
    Ok(project)
}

/// Write pretty-printed JSON, creating the parent directory if needed.
pub async fn write_project(path: &Path, project: &ProjectFile) -> EditorResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, project.to_json_pretty()?).await?;
    debug!(path = %path.display(), clips = project.timeline.len(), "Wrote project");
    Ok(())
}
