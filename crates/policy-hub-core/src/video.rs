//! Replay video selection.
//!
//! The renderer writes one or more clips per deploy. When there are several,
//! the newest is usually a near-empty clip produced by the extra reset/close
//! of the environment after the real episode, so the one before it is taken.
//! This is a heuristic about the renderer, not a guarantee.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::error::{PolicyHubError, Result};

/// File extensions recognised as replay videos.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4"];

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.iter().any(|v| e.eq_ignore_ascii_case(v)))
        .unwrap_or(false)
}

/// Video files in `dir`, oldest first (ties broken by file name).
pub fn list_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut videos: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_video(&path) {
            videos.push((entry.metadata()?.modified()?, path));
        }
    }
    videos.sort();

    Ok(videos.into_iter().map(|(_, path)| path).collect())
}

/// Pick the replay video for upload.
///
/// With `explicit` set, that file (relative to `dir`) must exist. Otherwise
/// the only candidate, or the second-to-last by modification time.
pub fn find_video_file(dir: &Path, explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(name) = explicit {
        let path = dir.join(name);
        if !path.is_file() {
            return Err(PolicyHubError::NotFound(format!(
                "replay file {}",
                path.display()
            )));
        }
        return Ok(path);
    }

    let mut videos = list_videos(dir)?;
    debug!("Found {} replay candidate(s) in {:?}", videos.len(), dir);

    match videos.len() {
        0 => Err(PolicyHubError::NotFound(format!(
            "no replay rendered in {}",
            dir.display()
        ))),
        1 => Ok(videos.remove(0)),
        n => Ok(videos.swap_remove(n - 2)),
    }
}
