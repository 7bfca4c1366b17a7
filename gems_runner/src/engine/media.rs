use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::error::HandlerError;

/// Sounds and videos started in the current view, keyed by file stem.
#[derive(Debug, Default, Clone)]
pub(super) struct MediaState {
    pub(super) sounds: BTreeMap<String, PathBuf>,
    pub(super) videos: BTreeMap<String, PathBuf>,
}

impl MediaState {
    pub(super) fn clear(&mut self) -> (Vec<String>, Vec<String>) {
        let sounds = std::mem::take(&mut self.sounds).into_keys().collect();
        let videos = std::mem::take(&mut self.videos).into_keys().collect();
        (sounds, videos)
    }
}

/// Name a media file is tracked under: its stem.
pub(super) fn media_name(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

/// Use `file` as given when it exists, otherwise look for it in the media folder.
pub(super) fn resolve_media(media_path: &Path, file: &str) -> Result<PathBuf, HandlerError> {
    let direct = Path::new(file);
    if !file.is_empty() && direct.is_file() {
        return Ok(direct.to_path_buf());
    }
    let within = media_path.join(file);
    if !file.is_empty() && within.is_file() {
        return Ok(within);
    }
    Err(HandlerError::FileNotFound(file.to_string()))
}

pub(super) fn is_animation(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gif"))
}
