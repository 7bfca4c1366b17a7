//! Collaborator seams the engine calls into: rendering, media playback and
//! time. Every method has a no-op default so hosts implement only what they
//! can present.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::environment::{ObjectId, ViewId};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media backend unavailable: {0}")]
    Unavailable(String),
    #[error("unable to play {path}: {message}")]
    Playback { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRequest {
    pub message: String,
    pub html: bool,
    pub left: i64,
    pub top: i64,
    /// `(-1, -1)` in the rule places the text at the pointer.
    pub at_cursor: bool,
    pub duration_secs: f64,
    pub foreground: [u8; 4],
    pub background: [u8; 4],
    pub font_size: i64,
    pub bold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRequest {
    pub name: String,
    pub path: PathBuf,
    pub left: i64,
    pub top: i64,
    /// Set when the image is fitted inside an object.
    pub size: Option<(i64, i64)>,
    pub duration_secs: f64,
    pub click_through: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogRequest {
    pub message: String,
    pub title: String,
    pub kind: DialogKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputRequest {
    pub prompt: String,
    pub title: String,
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundRequest {
    pub name: String,
    pub path: PathBuf,
    pub asynchronous: bool,
    pub volume: f64,
    pub looped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRequest {
    pub name: String,
    pub path: PathBuf,
    pub start_secs: i64,
    pub left: i64,
    pub top: i64,
    /// `None` plays over the whole view.
    pub size: Option<(i64, i64)>,
    pub volume: f64,
    pub looped: bool,
}

pub trait RenderCallback {
    fn show_object(&self, _object_id: ObjectId) {}
    fn hide_object(&self, _object_id: ObjectId) {}
    fn switch_view(&self, _view_id: ViewId) {}
    fn display_text(&self, _request: &TextRequest) {}
    fn display_image(&self, _request: &ImageRequest) {}
    fn hide_image(&self, _name: &str) {}
    fn show_dialog(&self, _request: &DialogRequest) {}
    /// `None` when the user cancelled or no one can answer.
    fn prompt_input(&self, _request: &InputRequest) -> Option<String> {
        None
    }
    fn set_cursor_visible(&self, _visible: bool) {}
    fn set_pockets_visible(&self, _visible: bool) {}
    fn open_url(&self, _url: &str) {}
    fn request_quit(&self) {}
}

impl fmt::Debug for dyn RenderCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderCallback")
    }
}

pub trait MediaCallback {
    /// Returns the clip length when the backend knows it.
    fn play_sound(&self, _request: &SoundRequest) -> Result<Option<Duration>, MediaError> {
        Ok(None)
    }
    fn stop_sound(&self, _name: &str) {}
    fn stop_all_sounds(&self) {}
    fn play_video(&self, _request: &VideoRequest) -> Result<(), MediaError> {
        Ok(())
    }
    fn stop_video(&self, _name: &str) {}
    fn speak(&self, _text: &str) -> Result<(), MediaError> {
        Ok(())
    }
}

impl fmt::Debug for dyn MediaCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MediaCallback")
    }
}
