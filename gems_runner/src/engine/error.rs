use thiserror::Error;

use crate::environment::{ObjectId, ViewId};
use crate::host::MediaError;

/// Why a handler refused to act. Recorded as `Invalid|<reason_code>` and
/// never propagated past the dispatch boundary.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("object {0} does not exist")]
    ObjectDoesNotExist(ObjectId),
    #[error("view {0} does not exist")]
    ViewDoesNotExist(ViewId),
    #[error("variable '{0}' does not exist")]
    NoSuchVarExists(String),
    #[error("image '{0}' is not displayed")]
    ImageDoesNotExist(String),
    #[error("sound '{0}' is not playing")]
    SoundDoesNotExist(String),
    #[error("video '{0}' is not playing")]
    VideoNotPlaying(String),
    #[error("media file '{0}' was not found")]
    FileNotFound(String),
    #[error("media playback is disabled for this session")]
    MediaDisabled,
    #[error("text-to-speech is not available")]
    TtsDisabled,
    #[error("{0}")]
    BadArguments(String),
    #[error(transparent)]
    MediaFailure(#[from] MediaError),
}

impl HandlerError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            HandlerError::ObjectDoesNotExist(_) => "ObjectDoesNotExist",
            HandlerError::ViewDoesNotExist(_) => "ViewDoesNotExist",
            HandlerError::NoSuchVarExists(_) => "NoSuchVarExists",
            HandlerError::ImageDoesNotExist(_) => "ImageDoesNotExist",
            HandlerError::SoundDoesNotExist(_) => "SoundDoesNotExist",
            HandlerError::VideoNotPlaying(_) => "VideoNotPlaying",
            HandlerError::FileNotFound(_) => "FileNotFound",
            HandlerError::MediaDisabled => "MediaDisabled",
            HandlerError::TtsDisabled => "TtsDisabled",
            HandlerError::BadArguments(_) => "BadArguments",
            HandlerError::MediaFailure(_) => "MediaFailure",
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("view {0} does not exist in this environment")]
    MissingView(ViewId),
}
