use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use crate::environment::{ObjectId, ViewId};
use crate::host::{
    DialogRequest, ImageRequest, InputRequest, MediaCallback, MediaError, RenderCallback,
    SoundRequest, TextRequest, VideoRequest,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostEvent {
    ShowObject {
        object_id: ObjectId,
    },
    HideObject {
        object_id: ObjectId,
    },
    SwitchView {
        view_id: ViewId,
    },
    DisplayText(TextRequest),
    DisplayImage(ImageRequest),
    HideImage {
        name: String,
    },
    ShowDialog(DialogRequest),
    PromptInput {
        prompt: String,
        answer: Option<String>,
    },
    CursorVisible {
        visible: bool,
    },
    PocketsVisible {
        visible: bool,
    },
    OpenUrl {
        url: String,
    },
    Quit,
    PlaySound(SoundRequest),
    StopSound {
        name: String,
    },
    StopAllSounds,
    PlayVideo(VideoRequest),
    StopVideo {
        name: String,
    },
    Speak {
        text: String,
    },
}

/// Headless host: records every request, answers input prompts from a queue
/// and reports a fixed clip length for sounds.
#[derive(Clone, Default)]
pub struct RecordingHost {
    events: Rc<RefCell<Vec<HostEvent>>>,
    answers: Rc<RefCell<VecDeque<String>>>,
    sound_length: Rc<Cell<Option<Duration>>>,
    media_failure: Rc<RefCell<Option<String>>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Next text handed back by `prompt_input`.
    pub fn queue_answer(&self, answer: impl Into<String>) {
        self.answers.borrow_mut().push_back(answer.into());
    }

    pub fn set_sound_length(&self, length: Option<Duration>) {
        self.sound_length.set(length);
    }

    /// Make every playback request fail with `message`.
    pub fn fail_media(&self, message: Option<&str>) {
        *self.media_failure.borrow_mut() = message.map(str::to_string);
    }

    pub fn renderer(&self) -> Rc<dyn RenderCallback> {
        Rc::new(self.clone())
    }

    pub fn media(&self) -> Rc<dyn MediaCallback> {
        Rc::new(self.clone())
    }

    fn push(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }

    fn check_media(&self, path: &std::path::Path) -> Result<(), MediaError> {
        match self.media_failure.borrow().as_ref() {
            Some(message) => Err(MediaError::Playback {
                path: path.to_path_buf(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl RenderCallback for RecordingHost {
    fn show_object(&self, object_id: ObjectId) {
        self.push(HostEvent::ShowObject { object_id });
    }

    fn hide_object(&self, object_id: ObjectId) {
        self.push(HostEvent::HideObject { object_id });
    }

    fn switch_view(&self, view_id: ViewId) {
        self.push(HostEvent::SwitchView { view_id });
    }

    fn display_text(&self, request: &TextRequest) {
        self.push(HostEvent::DisplayText(request.clone()));
    }

    fn display_image(&self, request: &ImageRequest) {
        self.push(HostEvent::DisplayImage(request.clone()));
    }

    fn hide_image(&self, name: &str) {
        self.push(HostEvent::HideImage {
            name: name.to_string(),
        });
    }

    fn show_dialog(&self, request: &DialogRequest) {
        self.push(HostEvent::ShowDialog(request.clone()));
    }

    fn prompt_input(&self, request: &InputRequest) -> Option<String> {
        let answer = self.answers.borrow_mut().pop_front();
        self.push(HostEvent::PromptInput {
            prompt: request.prompt.clone(),
            answer: answer.clone(),
        });
        answer
    }

    fn set_cursor_visible(&self, visible: bool) {
        self.push(HostEvent::CursorVisible { visible });
    }

    fn set_pockets_visible(&self, visible: bool) {
        self.push(HostEvent::PocketsVisible { visible });
    }

    fn open_url(&self, url: &str) {
        self.push(HostEvent::OpenUrl {
            url: url.to_string(),
        });
    }

    fn request_quit(&self) {
        self.push(HostEvent::Quit);
    }
}

impl MediaCallback for RecordingHost {
    fn play_sound(&self, request: &SoundRequest) -> Result<Option<Duration>, MediaError> {
        self.check_media(&request.path)?;
        self.push(HostEvent::PlaySound(request.clone()));
        Ok(self.sound_length.get())
    }

    fn stop_sound(&self, name: &str) {
        self.push(HostEvent::StopSound {
            name: name.to_string(),
        });
    }

    fn stop_all_sounds(&self) {
        self.push(HostEvent::StopAllSounds);
    }

    fn play_video(&self, request: &VideoRequest) -> Result<(), MediaError> {
        self.check_media(&request.path)?;
        self.push(HostEvent::PlayVideo(request.clone()));
        Ok(())
    }

    fn stop_video(&self, name: &str) {
        self.push(HostEvent::StopVideo {
            name: name.to_string(),
        });
    }

    fn speak(&self, text: &str) -> Result<(), MediaError> {
        if let Some(message) = self.media_failure.borrow().as_ref() {
            return Err(MediaError::Unavailable(message.clone()));
        }
        self.push(HostEvent::Speak {
            text: text.to_string(),
        });
        Ok(())
    }
}
