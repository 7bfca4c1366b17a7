//! Scripted user input for headless runs.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::{EngineContext, NavZone};
use crate::environment::ObjectId;

/// One user action, in the order it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Click {
        object_id: ObjectId,
    },
    Hover {
        object_id: ObjectId,
    },
    Leave {
        object_id: ObjectId,
    },
    Drop {
        source: ObjectId,
        target: ObjectId,
    },
    DropOnNothing {
        source: ObjectId,
    },
    PocketDrop {
        object_id: ObjectId,
        pocket: usize,
    },
    PocketClick {
        pocket: usize,
    },
    PocketRightClick {
        pocket: usize,
    },
    Nav {
        zone: NavZone,
    },
    Key {
        text: String,
        #[serde(default)]
        name: Option<String>,
    },
    /// Text the next input dialog receives.
    Answer {
        text: String,
    },
    Wait {
        seconds: f64,
    },
}

impl InputEvent {
    /// Feed the event to `engine`. `Answer` is handled by the caller since
    /// it belongs to the host.
    pub fn apply(&self, engine: &mut EngineContext) {
        match self {
            InputEvent::Click { object_id } => engine.click_object(*object_id),
            InputEvent::Hover { object_id } => engine.hover_object(*object_id),
            InputEvent::Leave { object_id } => engine.leave_object(*object_id),
            InputEvent::Drop { source, target } => engine.drop_object(*source, *target),
            InputEvent::DropOnNothing { source } => engine.drop_on_nothing(*source),
            InputEvent::PocketDrop { object_id, pocket } => {
                engine.drop_on_pocket(*object_id, *pocket);
            }
            InputEvent::PocketClick { pocket } => engine.pocket_click(*pocket),
            InputEvent::PocketRightClick { pocket } => engine.pocket_right_click(*pocket),
            InputEvent::Nav { zone } => engine.click_nav(*zone),
            InputEvent::Key { text, name } => engine.key_press(text, name.as_deref()),
            InputEvent::Answer { .. } => {}
            InputEvent::Wait { seconds } => {
                match Duration::try_from_secs_f64(seconds.max(0.0)) {
                    Ok(duration) => engine.run_for(duration),
                    Err(err) => warn!("skipping wait of {seconds} seconds: {err}"),
                }
            }
        }
    }
}

/// Read a script of events; `.json` files are JSON, everything else YAML.
pub fn load_script(path: &Path) -> Result<Vec<InputEvent>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading input script {}", path.display()))?;
    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("parsing JSON input script {}", path.display()))
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("parsing YAML input script {}", path.display()))
    }
}
