//! The closed GEMS vocabulary: every condition, trigger and action name an
//! environment may use, with parameter signatures and authoring help.

use log::warn;
use serde::Serialize;

use crate::parser::{parse, CallParts, ParseError};
use crate::safety::{constant_arguments, Argument};

use ApiKind::{Action, Condition, Trigger};
use ParamKind::{Any, Bool, Float, Int, List, Str};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    Condition,
    Trigger,
    Action,
}

/// Declared type of a parameter; values are coerced at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Int,
    Float,
    Str,
    Bool,
    List,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamDefault {
    Required,
    Int(i64),
    Float(f64),
    Str(&'static str),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: ParamDefault,
}

impl ParamSpec {
    pub fn is_required(&self) -> bool {
        matches!(self.default, ParamDefault::Required)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApiInfo {
    pub name: &'static str,
    pub kind: ApiKind,
    /// Where the authoring tool offers this name: any of `view`, `object`,
    /// `global` and `pocket`, concatenated.
    pub scope: &'static str,
    pub params: &'static [ParamSpec],
    pub help: &'static str,
}

impl ApiInfo {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|param| param.name == name)
    }

    /// `Name(param, param=default)` as shown in `--list-api`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|param| match param.default {
                ParamDefault::Required => param.name.to_string(),
                ParamDefault::Int(value) => format!("{}={value}", param.name),
                ParamDefault::Float(value) => format!("{}={value:?}", param.name),
                ParamDefault::Str(value) => format!("{}={value:?}", param.name),
                ParamDefault::Bool(true) => format!("{}=True", param.name),
                ParamDefault::Bool(false) => format!("{}=False", param.name),
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

const fn req(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        default: ParamDefault::Required,
    }
}

const fn opt(name: &'static str, kind: ParamKind, default: ParamDefault) -> ParamSpec {
    ParamSpec { name, kind, default }
}

const ALL_SCOPES: &str = "viewobjectglobalpocket";

const fn info(
    name: &'static str,
    kind: ApiKind,
    scope: &'static str,
    params: &'static [ParamSpec],
    help: &'static str,
) -> ApiInfo {
    ApiInfo {
        name,
        kind,
        scope,
        params,
        help,
    }
}

const VARIABLE: &[ParamSpec] = &[req("variable", Str)];
const VARIABLE_VALUE: &[ParamSpec] = &[req("variable", Str), req("value", Str)];
const COUNT: &[ParamSpec] = &[req("count", Int)];
const SECONDS: &[ParamSpec] = &[req("seconds", Float)];
const CHARACTERS_CASE: &[ParamSpec] = &[req("characters", Str), opt("ignore_case", Bool, ParamDefault::Bool(false))];
const OBJECT_ID: &[ParamSpec] = &[req("object_id", Int)];
const OBJECT_ID_SKIPLOG: &[ParamSpec] = &[req("object_id", Int), opt("skiplog", Bool, ParamDefault::Bool(false))];
const NONE: &[ParamSpec] = &[];
const TEXT_BOX: &[ParamSpec] = &[
    req("message", Str),
    req("left", Int),
    req("top", Int),
    req("duration", Float),
    req("fgcolor", List),
    req("bgcolor", List),
    req("font_size", Int),
    opt("bold", Bool, ParamDefault::Bool(false)),
    opt("skiplog", Bool, ParamDefault::Bool(false)),
];

const KEY_CHARACTERS: &[ParamSpec] = &[req("characters", Str)];
const KEY: &[ParamSpec] = &[req("key", Str)];
const SET_VARIABLE: &[ParamSpec] = &[req("variable", Str), req("value", Any)];
const VIEW_ID: &[ParamSpec] = &[req("view_id", Int)];
const SOUND_FILE: &[ParamSpec] = &[req("sound_file", Str)];
const VIDEO_FILE: &[ParamSpec] = &[req("video_file", Str)];
const MESSAGE: &[ParamSpec] = &[req("message", Str)];
const URL: &[ParamSpec] = &[req("url", Str)];
const HIDE_IMAGE: &[ParamSpec] = &[opt("image_file", Str, ParamDefault::Str(""))];
const SHOW_IMAGE: &[ParamSpec] = &[
    opt("image_file", Str, ParamDefault::Str("")),
    opt("left", Int, ParamDefault::Int(0)),
    opt("top", Int, ParamDefault::Int(0)),
    opt("duration", Float, ParamDefault::Float(0.0)),
    opt("click_through", Bool, ParamDefault::Bool(false)),
];
const SHOW_IMAGE_WITHIN: &[ParamSpec] = &[
    req("image_file", Str),
    opt("within", Int, ParamDefault::Int(-1)),
    opt("left", Int, ParamDefault::Int(0)),
    opt("top", Int, ParamDefault::Int(0)),
    opt("duration", Float, ParamDefault::Float(0.0)),
    opt("click_through", Bool, ParamDefault::Bool(false)),
];
const PLAY_SOUND: &[ParamSpec] = &[
    req("sound_file", Str),
    opt("asynchronous", Bool, ParamDefault::Bool(true)),
    opt("volume", Float, ParamDefault::Float(1.0)),
    opt("loop", Bool, ParamDefault::Bool(false)),
];
const PLAY_VIDEO: &[ParamSpec] = &[
    req("video_file", Str),
    opt("start", Int, ParamDefault::Int(0)),
    opt("within", Int, ParamDefault::Int(-1)),
    opt("volume", Float, ParamDefault::Float(1.0)),
    opt("loop", Bool, ParamDefault::Bool(false)),
];
const TEXT_DIALOG: &[ParamSpec] = &[
    req("message", Str),
    opt("title", Str, ParamDefault::Str("")),
    opt("dialog_kind", Str, ParamDefault::Str("info")),
];
const INPUT_DIALOG: &[ParamSpec] = &[
    req("prompt", Str),
    req("variable", Str),
    opt("title", Str, ParamDefault::Str("")),
    opt("default", Str, ParamDefault::Str("")),
];

pub const CONDITIONS: &[&str] = &[
    "VarValueIs",
    "VarValueIsNot",
    "VarExists",
    "VarMissing",
    "VarCountEq",
    "VarCountGtEq",
    "VarCountLtEq",
    "KeyBufferContains",
    "KeyBufferContainsIgnoreCase",
    "KeyBufferLacks",
    "HasViewTimePassed",
    "HasTotalTimePassed",
];

pub const TRIGGERS: &[&str] = &[
    "ViewTimePassed",
    "TotalTimePassed",
    "MouseClick",
    "MouseHover",
    "KeyPress",
    "DroppedOn",
    "NavLeft",
    "NavRight",
    "NavTop",
    "NavBottom",
];

pub const ACTIONS: &[&str] = &[
    "SetVariable",
    "DelVariable",
    "VarIncrease",
    "VarDecrease",
    "ClearKeyBuffer",
    "TextBox",
    "TextBoxHTML",
    "ShowObject",
    "HideObject",
    "AllowTake",
    "DisallowTake",
    "PortalTo",
    "ShowImage",
    "ShowImageWithin",
    "HideImage",
    "PlaySound",
    "StopSound",
    "StopAllSounds",
    "PlayVideo",
    "StopVideo",
    "StopAllVideos",
    "TextDialog",
    "InputDialog",
    "SayText",
    "ShowURL",
    "Quit",
    "HideMouse",
    "ShowMouse",
    "HidePockets",
    "ShowPockets",
];

/// Signature and help for every vocabulary name.
pub static API: &[ApiInfo] = &[
    // conditions
    info("VarValueIs", Condition, ALL_SCOPES, VARIABLE_VALUE,
        "True when the user variable `variable` exists and equals `value`. Numeric text compares numerically."),
    info("VarValueIsNot", Condition, ALL_SCOPES, VARIABLE_VALUE,
        "True when the user variable `variable` is missing or differs from `value`."),
    info("VarExists", Condition, ALL_SCOPES, VARIABLE,
        "True when the user variable `variable` has been created."),
    info("VarMissing", Condition, ALL_SCOPES, VARIABLE,
        "True when the user variable `variable` has not been created."),
    info("VarCountEq", Condition, ALL_SCOPES, COUNT,
        "True when exactly `count` user variables exist."),
    info("VarCountGtEq", Condition, ALL_SCOPES, COUNT,
        "True when at least `count` user variables exist."),
    info("VarCountLtEq", Condition, ALL_SCOPES, COUNT,
        "True when at most `count` user variables exist."),
    info("KeyBufferContains", Condition, "viewglobal", CHARACTERS_CASE,
        "True when the keyboard buffer contains `characters`, optionally ignoring case."),
    info("KeyBufferContainsIgnoreCase", Condition, "viewglobal", KEY_CHARACTERS,
        "True when the keyboard buffer contains `characters`, ignoring case."),
    info("KeyBufferLacks", Condition, "viewglobal", CHARACTERS_CASE,
        "True when the keyboard buffer does not contain `characters`, optionally ignoring case."),
    info("HasViewTimePassed", Condition, "viewobject", SECONDS,
        "True when more than `seconds` seconds have passed since the current view was displayed."),
    info("HasTotalTimePassed", Condition, ALL_SCOPES, SECONDS,
        "True when more than `seconds` seconds have passed since the environment started."),
    // triggers
    info("ViewTimePassed", Trigger, "view", SECONDS,
        "Fires once when `seconds` seconds have passed since the view was displayed."),
    info("TotalTimePassed", Trigger, "global", SECONDS,
        "Fires once per session when `seconds` seconds have passed since the environment started."),
    info("MouseClick", Trigger, "objectpocket", NONE,
        "Fires when the associated object is left-clicked."),
    info("MouseHover", Trigger, "object", NONE,
        "Fires when the mouse pointer moves onto the associated object."),
    info("KeyPress", Trigger, "viewglobal", KEY,
        "Fires when `key` is typed while the view is displayed. Special keys use their names, e.g. \"Return\"."),
    info("DroppedOn", Trigger, "objectpocket", OBJECT_ID,
        "Fires when object `object_id` is dragged and dropped onto the associated object."),
    info("NavLeft", Trigger, "view", NONE, "Fires when the left navigation zone is clicked."),
    info("NavRight", Trigger, "view", NONE, "Fires when the right navigation zone is clicked."),
    info("NavTop", Trigger, "view", NONE, "Fires when the top navigation zone is clicked."),
    info("NavBottom", Trigger, "view", NONE, "Fires when the bottom navigation zone is clicked."),
    // actions
    info("SetVariable", Action, ALL_SCOPES, SET_VARIABLE,
        "Creates the user variable `variable` holding `value`, replacing any previous value."),
    info("DelVariable", Action, ALL_SCOPES, VARIABLE,
        "Removes the user variable `variable`, assuming it exists."),
    info("VarIncrease", Action, ALL_SCOPES, VARIABLE,
        "Adds one to the numeric user variable `variable`, creating it as 1 when missing."),
    info("VarDecrease", Action, ALL_SCOPES, VARIABLE,
        "Subtracts one from the numeric user variable `variable`, creating it as 0 when missing."),
    info("ClearKeyBuffer", Action, ALL_SCOPES, NONE,
        "Clears every character currently in the keyboard buffer."),
    info("TextBox", Action, ALL_SCOPES, TEXT_BOX,
        "Draws `message` at (`left`, `top`) for `duration` seconds (0 = forever). (-1, -1) places it at the mouse. Colours are [r, g, b, a] lists."),
    info("TextBoxHTML", Action, ALL_SCOPES, TEXT_BOX,
        "Like TextBox, but `message` is HTML formatted."),
    info("ShowObject", Action, ALL_SCOPES, OBJECT_ID_SKIPLOG,
        "Makes object `object_id` visible."),
    info("HideObject", Action, ALL_SCOPES, OBJECT_ID_SKIPLOG,
        "Hides object `object_id`, returning it from a pocket first if necessary."),
    info("AllowTake", Action, ALL_SCOPES, OBJECT_ID,
        "Makes object `object_id` takeable."),
    info("DisallowTake", Action, ALL_SCOPES, OBJECT_ID,
        "Makes object `object_id` untakeable."),
    info("PortalTo", Action, ALL_SCOPES, VIEW_ID,
        "Replaces the current view with view `view_id`."),
    info("ShowImage", Action, "viewobjectpocket", SHOW_IMAGE, "Displays `image_file` at (`left`, `top`) for `duration` seconds (0 = forever). With `click_through` objects underneath stay clickable."),
    info("ShowImageWithin", Action, "viewobjectpocket", SHOW_IMAGE_WITHIN, "Displays `image_file` inside the bounds of object `within`, or at (`left`, `top`) when that object is not in the view."),
    info("HideImage", Action, "viewobjectpocket", HIDE_IMAGE,
        "Removes the displayed image `image_file`."),
    info("PlaySound", Action, ALL_SCOPES, PLAY_SOUND, "Plays `sound_file`. When `asynchronous` is False the environment waits until the sound finishes."),
    info("StopSound", Action, ALL_SCOPES, SOUND_FILE,
        "Stops `sound_file`, assuming it is playing."),
    info("StopAllSounds", Action, ALL_SCOPES, NONE, "Stops every playing sound."),
    info("PlayVideo", Action, ALL_SCOPES, PLAY_VIDEO, "Plays `video_file` from `start` seconds, inside object `within` when it is visible, otherwise over the whole view."),
    info("StopVideo", Action, ALL_SCOPES, VIDEO_FILE,
        "Stops `video_file`, assuming it is playing."),
    info("StopAllVideos", Action, ALL_SCOPES, NONE, "Stops every playing video."),
    info("TextDialog", Action, ALL_SCOPES, TEXT_DIALOG, "Shows `message` in a dialog titled `title`. `dialog_kind` is info, warn or error."),
    info("InputDialog", Action, ALL_SCOPES, INPUT_DIALOG, "Asks the user for text and stores the answer in the user variable `variable`."),
    info("SayText", Action, ALL_SCOPES, MESSAGE,
        "Speaks `message` with text-to-speech."),
    info("ShowURL", Action, ALL_SCOPES, URL,
        "Opens `url` in the system browser."),
    info("Quit", Action, ALL_SCOPES, NONE, "Ends the environment."),
    info("HideMouse", Action, ALL_SCOPES, NONE, "Hides the mouse cursor."),
    info("ShowMouse", Action, ALL_SCOPES, NONE, "Shows the mouse cursor."),
    info("HidePockets", Action, ALL_SCOPES, NONE, "Hides the pocket bar."),
    info("ShowPockets", Action, ALL_SCOPES, NONE, "Shows the pocket bar."),
];

pub fn lookup(name: &str) -> Option<&'static ApiInfo> {
    API.iter().find(|info| info.name == name)
}

pub fn is_known(name: &str) -> bool {
    CONDITIONS.contains(&name) || TRIGGERS.contains(&name) || ACTIONS.contains(&name)
}

/// Parse `expression` and accept it only when it names a vocabulary member.
///
/// Empty expressions and parse failures yield `None`; unknown names are
/// additionally reported as a warning.
pub fn valid_api_call(expression: &str) -> Option<CallParts> {
    if expression.trim().is_empty() {
        return None;
    }
    let parts = parse(expression).ok()?;
    if is_known(&parts.name) {
        Some(parts)
    } else {
        warn!("{}", ParseError::UnknownApiName(parts.name));
        None
    }
}

/// A call that passed every check and is ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    pub info: &'static ApiInfo,
    pub arguments: Vec<Argument>,
}

/// Parse, check the vocabulary and require constant arguments.
pub fn prepare_call(expression: &str) -> Result<PreparedCall, ParseError> {
    let parts = parse(expression)?;
    let info = lookup(&parts.name).ok_or_else(|| ParseError::UnknownApiName(parts.name.clone()))?;
    let arguments = constant_arguments(&parts.args)?;
    Ok(PreparedCall { info, arguments })
}
