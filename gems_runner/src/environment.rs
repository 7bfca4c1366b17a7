//! Typed model of a GEMS environment and its YAML loader.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::variables::Variables;

pub type ViewId = i64;
pub type ObjectId = i64;
pub type RuleId = i64;

pub const DEFAULT_POCKET_COUNT: usize = 4;

/// A trigger/condition/action triple attached to a view, object or the
/// global section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: RuleId,
    pub enabled: bool,
    pub trigger: String,
    pub condition: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewObject {
    pub id: ObjectId,
    pub name: String,
    pub visible: bool,
    pub takeable: bool,
    pub draggable: bool,
    pub geometry: Geometry,
    pub actions: BTreeMap<RuleId, Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub id: ViewId,
    pub name: String,
    pub foreground: String,
    pub background: String,
    pub overlay: String,
    pub objects: BTreeMap<ObjectId, ViewObject>,
    pub actions: BTreeMap<RuleId, Rule>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayType {
    #[default]
    Windowed,
    Maximized,
    Fullscreen,
}

impl DisplayType {
    fn from_option(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "fullscreen" => DisplayType::Fullscreen,
            "maximized" => DisplayType::Maximized,
            _ => DisplayType::Windowed,
        }
    }
}

/// `Global.Options` as authored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Options {
    pub start_view: ViewId,
    pub pocket_count: usize,
    pub display_type: DisplayType,
    pub stage_color: Vec<i64>,
    pub global_overlay: String,
    pub volume: f64,
    pub preload_resources: bool,
    pub object_hover: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            start_view: 1,
            pocket_count: DEFAULT_POCKET_COUNT,
            display_type: DisplayType::Windowed,
            stage_color: vec![0, 0, 0, 255],
            global_overlay: String::new(),
            volume: 1.0,
            preload_resources: false,
            object_hover: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    pub name: String,
    pub options: Options,
    pub global_actions: BTreeMap<RuleId, Rule>,
    pub views: BTreeMap<ViewId, View>,
    pub variables: Variables,
}

impl Environment {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading environment file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("parsing environment file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let document: EnvironmentDocument =
            serde_yaml::from_str(text).context("decoding environment YAML")?;
        Ok(document.into_environment())
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    /// Every copy of `object_id` across all views.
    pub fn objects_mut(&mut self, object_id: ObjectId) -> impl Iterator<Item = &mut ViewObject> {
        self.views
            .values_mut()
            .filter_map(move |view| view.objects.get_mut(&object_id))
    }

    /// Image files the views and options reference, without duplicates.
    pub fn referenced_images(&self) -> Vec<&str> {
        let mut images: Vec<&str> = self
            .views
            .values()
            .flat_map(|view| [view.foreground.as_str(), view.background.as_str(), view.overlay.as_str()])
            .chain(std::iter::once(self.options.global_overlay.as_str()))
            .filter(|name| !name.is_empty())
            .collect();
        images.sort_unstable();
        images.dedup();
        images
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EnvironmentDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    global: GlobalDocument,
    #[serde(default)]
    views: BTreeMap<String, ViewDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GlobalDocument {
    #[serde(default)]
    options: OptionsDocument,
    #[serde(default)]
    global_actions: BTreeMap<String, RuleDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OptionsDocument {
    startview: Option<serde_yaml::Value>,
    pocketcount: Option<serde_yaml::Value>,
    display_type: Option<String>,
    stage_color: Option<serde_yaml::Value>,
    globaloverlay: Option<String>,
    volume: Option<f64>,
    preloadresources: Option<bool>,
    object_hover: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ViewDocument {
    id: Option<ViewId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    foreground: String,
    #[serde(default)]
    background: String,
    #[serde(default)]
    overlay: String,
    #[serde(default)]
    objects: BTreeMap<String, ObjectDocument>,
    #[serde(default)]
    actions: BTreeMap<String, RuleDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ObjectDocument {
    id: Option<ObjectId>,
    #[serde(default)]
    name: String,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    takeable: bool,
    #[serde(default)]
    draggable: bool,
    #[serde(default)]
    left: f64,
    #[serde(default)]
    top: f64,
    #[serde(default)]
    width: f64,
    #[serde(default)]
    height: f64,
    #[serde(default)]
    actions: BTreeMap<String, RuleDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RuleDocument {
    id: Option<RuleId>,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    trigger: Option<String>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    action: Option<String>,
}

fn default_true() -> bool {
    true
}

impl EnvironmentDocument {
    fn into_environment(self) -> Environment {
        let views = self
            .views
            .into_iter()
            .filter_map(|(key, doc)| {
                let id = resolve_id("view", &key, doc.id)?;
                Some((id, doc.into_view(id)))
            })
            .collect();

        Environment {
            name: self.name,
            options: self.global.options.into_options(),
            global_actions: convert_rules(self.global.global_actions),
            views,
            variables: Variables::new(),
        }
    }
}

impl ViewDocument {
    fn into_view(self, id: ViewId) -> View {
        let objects = self
            .objects
            .into_iter()
            .filter_map(|(key, doc)| {
                let object_id = resolve_id("object", &key, doc.id)?;
                Some((object_id, doc.into_object(object_id)))
            })
            .collect();

        View {
            id,
            name: self.name,
            foreground: self.foreground,
            background: self.background,
            overlay: self.overlay,
            objects,
            actions: convert_rules(self.actions),
        }
    }
}

impl ObjectDocument {
    fn into_object(self, id: ObjectId) -> ViewObject {
        ViewObject {
            id,
            name: self.name,
            visible: self.visible,
            takeable: self.takeable,
            draggable: self.draggable,
            geometry: Geometry {
                left: self.left.round() as i32,
                top: self.top.round() as i32,
                width: self.width.round() as i32,
                height: self.height.round() as i32,
            },
            actions: convert_rules(self.actions),
        }
    }
}

impl OptionsDocument {
    fn into_options(self) -> Options {
        let defaults = Options::default();

        let start_view = match self.startview.as_ref().and_then(yaml_int) {
            Some(id) => id,
            None => {
                warn!(
                    "Global.Options.Startview is missing or invalid ({:?}); using view {}",
                    self.startview, defaults.start_view
                );
                defaults.start_view
            }
        };

        let pocket_count = match self.pocketcount.as_ref().map(yaml_int) {
            None => defaults.pocket_count,
            Some(Some(count)) if count >= 0 => count as usize,
            Some(_) => {
                warn!(
                    "Global.Options.Pocketcount was set to an invalid value {:?}, setting to {}",
                    self.pocketcount, DEFAULT_POCKET_COUNT
                );
                DEFAULT_POCKET_COUNT
            }
        };

        let stage_color = self
            .stage_color
            .as_ref()
            .and_then(|value| value.as_sequence())
            .map(|items| items.iter().filter_map(yaml_int).collect::<Vec<_>>())
            .filter(|items| !items.is_empty())
            .unwrap_or(defaults.stage_color);

        Options {
            start_view,
            pocket_count,
            display_type: self
                .display_type
                .as_deref()
                .map(DisplayType::from_option)
                .unwrap_or_default(),
            stage_color,
            global_overlay: self.globaloverlay.unwrap_or_default(),
            volume: self.volume.unwrap_or(defaults.volume),
            preload_resources: self.preloadresources.unwrap_or(false),
            object_hover: self.object_hover.unwrap_or_default(),
        }
    }
}

fn yaml_int(value: &serde_yaml::Value) -> Option<i64> {
    match value {
        serde_yaml::Value::Number(number) => number.as_i64(),
        serde_yaml::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Prefer the record's own `Id`; fall back to the mapping key.
fn resolve_id(kind: &str, key: &str, id: Option<i64>) -> Option<i64> {
    let parsed_key = key.trim().parse::<i64>().ok();
    match (id, parsed_key) {
        (Some(id), Some(from_key)) if id != from_key => {
            warn!("{kind} key \"{key}\" does not match its Id {id}; using the Id");
            Some(id)
        }
        (Some(id), _) => Some(id),
        (None, Some(from_key)) => Some(from_key),
        (None, None) => {
            warn!("{kind} \"{key}\" has no usable Id; skipping it");
            None
        }
    }
}

fn convert_rules(rules: BTreeMap<String, RuleDocument>) -> BTreeMap<RuleId, Rule> {
    rules
        .into_iter()
        .filter_map(|(key, doc)| {
            let id = resolve_id("rule", &key, doc.id)?;
            Some((
                id,
                Rule {
                    id,
                    enabled: doc.enabled,
                    trigger: doc.trigger.unwrap_or_default(),
                    condition: doc.condition.unwrap_or_default(),
                    action: doc.action.unwrap_or_default(),
                },
            ))
        })
        .collect()
}
