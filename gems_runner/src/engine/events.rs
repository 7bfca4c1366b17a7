use gems_expr::{parse_literal, strip_param_name, valid_api_call, Literal};
use log::{debug, warn};
use serde_json::{json, Value as JsonValue};

use super::{EngineContext, NavZone, PocketItem};
use crate::data_log::Outcome;
use crate::environment::{ObjectId, Rule, ViewObject};

impl EngineContext {
    /// Visible object of the current view.
    fn live_object(&self, object_id: ObjectId) -> Option<&ViewObject> {
        self.current_view()?
            .objects
            .get(&object_id)
            .filter(|object| object.visible)
    }

    fn object_rules(&self, object_id: ObjectId, matches: impl Fn(&Rule) -> bool) -> Vec<(String, String)> {
        self.current_view()
            .and_then(|view| view.objects.get(&object_id))
            .map(|object| enabled_rules(object.actions.values(), matches))
            .unwrap_or_default()
    }

    pub fn click_object(&mut self, object_id: ObjectId) {
        let Some(object) = self.live_object(object_id) else {
            debug!("ignoring click on object {object_id}: not shown in this view");
            return;
        };
        let name = object.name.clone();
        self.record_mouse("LeftClick", None, Some(json!(name)), Outcome::Valid);
        let rules = self.object_rules(object_id, |rule| rule.trigger.trim() == "MouseClick()");
        self.fire(rules);
    }

    pub fn hover_object(&mut self, object_id: ObjectId) {
        let Some(object) = self.live_object(object_id) else {
            return;
        };
        let name = object.name.clone();
        self.record_mouse("MoveOnto", None, Some(json!(name)), Outcome::Valid);
        let rules = self.object_rules(object_id, |rule| rule.trigger.trim() == "MouseHover()");
        self.fire(rules);
    }

    pub fn leave_object(&mut self, object_id: ObjectId) {
        let Some(object) = self.live_object(object_id) else {
            return;
        };
        let name = object.name.clone();
        self.record_mouse("MoveOff", None, Some(json!(name)), Outcome::Valid);
    }

    /// `source_id` was dragged onto `target_id`.
    pub fn drop_object(&mut self, source_id: ObjectId, target_id: ObjectId) {
        if source_id == target_id {
            debug!("ignoring drop of object {source_id} onto itself");
            return;
        }
        if self.live_object(target_id).is_none() {
            warn!("drop target {target_id} is not shown in this view");
            return;
        }

        let trigger = format!("DroppedOn({source_id})");
        let rules = self.object_rules(target_id, |rule| strip_whitespace(&rule.trigger) == trigger);
        let outcome = if rules.is_empty() {
            Outcome::invalid("Interaction")
        } else {
            Outcome::ValidWith("Interaction".to_string())
        };
        self.record_mouse("ObjectDragDrop", Some(json!(source_id)), Some(json!(target_id)), outcome);
        self.fire(rules);
    }

    pub fn drop_on_nothing(&mut self, source_id: ObjectId) {
        self.record_mouse("ObjectDragDrop", Some(json!(source_id)), None, Outcome::invalid("NoTarget"));
    }

    /// Put `object_id` into pocket `pocket` when there is room and the object
    /// may be taken.
    pub fn drop_on_pocket(&mut self, object_id: ObjectId, pocket: usize) -> bool {
        let target = json!(format!("Pocket{pocket}"));
        let source = Some(json!(object_id));
        match self.pockets.get(pocket) {
            None => {
                warn!("there is no pocket {pocket}");
                return false;
            }
            Some(Some(item)) if item.object_id == object_id => return false,
            Some(Some(_)) => {
                self.record_mouse("PocketDragDrop", source, Some(target), Outcome::invalid("FullPocket"));
                return false;
            }
            Some(None) => {}
        }
        if self.pockets.holding(object_id).is_some() {
            self.record_mouse("PocketDragDrop", source, Some(target), Outcome::invalid("ObjAlreadyInPocket"));
            return false;
        }

        let (name, takeable) = match self.live_object(object_id) {
            Some(object) => (object.name.clone(), object.takeable),
            None => {
                self.record_mouse("PocketDragDrop", source, Some(target), Outcome::invalid("ObjectDoesNotExist"));
                return false;
            }
        };
        if !takeable {
            self.record_mouse("PocketDragDrop", source, Some(target), Outcome::invalid("ObjNotTakeable"));
            return false;
        }

        self.record_mouse("PocketDragDrop", source, Some(target), Outcome::Valid);
        let view_id = self.current_view.unwrap_or_default();
        self.pockets.store(
            pocket,
            PocketItem {
                name,
                view_id,
                object_id,
            },
        );
        for object in self.environment.objects_mut(object_id) {
            object.visible = false;
        }
        self.renderer.hide_object(object_id);
        true
    }

    pub fn pocket_click(&mut self, pocket: usize) {
        let held = self.pockets.get(pocket).cloned().flatten();
        match held {
            Some(item) => self.record_mouse("PocketObjectLeftClick", None, Some(json!(item.name)), Outcome::Valid),
            None => self.record_mouse("PocketObjectLeftClick", None, None, Outcome::invalid("EmptyPocket")),
        }
    }

    pub fn pocket_right_click(&mut self, pocket: usize) {
        self.return_from_pocket(pocket, false);
    }

    /// Empty `pocket`, making its object visible again in its home view.
    pub(crate) fn return_from_pocket(&mut self, pocket: usize, quiet: bool) -> bool {
        let Some(item) = self.pockets.take(pocket) else {
            if !quiet {
                self.record_mouse("PocketObjectRightClick", None, None, Outcome::invalid("EmptyPocket"));
            }
            return false;
        };
        if !quiet {
            self.record_mouse("PocketObjectRightClick", None, Some(json!(item.name)), Outcome::Valid);
        }
        for object in self.environment.objects_mut(item.object_id) {
            object.visible = true;
        }
        if self.current_view == Some(item.view_id) {
            self.renderer.show_object(item.object_id);
        }
        true
    }

    pub fn click_nav(&mut self, zone: NavZone) {
        let Some(ids) = self.nav_rules.get(&zone).cloned() else {
            debug!("view has no {} zone", zone.trigger_name());
            return;
        };
        self.record_mouse(&format!("{}Pressed", zone.trigger_name()), None, None, Outcome::Valid);
        let rules = self
            .current_view()
            .map(|view| enabled_rules(ids.iter().filter_map(|id| view.actions.get(id)), |_| true))
            .unwrap_or_default();
        self.fire(rules);
    }

    /// A key typed in the current view. `text` is what the key produced,
    /// `name` the key's name for keys such as `Return`.
    pub fn key_press(&mut self, text: &str, name: Option<&str>) {
        let accepted = self.keyboard.push(text);
        let mut record = self.new_record(
            "Keyboard",
            "KeyPress",
            if accepted { Outcome::Valid } else { Outcome::invalid("") },
        );
        record
            .params
            .insert("Key".to_string(), name.map_or(JsonValue::Null, |name| json!(name)));
        record.params.insert("KeyText".to_string(), json!(text));
        self.data_log.append(record);

        let rules = self
            .current_view()
            .map(|view| {
                enabled_rules(view.actions.values(), |rule| {
                    key_trigger(&rule.trigger).map_or(false, |key| key == text || Some(key.as_str()) == name)
                })
            })
            .unwrap_or_default();
        self.fire(rules);
    }
}

fn enabled_rules<'a>(
    rules: impl Iterator<Item = &'a Rule>,
    matches: impl Fn(&Rule) -> bool,
) -> Vec<(String, String)> {
    rules
        .filter(|rule| rule.enabled && matches(rule))
        .map(|rule| (rule.condition.clone(), rule.action.clone()))
        .collect()
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// Key named by a `KeyPress("...")` trigger.
fn key_trigger(trigger: &str) -> Option<String> {
    if !trigger.trim_start().starts_with("KeyPress") {
        return None;
    }
    let call = valid_api_call(trigger)?;
    match parse_literal(strip_param_name(call.args.first()?)) {
        Ok(Literal::Str(key)) => Some(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_triggers_accept_either_quote_style() {
        assert_eq!(key_trigger("KeyPress(\"a\")"), Some("a".to_string()));
        assert_eq!(key_trigger("KeyPress('Return')"), Some("Return".to_string()));
        assert_eq!(key_trigger("KeyPress(key=' ')"), Some(" ".to_string()));
        assert_eq!(key_trigger("MouseClick()"), None);
        assert_eq!(key_trigger("KeyPress(4)"), None);
    }

    #[test]
    fn drop_triggers_ignore_spacing() {
        assert_eq!(strip_whitespace(" DroppedOn( 12 ) "), "DroppedOn(12)");
    }
}
