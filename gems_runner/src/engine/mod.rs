//! The rule engine: owns the environment and session state, evaluates
//! rule expressions through the handler table and drives timers.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use gems_expr::{prepare_call, ParseError};
use log::{debug, error, info, log, warn, Level};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

mod args;
mod display;
mod dispatch;
mod error;
mod events;
mod handlers;
mod keyboard;
mod media;
mod pockets;
mod text;

pub use args::BoundArgs;
pub use dispatch::{Handler, HandlerEntry, HandlerResult, HandlerTable, LogPolicy, Value};
pub use error::{EngineError, HandlerError};
pub use pockets::PocketItem;
pub use text::interpolate;

use args::literal_to_json;
use display::DisplayState;
use keyboard::KeyBuffer;
use media::MediaState;
use pockets::PocketState;

use crate::clock::Clock;
use crate::data_log::{DataLog, DataRecord, Outcome};
use crate::environment::{Environment, RuleId, View, ViewId};
use crate::host::{MediaCallback, RenderCallback};
use crate::host_bridge::RecordingHost;
use crate::scheduler::{self, Elapsed, TimerQueue};
use crate::session::{RunOptions, Session};

/// Edge zones that can carry `Nav*` rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavZone {
    Left,
    Right,
    Top,
    Bottom,
}

impl NavZone {
    pub const ALL: [NavZone; 4] = [NavZone::Left, NavZone::Right, NavZone::Top, NavZone::Bottom];

    pub fn trigger_name(self) -> &'static str {
        match self {
            NavZone::Left => "NavLeft",
            NavZone::Right => "NavRight",
            NavZone::Top => "NavTop",
            NavZone::Bottom => "NavBottom",
        }
    }
}

/// A view change requested by a rule, completed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    View { view_id: ViewId },
    Quit,
}

/// Host objects the engine calls out to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub renderer: Rc<dyn RenderCallback>,
    pub media: Rc<dyn MediaCallback>,
    pub clock: Rc<dyn Clock>,
}

impl Collaborators {
    pub fn recording(host: &RecordingHost, clock: Rc<dyn Clock>) -> Self {
        Self {
            renderer: host.renderer(),
            media: host.media(),
            clock,
        }
    }
}

#[derive(Debug)]
pub struct EngineContext {
    environment: Environment,
    run: RunOptions,
    data_log: DataLog,
    renderer: Rc<dyn RenderCallback>,
    media: Rc<dyn MediaCallback>,
    clock: Rc<dyn Clock>,
    handlers: HandlerTable,
    current_view: Option<ViewId>,
    view_entered_at: Duration,
    generation: u64,
    keyboard: KeyBuffer,
    pockets: PocketState,
    nav_rules: BTreeMap<NavZone, Vec<RuleId>>,
    display: DisplayState,
    media_state: MediaState,
    timers: TimerQueue,
    wait_deadline: Option<Duration>,
    transition: Option<Transition>,
}

impl EngineContext {
    pub fn new(session: Session, collaborators: Collaborators) -> Self {
        let Session {
            environment,
            run,
            data_log,
        } = session;
        Self {
            environment,
            run,
            data_log,
            renderer: collaborators.renderer,
            media: collaborators.media,
            clock: collaborators.clock,
            handlers: HandlerTable::standard(),
            current_view: None,
            view_entered_at: Duration::ZERO,
            generation: 0,
            keyboard: KeyBuffer::default(),
            pockets: PocketState::default(),
            nav_rules: BTreeMap::new(),
            display: DisplayState::default(),
            media_state: MediaState::default(),
            timers: TimerQueue::new(),
            wait_deadline: None,
            transition: None,
        }
    }

    /// Show the start view.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let start_view = self.environment.options.start_view;
        info!(
            "starting environment '{}' at view {start_view}",
            self.environment.name
        );
        self.renderer.switch_view(start_view);
        self.enter_view(start_view)
    }

    /// Tear down the current view (if any) and make `view_id` current.
    pub fn enter_view(&mut self, view_id: ViewId) -> Result<(), EngineError> {
        if !self.environment.views.contains_key(&view_id) {
            return Err(EngineError::MissingView(view_id));
        }
        if self.current_view.is_some() {
            self.teardown_view();
        }

        self.generation += 1;
        self.current_view = Some(view_id);
        self.view_entered_at = self.clock.now();
        self.transition = None;
        self.keyboard.clear();
        self.pockets
            .ensure_created(self.environment.options.pocket_count);
        self.nav_rules = self
            .environment
            .view(view_id)
            .map(nav_rules_for)
            .unwrap_or_default();

        let elapsed = Elapsed {
            now: self.view_entered_at,
            in_view: Duration::ZERO,
        };
        let armed = scheduler::arm(
            &mut self.environment,
            view_id,
            elapsed,
            self.generation,
            &mut self.timers,
        );
        debug!(
            "entered view {view_id} (generation {}, {armed} timer(s))",
            self.generation
        );
        Ok(())
    }

    fn teardown_view(&mut self) {
        let cancelled = self.timers.cancel_generation(self.generation);
        debug!("cancelled {cancelled} pending timer(s)");
        for name in self.display.clear_view() {
            self.renderer.hide_image(&name);
        }
        let (sounds, videos) = self.media_state.clear();
        for name in videos {
            self.media.stop_video(&name);
        }
        for name in sounds {
            self.media.stop_sound(&name);
        }
        self.wait_deadline = None;
    }

    /// Parse, vet and run one expression. Anything refused along the way is
    /// logged and yields `None`.
    pub fn safe_eval(&mut self, expression: &str) -> Option<Value> {
        let call = match prepare_call(expression) {
            Ok(call) => call,
            Err(err) => {
                log!(refusal_level(&err), "refusing to evaluate '{expression}': {err}");
                return None;
            }
        };
        let Some(entry) = self.handlers.get(call.info.name).copied() else {
            error!("no handler is available for '{}'", call.info.name);
            return None;
        };

        let args = match BoundArgs::bind(call.info, &call.arguments) {
            Ok(args) => args,
            Err(err) => {
                warn!("'{expression}': {err}");
                if let LogPolicy::Record { .. } = entry.logging {
                    let mut record = self.new_record("Action", call.info.name, Outcome::invalid(err.reason_code()));
                    record.params = call
                        .arguments
                        .iter()
                        .enumerate()
                        .map(|(index, argument)| {
                            let name = argument.name.clone().unwrap_or_else(|| format!("arg{index}"));
                            (name, literal_to_json(&argument.value))
                        })
                        .collect();
                    self.data_log.append(record);
                }
                return None;
            }
        };

        let result = (entry.handler)(self, &args);

        if let LogPolicy::Record { target } = entry.logging {
            if !args.skiplog() {
                let outcome = match &result {
                    Ok(_) => Outcome::Valid,
                    Err(err) => Outcome::invalid(err.reason_code()),
                };
                let mut record = self.new_record("Action", call.info.name, outcome);
                record.params = args.to_log_params();
                record.target = target.and_then(|name| args.get(name)).map(literal_to_json);
                self.data_log.append(record);
            }
        }

        match result {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("{} refused: {err}", call.info.name);
                None
            }
        }
    }

    /// Run `action` when `condition` is blank or evaluates to true.
    pub fn do_action(&mut self, condition: &str, action: &str) {
        if !condition.trim().is_empty() && self.safe_eval(condition) != Some(Value::Bool(true)) {
            debug!("condition '{condition}' not met; skipping '{action}'");
            return;
        }
        self.safe_eval(action);
    }

    /// Run every `(condition, action)` pair in order until one of them
    /// requests a transition.
    pub(crate) fn fire(&mut self, rules: Vec<(String, String)>) {
        for (condition, action) in rules {
            if self.transition.is_some() {
                break;
            }
            self.do_action(&condition, &action);
        }
    }

    /// Fire every timer of the current view that is due now.
    pub fn tick(&mut self) -> usize {
        let mut fired = 0;
        while self.transition.is_none() {
            let now = self.clock.now();
            let Some(timer) = self.timers.pop_due(now, self.generation) else {
                break;
            };
            debug!("timer for rule {} fired at {:?}", timer.rule_id, now);
            self.do_action(&timer.condition, &timer.action);
            fired += 1;
        }
        fired
    }

    /// Let time pass until `deadline`, firing timers as they come due. A view
    /// change requested on the way is completed at once so the new view's
    /// timers see the rest of the wait. A requested quit stops the clock.
    pub fn run_until(&mut self, deadline: Duration) {
        loop {
            match self.transition {
                Some(Transition::Quit) => return,
                Some(Transition::View { view_id }) => {
                    if let Err(err) = self.enter_view(view_id) {
                        error!("unable to complete transition: {err}");
                        self.transition = None;
                    }
                    continue;
                }
                None => {}
            }
            match self.timers.next_due(self.generation) {
                Some(due) if due <= deadline => {
                    self.clock.wait_until(due);
                    self.tick();
                }
                _ => break,
            }
        }
        self.clock.wait_until(deadline);
    }

    pub fn run_for(&mut self, duration: Duration) {
        let deadline = self.clock.now().saturating_add(duration);
        self.run_until(deadline);
    }

    /// Block the running rule for `duration` while timers keep firing. A call
    /// made while a wait is already active moves that wait's deadline instead
    /// of nesting another one.
    pub fn sleep(&mut self, duration: Duration) {
        let deadline = self.clock.now().saturating_add(duration);
        if self.wait_deadline.replace(deadline).is_some() {
            debug!("extending active wait to {deadline:?}");
            return;
        }

        while let Some(deadline) = self.wait_deadline {
            if self.transition.is_some() || self.clock.now() >= deadline {
                break;
            }
            match self.timers.next_due(self.generation) {
                Some(due) if due < deadline => {
                    self.clock.wait_until(due);
                    self.tick();
                }
                _ => self.clock.wait_until(deadline),
            }
        }
        self.wait_deadline = None;
    }

    pub fn take_transition(&mut self) -> Option<Transition> {
        self.transition.take()
    }

    /// Complete a pending transition and fire anything due in the new view.
    /// Returns `false` once the environment has quit.
    pub fn settle(&mut self) -> Result<bool, EngineError> {
        loop {
            match self.take_transition() {
                Some(Transition::Quit) => return Ok(false),
                Some(Transition::View { view_id }) => self.enter_view(view_id)?,
                None => {}
            }
            self.tick();
            if self.transition.is_none() {
                return Ok(true);
            }
        }
    }

    pub(crate) fn request_transition(&mut self, transition: Transition) {
        self.transition = Some(transition);
    }

    pub(crate) fn new_record(&self, kind: &str, event_type: &str, result: Outcome) -> DataRecord {
        let now = self.clock.now();
        DataRecord {
            kind: kind.to_string(),
            event_type: event_type.to_string(),
            view: self.current_view_label(),
            params: BTreeMap::new(),
            source: None,
            target: None,
            result,
            total_time: now.as_secs_f64(),
            view_time: now.saturating_sub(self.view_entered_at).as_secs_f64(),
        }
    }

    pub(crate) fn record_mouse(
        &mut self,
        event_type: &str,
        source: Option<JsonValue>,
        target: Option<JsonValue>,
        result: Outcome,
    ) {
        let mut record = self.new_record("Mouse", event_type, result);
        record.source = source;
        record.target = target;
        self.data_log.append(record);
    }

    fn current_view_label(&self) -> String {
        match self.current_view().filter(|view| !view.name.is_empty()) {
            Some(view) => view.name.clone(),
            None => self
                .current_view
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    pub fn run_options(&self) -> &RunOptions {
        &self.run
    }

    pub fn data_log(&self) -> &DataLog {
        &self.data_log
    }

    pub fn current_view_id(&self) -> Option<ViewId> {
        self.current_view
    }

    pub fn current_view(&self) -> Option<&View> {
        self.current_view.and_then(|id| self.environment.view(id))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn view_elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.view_entered_at)
    }

    pub fn key_buffer(&self) -> &str {
        self.keyboard.as_str()
    }

    pub fn pockets(&self) -> &[Option<PocketItem>] {
        self.pockets.slots()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn pending_transition(&self) -> Option<Transition> {
        self.transition
    }

    pub fn displayed_images(&self) -> impl Iterator<Item = &str> {
        self.display.images.keys().map(String::as_str)
    }

    pub fn cursor_visible(&self) -> bool {
        self.display.cursor_visible
    }

    pub fn pockets_visible(&self) -> bool {
        self.display.pockets_visible
    }

    pub fn playing_sounds(&self) -> impl Iterator<Item = &str> {
        self.media_state.sounds.keys().map(String::as_str)
    }

    pub fn playing_videos(&self) -> impl Iterator<Item = &str> {
        self.media_state.videos.keys().map(String::as_str)
    }
}

/// Non-constant arguments are critical; anything else is a plain warning.
fn refusal_level(err: &ParseError) -> Level {
    match err {
        ParseError::UnsafeArgument { source, .. } if !source.is_syntax() => Level::Error,
        _ => Level::Warn,
    }
}

fn nav_rules_for(view: &View) -> BTreeMap<NavZone, Vec<RuleId>> {
    NavZone::ALL
        .into_iter()
        .filter_map(|zone| {
            let ids: Vec<RuleId> = view
                .actions
                .values()
                .filter(|rule| rule.trigger.trim_start().starts_with(zone.trigger_name()))
                .map(|rule| rule.id)
                .collect();
            (!ids.is_empty()).then_some((zone, ids))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use gems_expr::{LiteralError, NodeKind};

    use super::*;

    #[test]
    fn only_non_constant_arguments_are_logged_as_errors() {
        let unsafe_arg = ParseError::UnsafeArgument {
            argument: "os".into(),
            source: LiteralError::NotConstant {
                text: "os".into(),
                kind: NodeKind::Name,
            },
        };
        assert_eq!(refusal_level(&unsafe_arg), Level::Error);

        let malformed_arg = ParseError::UnsafeArgument {
            argument: "'open".into(),
            source: LiteralError::Syntax {
                text: "'open".into(),
                offset: 5,
                message: "unterminated string".into(),
            },
        };
        assert_eq!(refusal_level(&malformed_arg), Level::Warn);
        assert_eq!(refusal_level(&ParseError::MalformedExpression("x".into())), Level::Warn);
        assert_eq!(refusal_level(&ParseError::UnknownApiName("Explode".into())), Level::Warn);
    }
}
