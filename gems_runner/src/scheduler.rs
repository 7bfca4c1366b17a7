use std::collections::BTreeMap;
use std::time::Duration;

use gems_expr::{parse_literal, strip_param_name, valid_api_call};
use log::{debug, warn};
use serde::Serialize;

use crate::environment::{Environment, Rule, RuleId, ViewId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    Global,
    View,
}

/// Time-based trigger parsed from a rule's trigger text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeTrigger {
    Total(f64),
    View(f64),
}

impl TimeTrigger {
    pub fn parse(trigger: &str) -> Option<Self> {
        let call = valid_api_call(trigger)?;
        let make: fn(f64) -> TimeTrigger = match call.name.as_str() {
            "TotalTimePassed" => TimeTrigger::Total,
            "ViewTimePassed" => TimeTrigger::View,
            _ => return None,
        };
        let raw = call.args.first()?;
        match parse_literal(strip_param_name(raw)).ok().and_then(|v| v.as_float()) {
            Some(seconds) if seconds.is_finite() => Some(make(seconds)),
            _ => {
                warn!("ignoring time trigger with a non-numeric delay: {trigger}");
                None
            }
        }
    }
}

/// A single-shot timer owned by the view instance that armed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledRule {
    pub rule_id: RuleId,
    pub scope: RuleScope,
    pub condition: String,
    pub action: String,
    pub generation: u64,
    pub due: Duration,
}

/// Pending timers ordered by due time, then by scheduling order.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: BTreeMap<(Duration, u64), ScheduledRule>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, rule: ScheduledRule) {
        let key = (rule.due, self.next_seq);
        self.next_seq += 1;
        self.pending.insert(key, rule);
    }

    /// Earliest timer of `generation` due at or before `now`. Timers left
    /// over from older generations are discarded on the way.
    pub fn pop_due(&mut self, now: Duration, generation: u64) -> Option<ScheduledRule> {
        loop {
            let (&key, rule) = self.pending.iter().next()?;
            if rule.generation != generation {
                self.pending.remove(&key);
                continue;
            }
            if key.0 > now {
                return None;
            }
            return self.pending.remove(&key);
        }
    }

    pub fn next_due(&self, generation: u64) -> Option<Duration> {
        self.pending
            .values()
            .find(|rule| rule.generation == generation)
            .map(|rule| rule.due)
    }

    pub fn cancel_generation(&mut self, generation: u64) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, rule| rule.generation != generation);
        before - self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl ExactSizeIterator<Item = &ScheduledRule> {
        self.pending.values()
    }
}

/// Session and view elapsed time at the moment a view is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed {
    pub now: Duration,
    pub in_view: Duration,
}

/// Schedule every enabled time-triggered rule for the view being entered.
///
/// Global rules are considered first. A global `TotalTimePassed` rule is
/// disabled as soon as it is scheduled so it fires at most once per session.
pub fn arm(
    environment: &mut Environment,
    view_id: ViewId,
    elapsed: Elapsed,
    generation: u64,
    queue: &mut TimerQueue,
) -> usize {
    let mut armed = 0;

    for rule in environment.global_actions.values_mut() {
        let Some(trigger) = armable(rule) else {
            continue;
        };
        queue.schedule(timer_for(rule, RuleScope::Global, trigger, elapsed, generation));
        if matches!(trigger, TimeTrigger::Total(_)) {
            rule.enabled = false;
        }
        armed += 1;
    }

    if let Some(view) = environment.views.get(&view_id) {
        for rule in view.actions.values() {
            let Some(trigger) = armable(rule) else {
                continue;
            };
            queue.schedule(timer_for(rule, RuleScope::View, trigger, elapsed, generation));
            armed += 1;
        }
    }

    debug!("armed {armed} timer(s) for view {view_id}");
    armed
}

fn armable(rule: &Rule) -> Option<TimeTrigger> {
    if !rule.enabled {
        return None;
    }
    let trigger = TimeTrigger::parse(&rule.trigger)?;
    if valid_api_call(&rule.action).is_none() {
        warn!("rule {} has a time trigger but no usable action: {:?}", rule.id, rule.action);
        return None;
    }
    if !rule.condition.trim().is_empty() && valid_api_call(&rule.condition).is_none() {
        warn!("rule {} has an unusable condition: {:?}", rule.id, rule.condition);
        return None;
    }
    Some(trigger)
}

fn timer_for(
    rule: &Rule,
    scope: RuleScope,
    trigger: TimeTrigger,
    elapsed: Elapsed,
    generation: u64,
) -> ScheduledRule {
    let remaining = match trigger {
        TimeTrigger::Total(seconds) => seconds - elapsed.now.as_secs_f64(),
        TimeTrigger::View(seconds) => seconds - elapsed.in_view.as_secs_f64(),
    };
    let delay = Duration::try_from_secs_f64(remaining.max(0.0)).unwrap_or(Duration::MAX);
    ScheduledRule {
        rule_id: rule.id,
        scope,
        condition: rule.condition.clone(),
        action: rule.action.clone(),
        generation,
        due: elapsed.now.saturating_add(delay),
    }
}
