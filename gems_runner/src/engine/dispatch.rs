use std::collections::BTreeMap;
use std::fmt;

use gems_expr::{lookup, ApiInfo, ApiKind};
use log::warn;

use super::args::BoundArgs;
use super::error::HandlerError;
use super::EngineContext;

/// What a handler hands back to `safe_eval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Unit,
    Bool(bool),
}

pub type HandlerResult = Result<Value, HandlerError>;
pub type Handler = fn(&mut EngineContext, &BoundArgs) -> HandlerResult;

/// Whether an invocation leaves a data record behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPolicy {
    Silent,
    /// Record under `Kind: Action`; `target` names the parameter copied into
    /// the `Target` column.
    Record { target: Option<&'static str> },
}

#[derive(Clone, Copy)]
pub struct HandlerEntry {
    pub info: &'static ApiInfo,
    pub handler: Handler,
    pub logging: LogPolicy,
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("name", &self.info.name)
            .field("logging", &self.logging)
            .finish()
    }
}

/// Name to handler lookup, filled once per engine.
#[derive(Debug, Default, Clone)]
pub struct HandlerTable {
    entries: BTreeMap<&'static str, HandlerEntry>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every GEMS condition, trigger and action.
    pub fn standard() -> Self {
        let mut table = Self::new();
        super::handlers::register_all(&mut table);
        table
    }

    /// Actions are recorded with `target` as their `Target` column;
    /// conditions and triggers are silent.
    pub fn register(&mut self, name: &'static str, handler: Handler, target: Option<&'static str>) {
        let Some(info) = lookup(name) else {
            warn!("not registering handler for unknown name {name}");
            return;
        };
        let logging = match info.kind {
            ApiKind::Action => LogPolicy::Record { target },
            ApiKind::Condition | ApiKind::Trigger => LogPolicy::Silent,
        };
        self.entries.insert(info.name, HandlerEntry { info, handler, logging });
    }

    pub fn get(&self, name: &str) -> Option<&HandlerEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gems_expr::api::API;

    #[test]
    fn every_vocabulary_name_has_a_handler() {
        let table = HandlerTable::standard();
        for info in API {
            assert!(table.get(info.name).is_some(), "{} has no handler", info.name);
        }
        assert_eq!(table.len(), API.len());
    }

    #[test]
    fn only_actions_are_recorded() {
        let table = HandlerTable::standard();
        assert_eq!(table.get("VarExists").map(|e| e.logging), Some(LogPolicy::Silent));
        assert_eq!(table.get("MouseClick").map(|e| e.logging), Some(LogPolicy::Silent));
        assert_eq!(
            table.get("ShowObject").map(|e| e.logging),
            Some(LogPolicy::Record { target: Some("object_id") })
        );
    }

    #[test]
    fn unknown_names_are_not_registered() {
        fn noop(_: &mut EngineContext, _: &BoundArgs) -> HandlerResult {
            Ok(Value::Unit)
        }
        let mut table = HandlerTable::new();
        table.register("Explode", noop, None);
        assert!(table.is_empty());
    }
}
