//! Builtin handlers, one per GEMS vocabulary name.

use super::dispatch::HandlerTable;

mod conditions;
mod display;
mod media;
mod objects;
mod system;
mod triggers;
mod variables;

pub(super) fn register_all(table: &mut HandlerTable) {
    conditions::register(table);
    triggers::register(table);
    variables::register(table);
    objects::register(table);
    display::register(table);
    media::register(table);
    system::register(table);
}
