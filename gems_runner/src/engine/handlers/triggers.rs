//! Triggers are matched against events by the engine, not evaluated. The
//! handlers exist so a trigger name used as a condition behaves predictably:
//! the time triggers answer whether their time has passed, the rest yield
//! nothing and so never satisfy a condition.

use super::conditions::passed;
use crate::engine::{BoundArgs, EngineContext, HandlerResult, HandlerTable, Value};

pub(super) fn register(table: &mut HandlerTable) {
    table.register("ViewTimePassed", view_time_passed, None);
    table.register("TotalTimePassed", total_time_passed, None);
    for name in [
        "MouseClick",
        "MouseHover",
        "KeyPress",
        "DroppedOn",
        "NavLeft",
        "NavRight",
        "NavTop",
        "NavBottom",
    ] {
        table.register(name, event_trigger, None);
    }
}

fn view_time_passed(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    Ok(Value::Bool(passed(ctx.view_elapsed(), args.float("seconds")?)))
}

fn total_time_passed(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    Ok(Value::Bool(passed(ctx.now(), args.float("seconds")?)))
}

fn event_trigger(_ctx: &mut EngineContext, _args: &BoundArgs) -> HandlerResult {
    Ok(Value::Unit)
}
