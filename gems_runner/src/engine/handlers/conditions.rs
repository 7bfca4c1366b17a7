use std::time::Duration;

use crate::engine::{BoundArgs, EngineContext, HandlerResult, HandlerTable, Value};

pub(super) fn register(table: &mut HandlerTable) {
    table.register("VarValueIs", var_value_is, None);
    table.register("VarValueIsNot", var_value_is_not, None);
    table.register("VarExists", var_exists, None);
    table.register("VarMissing", var_missing, None);
    table.register("VarCountEq", var_count_eq, None);
    table.register("VarCountGtEq", var_count_gt_eq, None);
    table.register("VarCountLtEq", var_count_lt_eq, None);
    table.register("KeyBufferContains", key_buffer_contains, None);
    table.register("KeyBufferContainsIgnoreCase", key_buffer_contains_ignore_case, None);
    table.register("KeyBufferLacks", key_buffer_lacks, None);
    table.register("HasViewTimePassed", has_view_time_passed, None);
    table.register("HasTotalTimePassed", has_total_time_passed, None);
}

fn var_value_is(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let name = args.string("variable")?;
    let value = args.string("value")?;
    Ok(Value::Bool(ctx.environment.variables.value_is(&name, &value)))
}

fn var_value_is_not(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let name = args.string("variable")?;
    let value = args.string("value")?;
    Ok(Value::Bool(!ctx.environment.variables.value_is(&name, &value)))
}

fn var_exists(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let name = args.string("variable")?;
    Ok(Value::Bool(ctx.environment.variables.contains(&name)))
}

fn var_missing(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let name = args.string("variable")?;
    Ok(Value::Bool(!ctx.environment.variables.contains(&name)))
}

fn variable_count(ctx: &EngineContext) -> i64 {
    i64::try_from(ctx.environment.variables.len()).unwrap_or(i64::MAX)
}

fn var_count_eq(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    Ok(Value::Bool(variable_count(ctx) == args.int("count")?))
}

fn var_count_gt_eq(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    Ok(Value::Bool(variable_count(ctx) >= args.int("count")?))
}

fn var_count_lt_eq(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    Ok(Value::Bool(variable_count(ctx) <= args.int("count")?))
}

fn key_buffer_contains(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let characters = args.string("characters")?;
    let ignore_case = args.boolean("ignore_case")?;
    Ok(Value::Bool(ctx.keyboard.contains(&characters, ignore_case)))
}

fn key_buffer_contains_ignore_case(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let characters = args.string("characters")?;
    Ok(Value::Bool(ctx.keyboard.contains(&characters, true)))
}

fn key_buffer_lacks(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let characters = args.string("characters")?;
    let ignore_case = args.boolean("ignore_case")?;
    Ok(Value::Bool(!ctx.keyboard.contains(&characters, ignore_case)))
}

/// Strictly more than `seconds` must have passed.
pub(super) fn passed(elapsed: Duration, seconds: f64) -> bool {
    elapsed.as_secs_f64() > seconds
}

fn has_view_time_passed(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    Ok(Value::Bool(passed(ctx.view_elapsed(), args.float("seconds")?)))
}

fn has_total_time_passed(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    Ok(Value::Bool(passed(ctx.now(), args.float("seconds")?)))
}
