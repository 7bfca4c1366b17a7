use log::debug;

use crate::engine::{BoundArgs, EngineContext, HandlerError, HandlerResult, HandlerTable, Value};

pub(super) fn register(table: &mut HandlerTable) {
    table.register("SetVariable", set_variable, None);
    table.register("DelVariable", del_variable, None);
    table.register("VarIncrease", var_increase, None);
    table.register("VarDecrease", var_decrease, None);
    table.register("ClearKeyBuffer", clear_key_buffer, None);
}

fn set_variable(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let name = args.string("variable")?;
    let value = args.string("value")?;
    debug!("{name} = {value:?}");
    ctx.environment.variables.set(name, value);
    Ok(Value::Unit)
}

fn del_variable(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let name = args.string("variable")?;
    match ctx.environment.variables.remove(&name) {
        Some(_) => Ok(Value::Unit),
        None => Err(HandlerError::NoSuchVarExists(name)),
    }
}

fn var_increase(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let name = args.string("variable")?;
    let value = ctx.environment.variables.increase(&name);
    debug!("{name} increased to {value}");
    Ok(Value::Unit)
}

fn var_decrease(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let name = args.string("variable")?;
    let value = ctx.environment.variables.decrease(&name);
    debug!("{name} decreased to {value}");
    Ok(Value::Unit)
}

fn clear_key_buffer(ctx: &mut EngineContext, _args: &BoundArgs) -> HandlerResult {
    ctx.keyboard.clear();
    Ok(Value::Unit)
}
