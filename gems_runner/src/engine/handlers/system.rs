use crate::engine::{BoundArgs, EngineContext, HandlerResult, HandlerTable, Transition, Value};

pub(super) fn register(table: &mut HandlerTable) {
    table.register("ShowURL", show_url, Some("url"));
    table.register("Quit", quit, None);
    table.register("HideMouse", hide_mouse, None);
    table.register("ShowMouse", show_mouse, None);
    table.register("HidePockets", hide_pockets, None);
    table.register("ShowPockets", show_pockets, None);
}

fn show_url(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    ctx.renderer.open_url(&args.string("url")?);
    Ok(Value::Unit)
}

fn quit(ctx: &mut EngineContext, _args: &BoundArgs) -> HandlerResult {
    ctx.renderer.request_quit();
    ctx.request_transition(Transition::Quit);
    Ok(Value::Unit)
}

fn set_cursor(ctx: &mut EngineContext, visible: bool) -> HandlerResult {
    ctx.display.cursor_visible = visible;
    ctx.renderer.set_cursor_visible(visible);
    Ok(Value::Unit)
}

fn hide_mouse(ctx: &mut EngineContext, _args: &BoundArgs) -> HandlerResult {
    set_cursor(ctx, false)
}

fn show_mouse(ctx: &mut EngineContext, _args: &BoundArgs) -> HandlerResult {
    set_cursor(ctx, true)
}

fn set_pockets(ctx: &mut EngineContext, visible: bool) -> HandlerResult {
    ctx.display.pockets_visible = visible;
    ctx.renderer.set_pockets_visible(visible);
    Ok(Value::Unit)
}

fn hide_pockets(ctx: &mut EngineContext, _args: &BoundArgs) -> HandlerResult {
    set_pockets(ctx, false)
}

fn show_pockets(ctx: &mut EngineContext, _args: &BoundArgs) -> HandlerResult {
    set_pockets(ctx, true)
}
