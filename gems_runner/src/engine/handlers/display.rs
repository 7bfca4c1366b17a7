use gems_expr::Literal;
use log::{info, warn};

use crate::engine::media::{media_name, resolve_media};
use crate::engine::{interpolate, BoundArgs, EngineContext, HandlerError, HandlerResult, HandlerTable, Value};
use crate::host::{DialogKind, DialogRequest, ImageRequest, InputRequest, TextRequest};

pub(super) fn register(table: &mut HandlerTable) {
    table.register("TextBox", text_box, None);
    table.register("TextBoxHTML", text_box_html, None);
    table.register("ShowImage", show_image, Some("image_file"));
    table.register("ShowImageWithin", show_image_within, Some("image_file"));
    table.register("HideImage", hide_image, Some("image_file"));
    table.register("TextDialog", text_dialog, None);
    table.register("InputDialog", input_dialog, Some("variable"));
}

fn text_box(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    show_text(ctx, args, false)
}

fn text_box_html(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    show_text(ctx, args, true)
}

fn show_text(ctx: &mut EngineContext, args: &BoundArgs, html: bool) -> HandlerResult {
    let left = args.int("left")?;
    let top = args.int("top")?;
    let request = TextRequest {
        message: interpolate(&args.string("message")?, &ctx.environment.variables),
        html,
        left,
        top,
        at_cursor: (left, top) == (-1, -1),
        duration_secs: args.float("duration")?.max(0.0),
        foreground: rgba(args.list("fgcolor")?)?,
        background: rgba(args.list("bgcolor")?)?,
        font_size: args.int("font_size")?,
        bold: args.boolean("bold")?,
    };
    ctx.renderer.display_text(&request);
    ctx.display.texts.push(request);
    Ok(Value::Unit)
}

/// The last four entries of a colour list; a bare `[r, g, b]` is opaque.
/// Leading entries such as a colour name are ignored.
fn rgba(items: &[Literal]) -> Result<[u8; 4], HandlerError> {
    let tail = match items.len() {
        0..=2 => {
            return Err(HandlerError::BadArguments(format!(
                "colours need at least 3 channels, got {}",
                items.len()
            )))
        }
        3 => items,
        len => &items[len - 4..],
    };
    let mut channels = [255u8; 4];
    for (slot, item) in channels.iter_mut().zip(tail) {
        *slot = item
            .as_int()
            .map(|value| value.clamp(0, 255) as u8)
            .ok_or_else(|| HandlerError::BadArguments(format!("colour channel {} is not a number", item.repr())))?;
    }
    Ok(channels)
}

fn show_image(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let placement = Placement {
        left: args.int("left")?,
        top: args.int("top")?,
        size: None,
    };
    display_image(ctx, args, placement)
}

fn show_image_within(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let within = args.int("within")?;
    let bounds = ctx
        .current_view()
        .and_then(|view| view.objects.get(&within))
        .map(|object| object.geometry);
    let placement = match bounds {
        Some(geometry) => Placement {
            left: i64::from(geometry.left),
            top: i64::from(geometry.top),
            size: Some((i64::from(geometry.width), i64::from(geometry.height))),
        },
        None => {
            if within >= 0 {
                info!("object {within} is not in this view; placing image at left/top instead");
            }
            Placement {
                left: args.int("left")?,
                top: args.int("top")?,
                size: None,
            }
        }
    };
    display_image(ctx, args, placement)
}

struct Placement {
    left: i64,
    top: i64,
    size: Option<(i64, i64)>,
}

fn display_image(ctx: &mut EngineContext, args: &BoundArgs, placement: Placement) -> HandlerResult {
    let file = args.string("image_file")?;
    let name = media_name(&file);
    if let Some(existing) = ctx.display.images.get(&name) {
        ctx.renderer.display_image(existing);
        return Ok(Value::Unit);
    }

    let path = resolve_media(&ctx.run.media_path, &file)?;
    let request = ImageRequest {
        name: name.clone(),
        path,
        left: placement.left,
        top: placement.top,
        size: placement.size,
        duration_secs: args.float("duration")?.max(0.0),
        click_through: args.boolean("click_through")?,
    };
    ctx.renderer.display_image(&request);
    ctx.display.images.insert(name, request);
    Ok(Value::Unit)
}

fn hide_image(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let file = args.string("image_file")?;
    let name = media_name(&file);
    if ctx.display.images.remove(&name).is_none() {
        return Err(HandlerError::ImageDoesNotExist(file));
    }
    ctx.renderer.hide_image(&name);
    Ok(Value::Unit)
}

fn text_dialog(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let kind = match args.string("dialog_kind")?.as_str() {
        "info" => DialogKind::Info,
        "warn" => DialogKind::Warn,
        "error" => DialogKind::Error,
        other => {
            warn!("unknown dialog kind {other:?}; using info");
            DialogKind::Info
        }
    };
    let request = DialogRequest {
        message: interpolate(&args.string("message")?, &ctx.environment.variables),
        title: args.string("title")?,
        kind,
    };
    ctx.renderer.show_dialog(&request);
    Ok(Value::Unit)
}

fn input_dialog(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let variables = &ctx.environment.variables;
    let request = InputRequest {
        prompt: interpolate(&args.string("prompt")?, variables),
        title: interpolate(&args.string("title")?, variables),
        default: interpolate(&args.string("default")?, variables),
    };
    let variable = args.string("variable")?;
    match ctx.renderer.prompt_input(&request) {
        Some(answer) => ctx.environment.variables.set(variable, answer),
        None => info!("input dialog for {variable} was dismissed"),
    }
    Ok(Value::Unit)
}
