use log::{debug, warn};

use crate::engine::media::{is_animation, media_name, resolve_media};
use crate::engine::{interpolate, BoundArgs, EngineContext, HandlerError, HandlerResult, HandlerTable, Value};
use crate::host::{SoundRequest, VideoRequest};

pub(super) fn register(table: &mut HandlerTable) {
    table.register("PlaySound", play_sound, Some("sound_file"));
    table.register("StopSound", stop_sound, Some("sound_file"));
    table.register("StopAllSounds", stop_all_sounds, None);
    table.register("PlayVideo", play_video, Some("video_file"));
    table.register("StopVideo", stop_video, Some("video_file"));
    table.register("StopAllVideos", stop_all_videos, None);
    table.register("SayText", say_text, None);
}

fn require_media(ctx: &EngineContext) -> Result<(), HandlerError> {
    if ctx.run.play_media {
        Ok(())
    } else {
        warn!("media playback is not enabled");
        Err(HandlerError::MediaDisabled)
    }
}

fn play_sound(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    require_media(ctx)?;
    let file = args.string("sound_file")?;
    let path = resolve_media(&ctx.run.media_path, &file)?;
    let name = media_name(&file);
    if ctx.media_state.sounds.contains_key(&name) {
        debug!("restarting sound {name}");
        ctx.media.stop_sound(&name);
    }

    let request = SoundRequest {
        name: name.clone(),
        path: path.clone(),
        asynchronous: args.boolean("asynchronous")?,
        volume: ctx.environment.options.volume * args.float("volume")?,
        looped: args.boolean("loop")?,
    };
    let length = ctx.media.play_sound(&request)?;
    ctx.media_state.sounds.insert(name, path);

    if !request.asynchronous {
        match length {
            Some(length) => ctx.sleep(length),
            None => debug!("length of {file} is unknown; not waiting for it"),
        }
    }
    Ok(Value::Unit)
}

fn stop_sound(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    require_media(ctx)?;
    let file = args.string("sound_file")?;
    let name = media_name(&file);
    if ctx.media_state.sounds.remove(&name).is_none() {
        return Err(HandlerError::SoundDoesNotExist(file));
    }
    ctx.media.stop_sound(&name);
    Ok(Value::Unit)
}

fn stop_all_sounds(ctx: &mut EngineContext, _args: &BoundArgs) -> HandlerResult {
    require_media(ctx)?;
    ctx.media_state.sounds.clear();
    ctx.media.stop_all_sounds();
    Ok(Value::Unit)
}

fn play_video(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let file = args.string("video_file")?;
    let path = resolve_media(&ctx.run.media_path, &file)?;
    if !is_animation(&path) {
        require_media(ctx)?;
    }
    let name = media_name(&file);
    if ctx.media_state.videos.remove(&name).is_some() {
        ctx.media.stop_video(&name);
    }

    let within = args.int("within")?;
    let bounds = ctx
        .current_view()
        .and_then(|view| view.objects.get(&within))
        .filter(|object| object.visible)
        .map(|object| object.geometry);
    let (left, top, size) = match bounds {
        Some(geometry) => {
            ctx.renderer.hide_object(within);
            (
                i64::from(geometry.left),
                i64::from(geometry.top),
                Some((i64::from(geometry.width), i64::from(geometry.height))),
            )
        }
        None => {
            if within >= 0 {
                warn!("object {within} is not visible in this view; playing {file} over the whole view");
            }
            (0, 0, None)
        }
    };

    let request = VideoRequest {
        name: name.clone(),
        path: path.clone(),
        start_secs: args.int("start")?.max(0),
        left,
        top,
        size,
        volume: ctx.environment.options.volume * args.float("volume")?,
        looped: args.boolean("loop")?,
    };
    ctx.media.play_video(&request)?;
    ctx.media_state.videos.insert(name, path);
    Ok(Value::Unit)
}

fn stop_video(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    let file = args.string("video_file")?;
    let name = media_name(&file);
    if ctx.media_state.videos.remove(&name).is_none() {
        return Err(HandlerError::VideoNotPlaying(file));
    }
    ctx.media.stop_video(&name);
    Ok(Value::Unit)
}

fn stop_all_videos(ctx: &mut EngineContext, _args: &BoundArgs) -> HandlerResult {
    let names: Vec<String> = std::mem::take(&mut ctx.media_state.videos).into_keys().collect();
    for name in names {
        ctx.media.stop_video(&name);
    }
    Ok(Value::Unit)
}

fn say_text(ctx: &mut EngineContext, args: &BoundArgs) -> HandlerResult {
    require_media(ctx)?;
    if !ctx.run.tts_enabled {
        warn!("text to speech is not enabled");
        return Err(HandlerError::TtsDisabled);
    }
    let text = interpolate(&args.string("message")?, &ctx.environment.variables);
    ctx.media.speak(&text)?;
    Ok(Value::Unit)
}
