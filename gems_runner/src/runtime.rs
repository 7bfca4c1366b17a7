use std::fs;
use std::rc::Rc;

use anyhow::{Context, Result};
use gems_expr::api::API;
use gems_expr::ApiKind;
use log::{info, warn};
use serde::Serialize;

use crate::cli::RunArgs;
use crate::clock::{Clock, ManualClock, SystemClock};
use crate::engine::{Collaborators, EngineContext};
use crate::environment::ViewId;
use crate::host_bridge::{HostEvent, RecordingHost};
use crate::input::{load_script, InputEvent};
use crate::session::Session;

/// What a replayed run ended with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub environment: String,
    pub final_view: Option<ViewId>,
    pub quit: bool,
    pub events_replayed: usize,
    pub records: usize,
    pub elapsed_secs: f64,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let RunArgs {
        session,
        events,
        host_log_json,
        realtime,
    } = args;

    let session = Session::setup(&session)?;
    let script = match events.as_ref() {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };
    let clock: Rc<dyn Clock> = if realtime {
        Rc::new(SystemClock::start())
    } else {
        Rc::new(ManualClock::new())
    };

    let host = RecordingHost::new();
    let (summary, data_path) = replay(session, &host, clock, &script)?;

    if let Some(path) = host_log_json.as_ref() {
        write_host_log(path, &host.events())?;
        println!("Saved host event log to {}", path.display());
    }

    println!(
        "{}: replayed {} event(s), {} data record(s), {:.1}s elapsed",
        summary.environment, summary.events_replayed, summary.records, summary.elapsed_secs
    );
    match summary.final_view {
        Some(view) if !summary.quit => println!("Final view: {view}"),
        _ => println!("Environment quit"),
    }
    if let Some(path) = data_path {
        println!("Data written to {}", path);
    }
    Ok(())
}

/// Start the environment and feed it `script`, settling transitions after
/// every event. Stops early when a rule quits.
pub fn replay(
    session: Session,
    host: &RecordingHost,
    clock: Rc<dyn Clock>,
    script: &[InputEvent],
) -> Result<(RunSummary, Option<String>)> {
    let mut engine = EngineContext::new(session, Collaborators::recording(host, clock));
    engine.start().context("starting environment")?;

    let mut running = engine.settle()?;
    let mut replayed = 0;
    for event in script {
        if !running {
            warn!("environment quit; {} event(s) not replayed", script.len() - replayed);
            break;
        }
        match event {
            InputEvent::Answer { text } => host.queue_answer(text.clone()),
            other => other.apply(&mut engine),
        }
        replayed += 1;
        running = engine
            .settle()
            .with_context(|| format!("settling after event {replayed}"))?;
    }
    info!("replay finished after {replayed} event(s)");

    let summary = RunSummary {
        environment: engine.environment().name.clone(),
        final_view: engine.current_view_id(),
        quit: !running,
        events_replayed: replayed,
        records: engine.data_log().len(),
        elapsed_secs: engine.now().as_secs_f64(),
    };
    let data_path = engine
        .data_log()
        .path()
        .map(|path| path.display().to_string());
    Ok((summary, data_path))
}

fn write_host_log(path: &std::path::Path, events: &[HostEvent]) -> Result<()> {
    let json = serde_json::to_string_pretty(events).context("serializing host events to JSON")?;
    fs::write(path, json).with_context(|| format!("writing host event log to {}", path.display()))
}

pub fn print_api() {
    for (kind, title) in [
        (ApiKind::Condition, "Conditions"),
        (ApiKind::Trigger, "Triggers"),
        (ApiKind::Action, "Actions"),
    ] {
        println!("{title}:");
        for info in API.iter().filter(|info| info.kind == kind) {
            println!("  {:<48} [{}] {}", info.signature(), info.scope, info.help);
        }
    }
}
