use std::fs;
use std::rc::Rc;
use std::time::Duration;

use gems_runner::clock::{Clock, ManualClock};
use gems_runner::data_log::DataRecord;
use gems_runner::engine::{Collaborators, EngineContext, NavZone, Value};
use gems_runner::environment::Environment;
use gems_runner::host::ImageRequest;
use gems_runner::host_bridge::{HostEvent, RecordingHost};
use gems_runner::input::InputEvent;
use gems_runner::session::{RunOptions, Session};
use serde_json::json;
use tempfile::TempDir;

const ENVIRONMENT: &str = r#"
Name: Scenarios
Global:
  Options: { Startview: 1, Pocketcount: 3 }
  GlobalActions:
    "1": { Id: 1, Trigger: "TotalTimePassed(2)", Action: "VarIncrease('ticks')" }
Views:
  "1":
    Id: 1
    Name: Lobby
    Foreground: lobby.png
    Objects:
      "3": { Id: 3, Name: Key, Takeable: true, Left: 10, Top: 10, Width: 20, Height: 20 }
      "4": { Id: 4, Name: Desk, Left: 100, Top: 40, Width: 200, Height: 80 }
      "5": { Id: 5, Name: Coin, Takeable: true }
      "6": { Id: 6, Name: Ghost, Visible: false }
      "7":
        Id: 7
        Name: Door
        Left: 300
        Top: 50
        Width: 60
        Height: 120
        Actions:
          "70": { Id: 70, Trigger: "MouseClick()", Action: 'SetVariable("flag", "1")' }
          "71": { Id: 71, Trigger: "DroppedOn(3)", Action: "SetVariable('unlocked', 'yes')" }
          "72": { Id: 72, Trigger: "MouseHover()", Action: "VarIncrease('hovers')" }
    Actions:
      "10": { Id: 10, Trigger: 'KeyPress("a")', Condition: 'VarMissing("seen")', Action: 'SetVariable("seen", "1")' }
      "11": { Id: 11, Trigger: "KeyPress('Return')", Action: "SetVariable('entered', 'yes')" }
      "12": { Id: 12, Trigger: "NavRight()", Action: "PortalTo(2)" }
      "13": { Id: 13, Trigger: "ViewTimePassed(1)", Action: "VarIncrease('visits')" }
  "2":
    Id: 2
    Name: Hall
    Objects:
      "3": { Id: 3, Name: Key, Takeable: true }
    Actions:
      "20": { Id: 20, Trigger: "NavLeft()", Action: "PortalTo(1)" }
      "21": { Id: 21, Trigger: "ViewTimePassed(5)", Action: "SetVariable('late', '1')" }
"#;

struct Harness {
    engine: EngineContext,
    host: RecordingHost,
    clock: Rc<ManualClock>,
    _media: TempDir,
}

fn harness_with(yaml: &str, play_media: bool) -> Harness {
    let media = tempfile::tempdir().expect("media folder");
    for file in ["lobby.png", "pic.png", "ding.wav", "intro.mp4"] {
        fs::write(media.path().join(file), b"media").expect("media file");
    }
    let environment = Environment::from_yaml_str(yaml).expect("environment");
    let run = RunOptions {
        media_path: media.path().to_path_buf(),
        play_media,
        tts_enabled: play_media,
        ..RunOptions::default()
    };
    let host = RecordingHost::new();
    let clock = Rc::new(ManualClock::new());
    let mut engine = EngineContext::new(
        Session::new(environment, run),
        Collaborators::recording(&host, clock.clone()),
    );
    engine.start().expect("start");
    assert!(engine.settle().expect("settle"));
    Harness {
        engine,
        host,
        clock,
        _media: media,
    }
}

fn harness() -> Harness {
    harness_with(ENVIRONMENT, true)
}

fn records<'a>(engine: &'a EngineContext, event_type: &str) -> Vec<&'a DataRecord> {
    engine
        .data_log()
        .records()
        .iter()
        .filter(|record| record.event_type == event_type)
        .collect()
}

fn variable<'a>(engine: &'a EngineContext, name: &str) -> Option<&'a str> {
    engine.environment().variables.get(name)
}

#[test]
fn clicking_sets_a_variable_idempotently() {
    let mut h = harness();
    h.engine.click_object(7);
    assert_eq!(variable(&h.engine, "flag"), Some("1"));
    h.engine.click_object(7);
    assert_eq!(variable(&h.engine, "flag"), Some("1"));

    let clicks = records(&h.engine, "LeftClick");
    assert_eq!(clicks.len(), 2);
    assert_eq!(clicks[0].kind, "Mouse");
    assert_eq!(clicks[0].view, "Lobby");
    assert_eq!(clicks[0].target, Some(json!("Door")));
    assert_eq!(records(&h.engine, "SetVariable").len(), 2);
}

#[test]
fn key_rule_with_missing_condition_fires_once() {
    let mut h = harness();
    h.engine.key_press("a", None);
    h.engine.key_press("a", None);
    assert_eq!(variable(&h.engine, "seen"), Some("1"));
    assert_eq!(records(&h.engine, "SetVariable").len(), 1);
    assert_eq!(records(&h.engine, "KeyPress").len(), 2);
    assert_eq!(h.engine.key_buffer(), "aa");
}

#[test]
fn show_image_within_unknown_object_falls_back_to_left_top() {
    let mut h = harness();
    h.host.clear();
    assert_eq!(
        h.engine.safe_eval("ShowImageWithin('pic.png', within=42, left=15, top=25)"),
        Some(Value::Unit)
    );
    let shown: Vec<ImageRequest> = h
        .host
        .events()
        .into_iter()
        .filter_map(|event| match event {
            HostEvent::DisplayImage(request) => Some(request),
            _ => None,
        })
        .collect();
    assert_eq!(shown.len(), 1);
    assert_eq!((shown[0].left, shown[0].top, shown[0].size), (15, 25, None));

    h.engine.safe_eval("HideImage('pic.png')");
    h.engine.safe_eval("ShowImageWithin('pic.png', 4)");
    let placed = h.host.events().into_iter().rev().find_map(|event| match event {
        HostEvent::DisplayImage(request) => Some(request),
        _ => None,
    });
    let placed = placed.expect("second image");
    assert_eq!((placed.left, placed.top, placed.size), (100, 40, Some((200, 80))));
    assert!(records(&h.engine, "ShowImageWithin").iter().all(|r| r.result.is_valid()));
}

#[test]
fn portal_to_missing_view_keeps_the_current_view() {
    let mut h = harness();
    h.host.clear();
    assert_eq!(h.engine.safe_eval("PortalTo(99)"), None);

    let portals = records(&h.engine, "PortalTo");
    assert_eq!(portals.len(), 1);
    assert_eq!(portals[0].result.to_string(), "Invalid|ViewDoesNotExist");
    assert_eq!(portals[0].target, Some(json!(99)));
    assert_eq!(h.engine.pending_transition(), None);
    assert!(h.engine.settle().expect("settle"));
    assert_eq!(h.engine.current_view_id(), Some(1));
    assert!(h.host.events().is_empty());
}

#[test]
fn nav_zones_move_between_views() {
    let mut h = harness();
    h.engine.click_nav(NavZone::Right);
    assert!(h.engine.settle().expect("settle"));
    assert_eq!(h.engine.current_view_id(), Some(2));
    assert!(h.host.events().contains(&HostEvent::SwitchView { view_id: 2 }));
    assert_eq!(records(&h.engine, "NavRightPressed").len(), 1);

    // view 2 has no right zone
    h.engine.click_nav(NavZone::Right);
    assert_eq!(records(&h.engine, "NavRightPressed").len(), 1);

    h.engine.click_nav(NavZone::Left);
    assert!(h.engine.settle().expect("settle"));
    assert_eq!(h.engine.current_view_id(), Some(1));
}

#[test]
fn global_total_time_rule_fires_once_per_session() {
    let mut h = harness();
    h.engine.run_for(Duration::from_secs(3));
    assert_eq!(variable(&h.engine, "ticks"), Some("1"));
    assert_eq!(variable(&h.engine, "visits"), Some("1"));

    h.engine.click_nav(NavZone::Right);
    h.engine.settle().expect("settle");
    h.engine.click_nav(NavZone::Left);
    h.engine.settle().expect("settle");
    h.engine.run_for(Duration::from_secs(5));

    assert_eq!(variable(&h.engine, "ticks"), Some("1"));
    assert_eq!(variable(&h.engine, "visits"), Some("2"));
    assert_eq!(h.clock.now(), Duration::from_secs(8));
}

#[test]
fn timers_of_a_left_view_never_fire() {
    let mut h = harness();
    h.engine.click_nav(NavZone::Right);
    h.engine.settle().expect("settle");
    h.engine.run_for(Duration::from_secs(1));
    h.engine.click_nav(NavZone::Left);
    h.engine.settle().expect("settle");
    h.engine.run_for(Duration::from_secs(10));
    assert_eq!(variable(&h.engine, "late"), None);
    assert!(h.engine.timers().pending().all(|timer| timer.generation == h.engine.generation()));
}

#[test]
fn unknown_names_and_unsafe_arguments_are_inert() {
    let yaml = r#"
Global:
  Options: { Startview: 1 }
Views:
  "1":
    Id: 1
    Objects:
      "1":
        Id: 1
        Name: Button
        Actions:
          "1": { Id: 1, Trigger: "MouseClick()", Action: "Explode(1)" }
          "2": { Id: 2, Trigger: "MouseClick()", Condition: "Bogus()", Action: "SetVariable('x', 1)" }
          "3": { Id: 3, Trigger: "MouseClick()", Action: "SetVariable('y', __import__('os'))" }
"#;
    let mut h = harness_with(yaml, false);
    h.engine.click_object(1);
    assert!(h.engine.environment().variables.is_empty());
    assert_eq!(h.engine.data_log().records().len(), 1);
    assert_eq!(h.engine.safe_eval("os.system('ls')"), None);
    assert_eq!(h.engine.safe_eval("VarExists('x') or True"), None);
    assert_eq!(h.engine.safe_eval(""), None);

    let nested = format!("SetVariable('x', {}1{})", "[".repeat(5_000), "]".repeat(5_000));
    assert_eq!(h.engine.safe_eval(&nested), None);
    assert!(h.engine.environment().variables.is_empty());
}

#[test]
fn bad_arguments_are_recorded_with_raw_params() {
    let mut h = harness();
    assert_eq!(h.engine.safe_eval("ShowObject('door')"), None);
    let shows = records(&h.engine, "ShowObject");
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0].result.to_string(), "Invalid|BadArguments");
    assert_eq!(shows[0].params.get("arg0"), Some(&json!("door")));
}

#[test]
fn var_value_is_not_complements_var_value_is() {
    let mut h = harness();
    let check = |engine: &mut EngineContext, expr: &str| engine.safe_eval(expr);
    assert_eq!(check(&mut h.engine, "VarValueIs('n', '3')"), Some(Value::Bool(false)));
    assert_eq!(check(&mut h.engine, "VarValueIsNot('n', '3')"), Some(Value::Bool(true)));

    h.engine.safe_eval("SetVariable('n', '3.0')");
    assert_eq!(check(&mut h.engine, "VarValueIs('n', 3)"), Some(Value::Bool(true)));
    assert_eq!(check(&mut h.engine, "VarValueIsNot('n', 3)"), Some(Value::Bool(false)));
    assert_eq!(check(&mut h.engine, "VarValueIs('n', 'three')"), Some(Value::Bool(false)));
    assert_eq!(check(&mut h.engine, "VarValueIsNot('n', 'three')"), Some(Value::Bool(true)));
}

#[test]
fn increase_and_decrease_seed_missing_variables() {
    let mut h = harness();
    h.engine.safe_eval("VarIncrease('score')");
    assert_eq!(variable(&h.engine, "score"), Some("1"));
    h.engine.safe_eval("VarDecrease('score')");
    assert_eq!(variable(&h.engine, "score"), Some("0"));

    h.engine.safe_eval("SetVariable('level', '2.0')");
    h.engine.safe_eval("VarIncrease('level')");
    assert_eq!(variable(&h.engine, "level"), Some("3"));

    h.engine.safe_eval("DelVariable('level')");
    h.engine.safe_eval("DelVariable('level')");
    let deletes = records(&h.engine, "DelVariable");
    assert_eq!(deletes[1].result.to_string(), "Invalid|NoSuchVarExists");
}

#[test]
fn drops_fire_matching_rules() {
    let mut h = harness();
    h.engine.drop_object(3, 7);
    assert_eq!(variable(&h.engine, "unlocked"), Some("yes"));
    h.engine.drop_object(5, 7);
    h.engine.drop_on_nothing(3);
    h.engine.drop_object(6, 6);

    let drops = records(&h.engine, "ObjectDragDrop");
    let results: Vec<String> = drops.iter().map(|r| r.result.to_string()).collect();
    assert_eq!(results, ["Valid|Interaction", "Invalid|Interaction", "Invalid|NoTarget"]);
    assert_eq!(drops[0].source, Some(json!(3)));
    assert_eq!(drops[0].target, Some(json!(7)));
    assert_eq!(drops[2].target, None);
}

#[test]
fn pockets_hold_takeable_objects() {
    let mut h = harness();
    assert!(h.engine.drop_on_pocket(3, 0));
    assert!(!h.engine.drop_on_pocket(4, 1));
    assert!(!h.engine.drop_on_pocket(3, 1));
    assert!(!h.engine.drop_on_pocket(5, 0));
    assert!(!h.engine.drop_on_pocket(6, 2));

    let results: Vec<String> = records(&h.engine, "PocketDragDrop")
        .iter()
        .map(|r| r.result.to_string())
        .collect();
    assert_eq!(
        results,
        [
            "Valid",
            "Invalid|ObjNotTakeable",
            "Invalid|ObjAlreadyInPocket",
            "Invalid|FullPocket",
            "Invalid|ObjectDoesNotExist",
        ]
    );
    let held = h.engine.pockets()[0].clone().expect("pocket 0");
    assert_eq!((held.object_id, held.view_id, held.name.as_str()), (3, 1, "Key"));

    // pocketed objects are hidden everywhere, so they cannot be clicked
    let lobby_key = &h.engine.environment().views[&1].objects[&3];
    assert!(!lobby_key.visible);

    h.engine.pocket_click(0);
    h.engine.pocket_right_click(0);
    h.engine.pocket_right_click(0);
    let right_clicks: Vec<String> = records(&h.engine, "PocketObjectRightClick")
        .iter()
        .map(|r| r.result.to_string())
        .collect();
    assert_eq!(right_clicks, ["Valid", "Invalid|EmptyPocket"]);
    assert!(h.engine.environment().views[&1].objects[&3].visible);
    assert!(h.host.events().contains(&HostEvent::ShowObject { object_id: 3 }));
    assert_eq!(records(&h.engine, "PocketObjectLeftClick")[0].target, Some(json!("Key")));
}

#[test]
fn hide_object_changes_every_copy_and_honours_skiplog() {
    let mut h = harness();
    h.engine.safe_eval("HideObject(3, skiplog=True)");
    assert!(records(&h.engine, "HideObject").is_empty());
    for view in h.engine.environment().views.values() {
        assert!(!view.objects[&3].visible);
    }

    h.engine.safe_eval("ShowObject(3)");
    let shows = records(&h.engine, "ShowObject");
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0].target, Some(json!(3)));
    assert_eq!(shows[0].params.get("skiplog"), Some(&json!(false)));

    h.engine.safe_eval("ShowObject(404)");
    assert_eq!(
        records(&h.engine, "ShowObject")[1].result.to_string(),
        "Invalid|ObjectDoesNotExist"
    );
}

#[test]
fn hidden_objects_ignore_the_mouse() {
    let mut h = harness();
    h.engine.click_object(6);
    h.engine.hover_object(6);
    assert!(h.engine.data_log().records().is_empty());

    h.engine.hover_object(7);
    h.engine.leave_object(7);
    assert_eq!(variable(&h.engine, "hovers"), Some("1"));
    assert_eq!(records(&h.engine, "MoveOnto").len(), 1);
    assert_eq!(records(&h.engine, "MoveOff").len(), 1);
}

#[test]
fn key_buffer_collects_printable_text() {
    let mut h = harness();
    h.engine.key_press("h", Some("H"));
    h.engine.key_press("I", None);
    h.engine.key_press("", Some("Shift"));
    assert_eq!(h.engine.key_buffer(), "hI");

    let keys = records(&h.engine, "KeyPress");
    assert_eq!(keys[2].result.to_string(), "Invalid");
    assert_eq!(keys[2].params.get("Key"), Some(&json!("Shift")));

    assert_eq!(h.engine.safe_eval("KeyBufferContains('HI')"), Some(Value::Bool(false)));
    assert_eq!(h.engine.safe_eval("KeyBufferContains('HI', True)"), Some(Value::Bool(true)));
    assert_eq!(h.engine.safe_eval("KeyBufferContainsIgnoreCase('hi')"), Some(Value::Bool(true)));
    assert_eq!(h.engine.safe_eval("KeyBufferLacks('zz')"), Some(Value::Bool(true)));

    h.engine.key_press("\r", Some("Return"));
    assert_eq!(variable(&h.engine, "entered"), Some("yes"));

    h.engine.safe_eval("ClearKeyBuffer()");
    assert_eq!(h.engine.key_buffer(), "");
}

#[test]
fn synchronous_sound_keeps_timers_running() {
    let mut h = harness();
    h.host.set_sound_length(Some(Duration::from_secs(2)));
    assert_eq!(
        h.engine.safe_eval("PlaySound('ding.wav', asynchronous=False)"),
        Some(Value::Unit)
    );
    assert_eq!(h.engine.now(), Duration::from_secs(2));
    assert_eq!(variable(&h.engine, "visits"), Some("1"));
    assert!(h.engine.playing_sounds().any(|name| name == "ding"));

    h.engine.safe_eval("PlaySound('missing.wav')");
    assert_eq!(
        records(&h.engine, "PlaySound")[1].result.to_string(),
        "Invalid|FileNotFound"
    );
}

#[test]
fn media_actions_are_refused_when_media_is_off() {
    let mut h = harness_with(ENVIRONMENT, false);
    assert_eq!(h.engine.safe_eval("PlaySound('ding.wav')"), None);
    assert_eq!(h.engine.safe_eval("PlayVideo('intro.mp4')"), None);
    assert_eq!(h.engine.safe_eval("SayText('hello')"), None);
    let results: Vec<String> = h
        .engine
        .data_log()
        .records()
        .iter()
        .map(|r| r.result.to_string())
        .collect();
    assert_eq!(results, ["Invalid|MediaDisabled"; 3]);
}

#[test]
fn leaving_a_view_stops_its_media() {
    let mut h = harness();
    h.engine.safe_eval("PlaySound('ding.wav')");
    h.engine.safe_eval("PlayVideo('intro.mp4')");
    h.engine.safe_eval("ShowImage('pic.png')");
    h.engine.click_nav(NavZone::Right);
    h.engine.settle().expect("settle");

    let events = h.host.events();
    assert!(events.contains(&HostEvent::StopSound { name: "ding".into() }));
    assert!(events.contains(&HostEvent::StopVideo { name: "intro".into() }));
    assert!(events.contains(&HostEvent::HideImage { name: "pic".into() }));
    assert_eq!(h.engine.displayed_images().count(), 0);
}

#[test]
fn input_dialog_answers_feed_text_interpolation() {
    let mut h = harness();
    h.host.queue_answer("Ada");
    h.engine.safe_eval("InputDialog('Your name?', 'name')");
    assert_eq!(variable(&h.engine, "name"), Some("Ada"));

    h.engine.safe_eval("TextBox('Hello $name$, [missing]', 10, 10, 0, [0, 0, 0], [255, 255, 255, 0], 12)");
    let message = h.host.events().into_iter().find_map(|event| match event {
        HostEvent::DisplayText(request) => Some(request.message),
        _ => None,
    });
    assert_eq!(message.as_deref(), Some("Hello Ada, Unknown"));
}

#[test]
fn text_box_takes_the_tail_of_named_colour_lists() {
    let mut h = harness();
    assert_eq!(
        h.engine.safe_eval(
            "TextBox('hi', 10, 10, 0, ['white', 255, 254, 253, 252], ['black', 0, 1, 2, 255], 12)"
        ),
        Some(Value::Unit)
    );
    let shown = h.host.events().into_iter().find_map(|event| match event {
        HostEvent::DisplayText(request) => Some(request),
        _ => None,
    });
    let shown = shown.expect("text box");
    assert_eq!(shown.foreground, [255, 254, 253, 252]);
    assert_eq!(shown.background, [0, 1, 2, 255]);
    assert!(records(&h.engine, "TextBox")[0].result.is_valid());
}

#[test]
fn a_wait_keeps_running_after_a_timed_portal() {
    let yaml = r#"
Global:
  Options: { Startview: 1 }
Views:
  "1":
    Id: 1
    Actions:
      "1": { Id: 1, Trigger: "ViewTimePassed(2)", Action: "PortalTo(2)" }
  "2":
    Id: 2
    Actions:
      "1": { Id: 1, Trigger: "ViewTimePassed(3)", Action: "SetVariable('arrived', 'yes')" }
      "2": { Id: 2, Trigger: "ViewTimePassed(9)", Action: "SetVariable('too_late', 'yes')" }
"#;
    let mut h = harness_with(yaml, false);
    InputEvent::Wait { seconds: 10.0 }.apply(&mut h.engine);
    assert!(h.engine.settle().expect("settle"));

    assert_eq!(h.engine.current_view_id(), Some(2));
    assert_eq!(variable(&h.engine, "arrived"), Some("yes"));
    assert_eq!(variable(&h.engine, "too_late"), None);
    assert_eq!(h.clock.now(), Duration::from_secs(10));
    assert_eq!(h.engine.view_elapsed(), Duration::from_secs(8));
    assert_eq!(records(&h.engine, "SetVariable")[0].view_time, 3.0);
}

#[test]
fn a_wait_stops_at_a_timed_quit() {
    let yaml = r#"
Global:
  Options: { Startview: 1 }
Views:
  "1":
    Id: 1
    Actions:
      "1": { Id: 1, Trigger: "ViewTimePassed(4)", Action: "Quit()" }
"#;
    let mut h = harness_with(yaml, false);
    h.engine.run_for(Duration::from_secs(10));
    assert_eq!(h.clock.now(), Duration::from_secs(4));
    assert!(!h.engine.settle().expect("settle"));
}

#[test]
fn quit_stops_the_session() {
    let mut h = harness();
    h.engine.safe_eval("Quit()");
    assert!(!h.engine.settle().expect("settle"));
    assert!(h.host.events().contains(&HostEvent::Quit));
}
