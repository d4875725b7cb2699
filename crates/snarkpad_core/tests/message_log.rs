use std::collections::BTreeMap;

use snarkpad_core::{update, AppState, Effect, Msg, WorkerEvent};

fn running_state() -> AppState {
    let state = AppState::with_template("main.circom", "x === 42;", "42");
    let (state, _) = update(state, Msg::RunRequested);
    state
}

fn output(kind: &str, text: &str) -> WorkerEvent {
    WorkerEvent::Output {
        kind: kind.to_string(),
        text: text.to_string(),
        files: BTreeMap::new(),
        url: None,
    }
}

#[test]
fn only_result_shaped_messages_reach_the_log_in_arrival_order() {
    let mut state = running_state();

    let events = vec![
        WorkerEvent::Debug {
            text: "loading wasm".to_string(),
        },
        output("stdout", "main: 12 constraints"),
        WorkerEvent::Progress { fraction: 0.4 },
        WorkerEvent::Diagnostics(Default::default()),
        WorkerEvent::Hover {
            request_id: 3,
            contents: "signal x".to_string(),
        },
        output("stderr", "warning: unused signal"),
        WorkerEvent::Done,
    ];
    for event in events {
        let (next, _) = update(state, Msg::Worker(event));
        state = next;
    }

    let kinds: Vec<_> = state.log().iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds, vec!["stdout", "stderr"]);
    assert_eq!(state.log()[0].text, "main: 12 constraints");
    assert_eq!(state.log()[1].text, "warning: unused signal");
}

#[test]
fn starting_a_run_clears_previous_log() {
    let state = running_state();
    let (state, _) = update(state, Msg::Worker(output("stdout", "old output")));
    assert_eq!(state.log().len(), 1);

    let (state, _) = update(state, Msg::RunRequested);
    assert!(state.log().is_empty());
}

#[test]
fn progress_updates_fraction_without_touching_the_log() {
    let state = running_state();
    let (state, _) = update(state, Msg::Worker(output("stdout", "kept")));

    let (state, effects) = update(state, Msg::Worker(WorkerEvent::Progress { fraction: 0.25 }));

    assert!(effects.is_empty());
    assert_eq!(state.progress(), 0.25);
    assert_eq!(state.log().len(), 1);

    let view = state.view();
    assert!(view.progress_visible);

    // Fraction 1 hides the indicator again.
    let (state, _) = update(state, Msg::Worker(WorkerEvent::Progress { fraction: 1.0 }));
    assert!(!state.view().progress_visible);
}

#[test]
fn debug_messages_become_logging_effects_only() {
    let state = running_state();
    let (state, effects) = update(
        state,
        Msg::Worker(WorkerEvent::Debug {
            text: "template Main instantiated".to_string(),
        }),
    );

    assert_eq!(
        effects,
        vec![Effect::EmitDebug {
            text: "template Main instantiated".to_string()
        }]
    );
    assert!(state.log().is_empty());
}

#[test]
fn hover_replies_are_forwarded_out_of_band() {
    let state = running_state();
    let (state, effects) = update(
        state,
        Msg::Worker(WorkerEvent::Hover {
            request_id: 17,
            contents: "component Main".to_string(),
        }),
    );

    assert_eq!(
        effects,
        vec![Effect::ForwardHover {
            request_id: 17,
            contents: "component Main".to_string()
        }]
    );
    assert!(state.log().is_empty());
}

#[test]
fn result_entries_keep_artifacts_and_links() {
    let state = running_state();
    let mut files = BTreeMap::new();
    files.insert("witness.wtns".to_string(), vec![0u8; 1234]);
    let (state, _) = update(
        state,
        Msg::Worker(WorkerEvent::Output {
            kind: "Artifacts".to_string(),
            text: "witness computed".to_string(),
            files,
            url: Some("https://example.org/report".to_string()),
        }),
    );

    let view = state.view();
    assert_eq!(view.entries.len(), 1);
    let entry = &view.entries[0];
    assert_eq!(entry.label, "Artifacts");
    assert_eq!(entry.url.as_deref(), Some("https://example.org/report"));
    assert_eq!(entry.files.len(), 1);
    assert_eq!(entry.files[0].name, "witness.wtns");
    assert_eq!(entry.files[0].size_kb, "1.23");
}
