use snarkpad_core::{
    update, AppState, DiagnosticSet, Finding, MarkerSeverity, Msg, TextRange, WorkerEvent,
};

fn two_buffer_state() -> AppState {
    let mut state = AppState::new();
    state.open_buffer("main.circom", "template Main() {}", true);
    state.open_buffer("utils.circom", "template Util() {}", false);
    let (state, _) = update(state, Msg::RunRequested);
    state
}

fn finding(file: &str, level: Option<&str>, line: u32, message: &str) -> Finding {
    Finding {
        file: file.to_string(),
        message: message.to_string(),
        level: level.map(str::to_string),
        range: TextRange {
            start_line: line,
            start_column: 1,
            end_line: line,
            end_column: 10,
        },
    }
}

fn markers_of(state: &AppState, name: &str) -> Vec<snarkpad_core::Marker> {
    state
        .buffers()
        .iter()
        .find(|b| b.name == name)
        .expect("buffer")
        .markers
        .clone()
}

#[test]
fn finding_lands_only_on_the_matching_buffer() {
    let state = two_buffer_state();
    let set = DiagnosticSet {
        findings: vec![finding(
            "file://main.circom",
            Some("warning"),
            3,
            "signal is never constrained",
        )],
    };

    let (state, effects) = update(state, Msg::Worker(WorkerEvent::Diagnostics(set)));

    assert!(effects.is_empty());
    let main_markers = markers_of(&state, "main.circom");
    assert_eq!(main_markers.len(), 1);
    assert_eq!(main_markers[0].range.start_line, 3);
    assert_eq!(main_markers[0].severity, MarkerSeverity::Warning);
    assert!(markers_of(&state, "utils.circom").is_empty());
    // Diagnostics never reach the visible log.
    assert!(state.log().is_empty());
}

#[test]
fn severity_levels_map_to_marker_severities() {
    let state = two_buffer_state();
    let set = DiagnosticSet {
        findings: vec![
            finding("main.circom", Some("warning"), 1, "w"),
            finding("main.circom", Some("note"), 2, "n"),
            finding("main.circom", Some("error"), 3, "e"),
            finding("main.circom", None, 4, "u"),
        ],
    };

    let (state, _) = update(state, Msg::Worker(WorkerEvent::Diagnostics(set)));

    let severities: Vec<_> = markers_of(&state, "main.circom")
        .iter()
        .map(|m| m.severity)
        .collect();
    assert_eq!(
        severities,
        vec![
            MarkerSeverity::Warning,
            MarkerSeverity::Info,
            MarkerSeverity::Error,
            MarkerSeverity::Error,
        ]
    );
}

#[test]
fn a_fresh_report_replaces_markers_wholesale() {
    let state = two_buffer_state();
    let first = DiagnosticSet {
        findings: vec![
            finding("main.circom", Some("warning"), 1, "a"),
            finding("utils.circom", Some("warning"), 2, "b"),
        ],
    };
    let (state, _) = update(state, Msg::Worker(WorkerEvent::Diagnostics(first)));
    assert_eq!(markers_of(&state, "main.circom").len(), 1);
    assert_eq!(markers_of(&state, "utils.circom").len(), 1);

    // The second report only mentions main.circom; utils.circom is cleared
    // by the same pass, not merged.
    let second = DiagnosticSet {
        findings: vec![finding("main.circom", Some("note"), 5, "c")],
    };
    let (state, _) = update(state, Msg::Worker(WorkerEvent::Diagnostics(second)));

    let main_markers = markers_of(&state, "main.circom");
    assert_eq!(main_markers.len(), 1);
    assert_eq!(main_markers[0].message, "c");
    assert!(markers_of(&state, "utils.circom").is_empty());
}
