use std::sync::Once;

use snarkpad_core::{update, AppState, Effect, Msg, WorkerEvent, WorkerLink};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(worker_logging::initialize_for_tests);
}

const TEMPLATE: &str = "template Main() { signal input x; x === 42; }\ncomponent main = Main();\n";

fn template_state() -> AppState {
    AppState::with_template("main.circom", TEMPLATE, "42")
}

#[test]
fn first_run_spawns_worker_and_posts_snapshot() {
    init_logging();
    let state = template_state();

    let (state, effects) = update(state, Msg::RunRequested);

    assert_eq!(state.worker_link(), WorkerLink::Busy);
    assert!(state.run_token().is_some());
    assert_eq!(effects.len(), 2);
    assert_eq!(effects[0], Effect::ReplaceWorker);
    match &effects[1] {
        Effect::PostJob(job) => {
            assert_eq!(job.files.len(), 1);
            assert_eq!(job.files[0].name, "main.circom");
            assert_eq!(job.files[0].value, TEMPLATE);
            assert!(job.files[0].active);
        }
        other => panic!("expected PostJob, got {other:?}"),
    }
}

#[test]
fn idle_worker_is_reused_busy_worker_is_replaced() {
    init_logging();
    let state = template_state();
    let (state, _) = update(state, Msg::RunRequested);
    let (state, _) = update(state, Msg::Worker(WorkerEvent::Done));
    assert_eq!(state.worker_link(), WorkerLink::Idle);

    // Idle instance: no replacement, just the job.
    let (state, effects) = update(state, Msg::RunRequested);
    assert!(matches!(effects.as_slice(), [Effect::PostJob(_)]));

    // Busy instance: replacement precedes the job.
    let (_state, effects) = update(state, Msg::RunRequested);
    assert!(matches!(
        effects.as_slice(),
        [Effect::ReplaceWorker, Effect::PostJob(_)]
    ));
}

#[test]
fn done_clears_running_exactly_once() {
    init_logging();
    let state = template_state();
    let (state, _) = update(state, Msg::RunRequested);
    assert!(state.run_token().is_some());

    let (state, effects) = update(state, Msg::Worker(WorkerEvent::Done));
    assert!(effects.is_empty());
    assert!(state.run_token().is_none());
    assert_eq!(state.worker_link(), WorkerLink::Idle);
}

#[test]
fn run_tokens_are_fresh_and_non_zero() {
    init_logging();
    let state = template_state();
    let (state, _) = update(state, Msg::RunRequested);
    let first = state.run_token().expect("token");

    let (state, _) = update(state, Msg::RunRequested);
    let second = state.run_token().expect("token");

    assert_ne!(first, second);
    assert_ne!(first.get(), 0);
    assert_ne!(second.get(), 0);
}

#[test]
fn input_change_patches_first_occurrence_and_autoruns() {
    init_logging();
    let state = template_state();

    let (state, effects) = update(state, Msg::InputChanged("7".to_string()));

    let job = effects
        .iter()
        .find_map(|e| match e {
            Effect::PostJob(job) => Some(job.clone()),
            _ => None,
        })
        .expect("auto-run posts a job");
    assert_eq!(job.files.len(), 1);
    assert_eq!(job.files[0].value, TEMPLATE.replacen("42", "7", 1));

    // Worker replies with debug output only, then done: the visible log ends
    // up empty and the run is over.
    let (state, _) = update(
        state,
        Msg::Worker(WorkerEvent::Debug {
            text: "compiling".to_string(),
        }),
    );
    let (state, _) = update(state, Msg::Worker(WorkerEvent::Done));
    assert!(state.log().is_empty());
    assert!(state.run_token().is_none());
    assert!(state.view().entries.is_empty());
}

#[test]
fn worker_error_stops_spinner_but_keeps_instance_flagged_busy() {
    init_logging();
    let state = template_state();
    let (state, _) = update(state, Msg::RunRequested);

    let (state, effects) = update(
        state,
        Msg::WorkerFailed {
            message: "RuntimeError: unreachable".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert!(state.run_token().is_none());
    assert_eq!(state.worker_link(), WorkerLink::Busy);
    assert_eq!(state.log().len(), 1);
    assert_eq!(state.log()[0].kind, "error");
    assert_eq!(state.log()[0].text, "RuntimeError: unreachable");

    // The next run must discard the instance.
    let (_state, effects) = update(state, Msg::RunRequested);
    assert_eq!(effects[0], Effect::ReplaceWorker);
}
