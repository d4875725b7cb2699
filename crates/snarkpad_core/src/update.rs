use std::collections::BTreeMap;

use crate::{
    AppState, Effect, LogEntry, Msg, ProvingScheme, WorkerEvent, WorkerLink, VERIFIER_SOURCE,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(value) => {
            state.patch_template_input(&value);
            start_run(&mut state)
        }
        Msg::BufferEdited { name, value } => {
            state.set_buffer_value(&name, value);
            start_run(&mut state)
        }
        Msg::RunRequested => start_run(&mut state),
        Msg::KeysRequested { scheme } => {
            let mut effects = replace_worker_if_unavailable(&mut state);
            state.begin_run();
            state.clear_log();
            effects.push(Effect::RequestKeys { scheme });
            effects
        }
        Msg::KeyFileLoaded { data } => {
            // The check appends its verdict to the existing output, so the
            // log survives.
            let mut effects = replace_worker_if_unavailable(&mut state);
            state.begin_run();
            effects.push(Effect::SubmitKeyCheck { data });
            effects
        }
        Msg::Worker(event) => apply_worker_event(&mut state, event),
        Msg::WorkerFailed { message } => {
            // The instance is in an unknown state: stop the spinner, but
            // leave the busy flag set so the next run discards the instance.
            state.append_log(LogEntry::message("error", message));
            state.clear_run();
            Vec::new()
        }
        Msg::ContractCompiled { artifact } => {
            let mut files = BTreeMap::new();
            files.insert(
                format!("{}.json", artifact.source_file),
                artifact.json.clone().into_bytes(),
            );
            state.append_log(LogEntry {
                kind: "compilation".to_string(),
                text: String::new(),
                url: None,
                files,
            });
            vec![Effect::DeployContract { artifact }]
        }
        Msg::ContractDeployed { address } => {
            state.finish_run();
            state.append_log(LogEntry::message("deployment", address));
            Vec::new()
        }
        Msg::DeployFailed { message } => {
            state.append_log(LogEntry::message("error", message));
            state.clear_run();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// The `idle -> starting` transition: replace the worker if it cannot take a
/// job, reset the visible log, mint a fresh run token, post the buffer
/// snapshot.
fn start_run(state: &mut AppState) -> Vec<Effect> {
    let mut effects = replace_worker_if_unavailable(state);
    state.begin_run();
    state.clear_log();
    effects.push(Effect::PostJob(state.snapshot_job()));
    effects
}

/// A busy instance is forcibly discarded; an idle one is reused. The replace
/// effect precedes any job effect so no two instances ever receive jobs
/// concurrently.
fn replace_worker_if_unavailable(state: &mut AppState) -> Vec<Effect> {
    match state.worker_link() {
        WorkerLink::Idle => Vec::new(),
        WorkerLink::Absent | WorkerLink::Busy => vec![Effect::ReplaceWorker],
    }
}

fn apply_worker_event(state: &mut AppState, event: WorkerEvent) -> Vec<Effect> {
    match event {
        WorkerEvent::Done => {
            state.finish_run();
            Vec::new()
        }
        WorkerEvent::Debug { text } => vec![Effect::EmitDebug { text }],
        WorkerEvent::Progress { fraction } => {
            state.set_progress(fraction);
            Vec::new()
        }
        WorkerEvent::Diagnostics(set) => {
            state.apply_diagnostics(&set);
            Vec::new()
        }
        WorkerEvent::Hover {
            request_id,
            contents,
        } => vec![Effect::ForwardHover {
            request_id,
            contents,
        }],
        WorkerEvent::KeyBundle {
            scheme,
            text,
            files,
            url,
        } => {
            state.append_log(LogEntry {
                kind: scheme.log_kind().to_string(),
                text,
                url,
                files: files.clone(),
            });
            match scheme {
                ProvingScheme::Plonk => {
                    // Deployment rides on the same worker instance: re-arm
                    // the spinner and keep the instance busy until the chain
                    // completes.
                    state.begin_run();
                    match files
                        .get(VERIFIER_SOURCE)
                        .and_then(|bytes| String::from_utf8(bytes.clone()).ok())
                    {
                        Some(source) => vec![Effect::CompileContract { source }],
                        None => Vec::new(),
                    }
                }
                ProvingScheme::Groth16 => Vec::new(),
            }
        }
        WorkerEvent::Output {
            kind,
            text,
            files,
            url,
        } => {
            state.append_log(LogEntry {
                kind,
                text,
                url,
                files,
            });
            Vec::new()
        }
    }
}
