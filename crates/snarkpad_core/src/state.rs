use std::collections::BTreeMap;
use std::num::NonZeroU64;

use crate::diagnostics::{DiagnosticSet, Marker};
use crate::view_model::AppViewModel;

/// UI animation identity for the run in flight. Non-zero and fresh per run;
/// carries no other meaning.
pub type RunToken = NonZeroU64;

/// Name of the verifier source artifact produced by the plonk key pipeline.
pub const VERIFIER_SOURCE: &str = "main.plonk.sol";

/// A tracked source buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    /// Path-like name, stored without a leading separator.
    pub name: String,
    pub value: String,
    /// Whether this buffer is the current edit focus.
    pub active: bool,
    pub markers: Vec<Marker>,
}

/// One file of a job payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub value: String,
    pub name: String,
    pub active: bool,
}

/// The buffer set submitted to the worker for a single run.
/// Immutable once snapshotted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub files: Vec<SourceFile>,
}

/// One visible output entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Message discriminant as reported (`stdout`, `error`, `plonk keys`, ...).
    pub kind: String,
    pub text: String,
    pub url: Option<String>,
    /// Named binary artifacts offered for download.
    pub files: BTreeMap<String, Vec<u8>>,
}

impl LogEntry {
    /// A plain text entry with no artifacts.
    pub fn message(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            url: None,
            files: BTreeMap::new(),
        }
    }
}

/// A compiled verifier contract, ready for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledContract {
    /// Contract name inside the compiled unit.
    pub contract: String,
    /// Name of the source artifact it was compiled from.
    pub source_file: String,
    /// Full compiler output for the contract, JSON-encoded.
    pub json: String,
}

/// The controller's knowledge of the worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerLink {
    /// No instance has been spawned yet.
    #[default]
    Absent,
    /// An instance exists and finished its last job cleanly.
    Idle,
    /// An instance exists with a job in flight (or in an unknown state after
    /// an error); it must be discarded before the next run.
    Busy,
}

/// Seed for the parameter-input entry point: a pristine template whose first
/// occurrence of `default_value` is replaced by whatever the input box holds.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TemplateInput {
    buffer: String,
    source: String,
    default_value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    buffers: Vec<Buffer>,
    template: Option<TemplateInput>,
    log: Vec<LogEntry>,
    progress: f64,
    run: Option<RunToken>,
    token_seq: u64,
    worker: WorkerLink,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            buffers: Vec::new(),
            template: None,
            log: Vec::new(),
            progress: 1.0,
            run: None,
            token_seq: 0,
            worker: WorkerLink::Absent,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the state with a single template buffer for the parameter-input
    /// entry point. `default_value` is the token the input box replaces.
    pub fn with_template(
        buffer: impl Into<String>,
        source: impl Into<String>,
        default_value: impl Into<String>,
    ) -> Self {
        let mut state = Self::new();
        let buffer = buffer.into();
        let source = source.into();
        state.open_buffer(buffer.clone(), source.clone(), true);
        state.template = Some(TemplateInput {
            buffer: strip_leading_separator(&buffer).to_string(),
            source,
            default_value: default_value.into(),
        });
        state
    }

    /// Adds a tracked buffer. Leading separators are stripped from the name.
    pub fn open_buffer(&mut self, name: impl Into<String>, value: impl Into<String>, active: bool) {
        let name = name.into();
        self.buffers.push(Buffer {
            name: strip_leading_separator(&name).to_string(),
            value: value.into(),
            active,
            markers: Vec::new(),
        });
        self.dirty = true;
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel::of(self)
    }

    /// Returns the dirty flag and clears it. The shell re-renders only when
    /// this returns true.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn run_token(&self) -> Option<RunToken> {
        self.run
    }

    pub fn worker_link(&self) -> WorkerLink {
        self.worker
    }

    /// Snapshots all tracked buffers into a job payload.
    pub fn snapshot_job(&self) -> Job {
        Job {
            files: self
                .buffers
                .iter()
                .map(|buffer| SourceFile {
                    value: buffer.value.clone(),
                    name: buffer.name.clone(),
                    active: buffer.active,
                })
                .collect(),
        }
    }

    pub(crate) fn set_buffer_value(&mut self, name: &str, value: String) {
        let name = strip_leading_separator(name);
        if let Some(buffer) = self.buffers.iter_mut().find(|b| b.name == name) {
            buffer.value = value;
            self.dirty = true;
        }
    }

    /// Re-derives the template buffer from the pristine template source, with
    /// the first occurrence of the default value replaced by `input`.
    pub(crate) fn patch_template_input(&mut self, input: &str) {
        let Some(template) = self.template.clone() else {
            return;
        };
        let patched = template
            .source
            .replacen(&template.default_value, input, 1);
        self.set_buffer_value(&template.buffer, patched);
    }

    /// Marks the start of a run: fresh non-zero token, worker busy.
    pub(crate) fn begin_run(&mut self) {
        self.token_seq += 1;
        self.run = NonZeroU64::new(self.token_seq);
        self.worker = WorkerLink::Busy;
        self.dirty = true;
    }

    /// Clears the run token without touching the worker link. Used on error
    /// paths where the instance state is unknown.
    pub(crate) fn clear_run(&mut self) {
        self.run = None;
        self.dirty = true;
    }

    /// A run completed cleanly: clear the token and the busy flag.
    pub(crate) fn finish_run(&mut self) {
        self.run = None;
        self.worker = WorkerLink::Idle;
        self.dirty = true;
    }

    pub(crate) fn clear_log(&mut self) {
        self.log.clear();
        self.dirty = true;
    }

    pub(crate) fn append_log(&mut self, entry: LogEntry) {
        self.log.push(entry);
        self.dirty = true;
    }

    pub(crate) fn set_progress(&mut self, fraction: f64) {
        self.progress = fraction;
        self.dirty = true;
    }

    /// Replaces every buffer's marker set with the markers the given report
    /// places on it. A buffer the report does not mention ends up with an
    /// empty set.
    pub(crate) fn apply_diagnostics(&mut self, set: &DiagnosticSet) {
        for buffer in &mut self.buffers {
            buffer.markers = set.markers_for(&buffer.name);
        }
        self.dirty = true;
    }
}

fn strip_leading_separator(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}
