//! Snarkpad core: pure controller state machine and view-model helpers.
mod diagnostics;
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use diagnostics::{
    map_severity, normalize_file_ref, DiagnosticSet, Finding, Marker, MarkerSeverity, TextRange,
};
pub use effect::Effect;
pub use msg::{Msg, ProvingScheme, WorkerEvent};
pub use state::{
    AppState, Buffer, CompiledContract, Job, LogEntry, RunToken, SourceFile, WorkerLink,
    VERIFIER_SOURCE,
};
pub use update::update;
pub use view_model::{format_size_kb, AppViewModel, ArtifactView, BufferView, LogEntryView};
