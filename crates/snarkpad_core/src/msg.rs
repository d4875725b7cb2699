use std::collections::BTreeMap;

use crate::diagnostics::DiagnosticSet;
use crate::state::CompiledContract;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The parameter input box changed (debounced text). Re-derives the
    /// template buffer and triggers an auto-run.
    InputChanged(String),
    /// A tracked buffer's text changed; triggers an auto-run.
    BufferEdited { name: String, value: String },
    /// Explicit run request.
    RunRequested,
    /// User asked for key generation with the given proving scheme.
    KeysRequested { scheme: ProvingScheme },
    /// User uploaded a previously generated proving key for a consistency
    /// check against the current source.
    KeyFileLoaded { data: Vec<u8> },
    /// A classified message from the worker instance.
    Worker(WorkerEvent),
    /// Worker-level runtime error.
    WorkerFailed { message: String },
    /// The external contract compiler produced a verifier artifact.
    ContractCompiled { artifact: CompiledContract },
    /// The wallet provider deployed the verifier contract.
    ContractDeployed { address: String },
    /// Any step of the deployment chain failed.
    DeployFailed { message: String },
    /// Fallback for placeholder wiring.
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvingScheme {
    Groth16,
    Plonk,
}

impl ProvingScheme {
    /// Discriminant used for the key-bundle log entry.
    pub fn log_kind(self) -> &'static str {
        match self {
            ProvingScheme::Groth16 => "groth16 keys",
            ProvingScheme::Plonk => "plonk keys",
        }
    }
}

/// A worker message after classification. `Done` is its own variant even when
/// the wire envelope carried a payload: the done flag wins and the envelope
/// never reaches the visible log.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// End of the run.
    Done,
    /// Log-only text; never appended to the visible log.
    Debug { text: String },
    /// Fractional completion; 1.0 hides the progress indicator.
    Progress { fraction: f64 },
    /// Static-analysis report, applied as per-buffer markers.
    Diagnostics(DiagnosticSet),
    /// Out-of-band reply to a hover lookup.
    Hover { request_id: u64, contents: String },
    /// Terminal key-generation artifacts.
    KeyBundle {
        scheme: ProvingScheme,
        text: String,
        files: BTreeMap<String, Vec<u8>>,
        url: Option<String>,
    },
    /// Anything result-shaped; appended verbatim to the visible log.
    Output {
        kind: String,
        text: String,
        files: BTreeMap<String, Vec<u8>>,
        url: Option<String>,
    },
}
