use crate::msg::ProvingScheme;
use crate::state::{CompiledContract, Job};

/// What the shell must do after an update. The update function itself never
/// performs I/O; every side effect is described here and applied by the
/// effect runner.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Hard-terminate the current worker instance, if any, and spawn a fresh
    /// one. There is no cancellation handshake; partial results from the old
    /// instance are discarded.
    ReplaceWorker,
    /// Post a run job to the worker.
    PostJob(Job),
    /// Ask the worker for the key-generation pipeline. The shell supplies
    /// the page-origin context reference.
    RequestKeys { scheme: ProvingScheme },
    /// Submit an uploaded proving key for a consistency check.
    SubmitKeyCheck { data: Vec<u8> },
    /// Forward a hover reply to the side-channel resolver.
    ForwardHover { request_id: u64, contents: String },
    /// Write worker debug text to the diagnostic log.
    EmitDebug { text: String },
    /// Compile the generated verifier source with the external contract
    /// compiler.
    CompileContract { source: String },
    /// Deploy a compiled verifier through the wallet provider.
    DeployContract { artifact: CompiledContract },
}
