//! Compiler-worker proxy: wire protocol, worker lifecycle, toolchain seam.
mod handle;
mod process;
mod protocol;
mod sarif;
mod toolchain;

pub use handle::{WorkerHandle, WorkerPoll};
pub use process::{ProcessToolchain, ToolchainConfig};
pub use protocol::{
    classify, JobFile, KeyScheme, ProtocolError, RawEnvelope, WorkerMessage, WorkerRequest,
};
pub use sarif::{Finding, SarifLog};
pub use toolchain::{MessageSink, ScriptedToolchain, Toolchain, ToolchainError};
