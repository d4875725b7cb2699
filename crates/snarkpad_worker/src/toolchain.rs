use std::collections::VecDeque;
use std::sync::Mutex;

use thiserror::Error;

use crate::protocol::{JobFile, KeyScheme, RawEnvelope};

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{tool} failed: {detail}")]
    ToolFailed { tool: String, detail: String },
    #[error("expected artifact {0} was not produced")]
    MissingArtifact(String),
    #[error("job contains no source files")]
    EmptyJob,
    #[error("unsafe file name: {0}")]
    UnsafeFileName(String),
    #[error("no compiled circuit in this worker")]
    NothingCompiled,
    #[error("no keys have been generated for the current source")]
    NothingToVerify,
}

/// Where a toolchain sends the envelopes it produces while working.
pub trait MessageSink: Send + Sync {
    fn emit(&self, envelope: RawEnvelope);
}

/// The opaque compiler pipeline behind the worker boundary. Implementations
/// stream envelopes through the sink; a returned error means the pipeline
/// itself broke, not that the user's circuit is wrong.
#[async_trait::async_trait]
pub trait Toolchain: Send + Sync {
    /// Compile and analyze the job's buffers.
    async fn run(&self, files: &[JobFile], sink: &dyn MessageSink) -> Result<(), ToolchainError>;

    /// Key-generation pipeline for the most recently compiled circuit.
    /// `origin` is the page-origin context reference from the request.
    async fn generate_keys(
        &self,
        scheme: KeyScheme,
        origin: &str,
        sink: &dyn MessageSink,
    ) -> Result<(), ToolchainError>;

    /// Consistency-check an uploaded proving key against the current source.
    async fn check_key(&self, key: &[u8], sink: &dyn MessageSink) -> Result<(), ToolchainError>;
}

/// Deterministic toolchain for tests: replays canned envelope scripts and
/// records what it was asked to do.
#[derive(Debug, Default)]
pub struct ScriptedToolchain {
    run_script: Mutex<VecDeque<Vec<RawEnvelope>>>,
    keys_script: Mutex<VecDeque<Vec<RawEnvelope>>>,
    check_script: Mutex<VecDeque<Vec<RawEnvelope>>>,
    jobs: Mutex<Vec<Vec<JobFile>>>,
    key_requests: Mutex<Vec<(KeyScheme, String)>>,
    checked_keys: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the envelope sequence the next `run` call replays.
    pub fn on_run(self, envelopes: Vec<RawEnvelope>) -> Self {
        self.run_script.lock().expect("lock").push_back(envelopes);
        self
    }

    /// Queues the envelope sequence the next `generate_keys` call replays.
    pub fn on_keys(self, envelopes: Vec<RawEnvelope>) -> Self {
        self.keys_script.lock().expect("lock").push_back(envelopes);
        self
    }

    /// Queues the envelope sequence the next `check_key` call replays.
    pub fn on_check(self, envelopes: Vec<RawEnvelope>) -> Self {
        self.check_script.lock().expect("lock").push_back(envelopes);
        self
    }

    /// Every job posted so far, in order.
    pub fn recorded_jobs(&self) -> Vec<Vec<JobFile>> {
        self.jobs.lock().expect("lock").clone()
    }

    /// Every key-generation request posted so far, in order.
    pub fn recorded_key_requests(&self) -> Vec<(KeyScheme, String)> {
        self.key_requests.lock().expect("lock").clone()
    }

    /// Every uploaded key submitted for checking, in order.
    pub fn recorded_checked_keys(&self) -> Vec<Vec<u8>> {
        self.checked_keys.lock().expect("lock").clone()
    }

    fn replay(script: &Mutex<VecDeque<Vec<RawEnvelope>>>, sink: &dyn MessageSink) {
        let envelopes = script.lock().expect("lock").pop_front().unwrap_or_default();
        for envelope in envelopes {
            sink.emit(envelope);
        }
    }
}

#[async_trait::async_trait]
impl Toolchain for ScriptedToolchain {
    async fn run(&self, files: &[JobFile], sink: &dyn MessageSink) -> Result<(), ToolchainError> {
        self.jobs.lock().expect("lock").push(files.to_vec());
        Self::replay(&self.run_script, sink);
        Ok(())
    }

    async fn generate_keys(
        &self,
        scheme: KeyScheme,
        origin: &str,
        sink: &dyn MessageSink,
    ) -> Result<(), ToolchainError> {
        self.key_requests
            .lock()
            .expect("lock")
            .push((scheme, origin.to_string()));
        Self::replay(&self.keys_script, sink);
        Ok(())
    }

    async fn check_key(&self, key: &[u8], sink: &dyn MessageSink) -> Result<(), ToolchainError> {
        self.checked_keys.lock().expect("lock").push(key.to_vec());
        Self::replay(&self.check_script, sink);
        Ok(())
    }
}
