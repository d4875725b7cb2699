use std::collections::VecDeque;
use std::sync::Arc;

use snarkpad_core::{
    DiagnosticSet, Effect, Finding, Msg, ProvingScheme, SourceFile, TextRange, WorkerEvent,
};
use snarkpad_worker::{
    JobFile, KeyScheme, Toolchain, WorkerHandle, WorkerMessage, WorkerPoll, WorkerRequest,
};
use worker_logging::{worker_debug, worker_info, worker_warn};

use crate::deploy::{patch_verifier_source, ContractCompiler, WalletProvider};
use crate::hover::HoverResolver;

/// Applies the effects the state machine emits: worker lifecycle and
/// requests, hover replies, and the contract deployment chain. Results of
/// the deployment chain come back out of `poll` as messages, so every
/// outcome flows through the same update path.
pub struct EffectRunner {
    toolchain: Arc<dyn Toolchain>,
    worker: Option<WorkerHandle>,
    compiler: Box<dyn ContractCompiler>,
    wallet: Box<dyn WalletProvider>,
    hover: HoverResolver,
    origin_url: String,
    pending: VecDeque<Msg>,
    spawned: usize,
}

impl EffectRunner {
    pub fn new(
        toolchain: Arc<dyn Toolchain>,
        compiler: Box<dyn ContractCompiler>,
        wallet: Box<dyn WalletProvider>,
        origin_url: impl Into<String>,
    ) -> Self {
        Self {
            toolchain,
            worker: None,
            compiler,
            wallet,
            hover: HoverResolver::new(),
            origin_url: origin_url.into(),
            pending: VecDeque::new(),
            spawned: 0,
        }
    }

    pub fn hover(&self) -> &HoverResolver {
        &self.hover
    }

    /// Number of worker instances spawned so far.
    pub fn spawned_instances(&self) -> usize {
        self.spawned
    }

    pub fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ReplaceWorker => {
                    if let Some(old) = self.worker.take() {
                        worker_info!("discarding worker instance");
                        old.terminate();
                    }
                    self.worker = Some(WorkerHandle::spawn(self.toolchain.clone()));
                    self.spawned += 1;
                }
                Effect::PostJob(job) => {
                    if let Some(worker) = self.worker.as_mut() {
                        worker.mark_busy();
                        worker_info!("posting job with {} file(s)", job.files.len());
                        worker.post(WorkerRequest::Run {
                            files: job.files.into_iter().map(to_job_file).collect(),
                        });
                    } else {
                        worker_warn!("job dropped: no worker instance");
                    }
                }
                Effect::RequestKeys { scheme } => {
                    if let Some(worker) = self.worker.as_mut() {
                        worker.mark_busy();
                        let url = self.origin_url.clone();
                        worker.post(match scheme {
                            ProvingScheme::Groth16 => WorkerRequest::Groth16 { url },
                            ProvingScheme::Plonk => WorkerRequest::Plonk { url },
                        });
                    }
                }
                Effect::SubmitKeyCheck { data } => {
                    if let Some(worker) = self.worker.as_mut() {
                        worker.mark_busy();
                        worker.post(WorkerRequest::Verify { data });
                    }
                }
                Effect::ForwardHover {
                    request_id,
                    contents,
                } => self.hover.resolve(request_id, contents),
                Effect::EmitDebug { text } => worker_debug!("{text}"),
                Effect::CompileContract { source } => {
                    let msg = match self.compiler.compile(&patch_verifier_source(&source)) {
                        Ok(artifact) => Msg::ContractCompiled { artifact },
                        Err(err) => Msg::DeployFailed {
                            message: err.to_string(),
                        },
                    };
                    self.pending.push_back(msg);
                }
                Effect::DeployContract { artifact } => {
                    let msg = match self.wallet.deploy(&artifact) {
                        Ok(deployed) => Msg::ContractDeployed {
                            address: deployed.address,
                        },
                        Err(err) => Msg::DeployFailed {
                            message: err.to_string(),
                        },
                    };
                    self.pending.push_back(msg);
                }
            }
        }
    }

    /// Next message for the state machine: deployment-chain results first,
    /// then whatever the worker produced.
    pub fn poll(&mut self) -> Option<Msg> {
        if let Some(msg) = self.pending.pop_front() {
            return Some(msg);
        }
        let worker = self.worker.as_mut()?;
        match worker.poll() {
            WorkerPoll::Message(WorkerMessage::Done) => {
                worker.clear_busy();
                Some(Msg::Worker(WorkerEvent::Done))
            }
            WorkerPoll::Message(message) => Some(map_worker_message(message)),
            WorkerPoll::Empty => None,
            WorkerPoll::Crashed => {
                // The instance died without a done; drop the handle so the
                // next run spawns a fresh one.
                self.worker = None;
                Some(Msg::WorkerFailed {
                    message: "worker terminated unexpectedly".to_string(),
                })
            }
        }
    }
}

fn to_job_file(file: SourceFile) -> JobFile {
    JobFile {
        value: file.value,
        name: file.name,
        active: file.active,
    }
}

fn map_worker_message(message: WorkerMessage) -> Msg {
    let event = match message {
        WorkerMessage::Done => WorkerEvent::Done,
        WorkerMessage::Debug { text } => WorkerEvent::Debug { text },
        WorkerMessage::Progress { fraction } => WorkerEvent::Progress { fraction },
        WorkerMessage::Diagnostics(findings) => WorkerEvent::Diagnostics(DiagnosticSet {
            findings: findings.into_iter().map(to_finding).collect(),
        }),
        WorkerMessage::Hover { id, contents } => WorkerEvent::Hover {
            request_id: id,
            contents,
        },
        WorkerMessage::Keys {
            scheme,
            text,
            files,
            url,
        } => WorkerEvent::KeyBundle {
            scheme: map_scheme(scheme),
            text,
            files: files
                .into_iter()
                .map(|(name, data)| (name, data.to_vec()))
                .collect(),
            url,
        },
        WorkerMessage::Result {
            kind,
            text,
            files,
            url,
        } => WorkerEvent::Output {
            kind,
            text,
            files: files
                .into_iter()
                .map(|(name, data)| (name, data.to_vec()))
                .collect(),
            url,
        },
    };
    Msg::Worker(event)
}

fn map_scheme(scheme: KeyScheme) -> ProvingScheme {
    match scheme {
        KeyScheme::Groth16 => ProvingScheme::Groth16,
        KeyScheme::Plonk => ProvingScheme::Plonk,
    }
}

fn to_finding(finding: snarkpad_worker::Finding) -> Finding {
    Finding {
        file: finding.uri,
        message: finding.message,
        level: finding.level,
        range: TextRange {
            start_line: finding.start_line,
            start_column: finding.start_column,
            end_line: finding.end_line,
            end_column: finding.end_column,
        },
    }
}
