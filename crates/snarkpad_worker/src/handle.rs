use std::sync::{mpsc, Arc};
use std::thread;

use worker_logging::worker_warn;

use crate::protocol::{classify, KeyScheme, RawEnvelope, WorkerMessage, WorkerRequest};
use crate::toolchain::{MessageSink, Toolchain};

/// One worker instance: a background thread hosting the toolchain, reachable
/// through a request channel and drained through a message channel. Messages
/// are delivered in the order the instance produced them.
pub struct WorkerHandle {
    cmd_tx: mpsc::Sender<WorkerRequest>,
    msg_rx: mpsc::Receiver<WorkerMessage>,
    busy: bool,
}

/// Result of a non-blocking poll of the message channel.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerPoll {
    Message(WorkerMessage),
    Empty,
    /// The instance died without sending `done`; the handle is useless now.
    Crashed,
}

impl WorkerHandle {
    /// Spawns a fresh worker instance hosting the given toolchain.
    pub fn spawn(toolchain: Arc<dyn Toolchain>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerRequest>();
        let (msg_tx, msg_rx) = mpsc::channel::<WorkerMessage>();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let sink = ChannelSink {
                tx: msg_tx.clone(),
            };
            while let Ok(request) = cmd_rx.recv() {
                runtime.block_on(handle_request(toolchain.as_ref(), request, &sink));
                // Every request ends with done, whatever happened in between.
                if msg_tx.send(WorkerMessage::Done).is_err() {
                    break;
                }
            }
        });

        Self {
            cmd_tx,
            msg_rx,
            busy: false,
        }
    }

    /// Posts a request. A send on a dead instance is silently dropped; the
    /// controller learns about the death through `poll`.
    pub fn post(&self, request: WorkerRequest) {
        let _ = self.cmd_tx.send(request);
    }

    pub fn poll(&self) -> WorkerPoll {
        match self.msg_rx.try_recv() {
            Ok(message) => WorkerPoll::Message(message),
            Err(mpsc::TryRecvError::Empty) => WorkerPoll::Empty,
            Err(mpsc::TryRecvError::Disconnected) => WorkerPoll::Crashed,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn mark_busy(&mut self) {
        self.busy = true;
    }

    pub fn clear_busy(&mut self) {
        self.busy = false;
    }

    /// Hard termination. Dropping the handle closes both channel ends: the
    /// instance's next receive or send fails and it winds down, and anything
    /// it was still producing is silently discarded. There is no cancellation
    /// handshake.
    pub fn terminate(self) {}
}

/// Classifies envelopes from the toolchain and forwards them to the
/// controller side. A malformed envelope becomes an error result so the
/// failure is visible in the log rather than dropped.
struct ChannelSink {
    tx: mpsc::Sender<WorkerMessage>,
}

impl MessageSink for ChannelSink {
    fn emit(&self, envelope: RawEnvelope) {
        let message = match classify(envelope) {
            Ok(message) => message,
            Err(err) => WorkerMessage::Result {
                kind: "error".to_string(),
                text: err.to_string(),
                files: Default::default(),
                url: None,
            },
        };
        let _ = self.tx.send(message);
    }
}

async fn handle_request(toolchain: &dyn Toolchain, request: WorkerRequest, sink: &ChannelSink) {
    let outcome = match &request {
        WorkerRequest::Run { files } => toolchain.run(files, sink).await,
        WorkerRequest::Groth16 { url } => {
            toolchain.generate_keys(KeyScheme::Groth16, url, sink).await
        }
        WorkerRequest::Plonk { url } => toolchain.generate_keys(KeyScheme::Plonk, url, sink).await,
        WorkerRequest::Verify { data } => toolchain.check_key(data, sink).await,
    };
    if let Err(err) = outcome {
        worker_warn!("toolchain request failed: {err}");
        sink.emit(RawEnvelope::error(err.to_string()));
    }
}
