use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

/// Side channel for hover lookups: worker replies are matched to waiting
/// requests by id, decoupled from the log and diagnostics paths.
#[derive(Default)]
pub struct HoverResolver {
    pending: Mutex<HashMap<u64, Sender<String>>>,
}

impl HoverResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a lookup and returns the receiving end for its reply.
    pub fn register(&self, request_id: u64) -> Receiver<String> {
        let (tx, rx) = channel();
        self.pending.lock().expect("hover lock").insert(request_id, tx);
        rx
    }

    /// Delivers a worker reply. A reply nobody is waiting for is dropped.
    pub fn resolve(&self, request_id: u64, contents: String) {
        if let Some(tx) = self.pending.lock().expect("hover lock").remove(&request_id) {
            let _ = tx.send(contents);
        }
    }
}
