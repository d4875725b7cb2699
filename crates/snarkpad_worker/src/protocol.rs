//! The JSON-shaped wire contract between the controller and the worker, and
//! the classifier that turns raw envelopes into typed messages.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sarif::{Finding, SarifLog};

/// One file of a run job as posted over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFile {
    pub value: String,
    pub name: String,
    pub active: bool,
}

/// Controller -> worker requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerRequest {
    /// Compile and analyze the given buffer set.
    Run { files: Vec<JobFile> },
    /// Key-generation pipeline; `url` is the page-origin context reference.
    Groth16 { url: String },
    Plonk { url: String },
    /// Consistency-check a previously generated proving key.
    Verify { data: Vec<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    Groth16,
    Plonk,
}

impl KeyScheme {
    /// Wire discriminant of the key-bundle message for this scheme.
    pub fn tag(self) -> &'static str {
        match self {
            KeyScheme::Groth16 => "groth16 keys",
            KeyScheme::Plonk => "plonk keys",
        }
    }
}

/// Worker -> controller envelope as it appears on the wire. Every field is
/// optional; classification decides what the envelope means.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEnvelope {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, Vec<u8>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub done: bool,
}

impl RawEnvelope {
    pub fn done() -> Self {
        Self {
            done: true,
            ..Self::default()
        }
    }

    pub fn debug(text: impl Into<String>) -> Self {
        Self {
            kind: Some("debug".to_string()),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn progress(fraction: f64) -> Self {
        Self {
            kind: Some("progress".to_string()),
            fraction: Some(fraction),
            ..Self::default()
        }
    }

    pub fn sarif(report: serde_json::Value) -> Self {
        Self {
            kind: Some("sarif".to_string()),
            result: Some(report),
            ..Self::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: Some("error".to_string()),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn output(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn keys(
        scheme: KeyScheme,
        text: impl Into<String>,
        files: BTreeMap<String, Vec<u8>>,
    ) -> Self {
        Self {
            kind: Some(scheme.tag().to_string()),
            text: Some(text.into()),
            files: Some(files),
            ..Self::default()
        }
    }
}

/// A classified worker message.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerMessage {
    /// End of the current run. The done flag wins over any co-occurring
    /// payload; the envelope never reaches the visible log.
    Done,
    Debug {
        text: String,
    },
    Progress {
        fraction: f64,
    },
    /// Flattened static-analysis findings.
    Diagnostics(Vec<Finding>),
    Hover {
        id: u64,
        contents: String,
    },
    /// Terminal key-generation artifacts.
    Keys {
        scheme: KeyScheme,
        text: String,
        files: BTreeMap<String, Bytes>,
        url: Option<String>,
    },
    /// Anything else: a generic result, appended to the visible log as-is.
    Result {
        kind: String,
        text: String,
        files: BTreeMap<String, Bytes>,
        url: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("progress message carries no fraction")]
    MissingFraction,
    #[error("hover message carries no request id")]
    MissingHoverId,
    #[error("malformed analysis report: {0}")]
    MalformedReport(#[from] serde_json::Error),
}

/// Classifies a raw envelope into a typed message.
pub fn classify(mut envelope: RawEnvelope) -> Result<WorkerMessage, ProtocolError> {
    if envelope.done {
        return Ok(WorkerMessage::Done);
    }

    let kind = envelope.kind.take();
    match kind.as_deref() {
        Some("debug") => Ok(WorkerMessage::Debug {
            text: envelope.text.unwrap_or_default(),
        }),
        Some("progress") => match envelope.fraction {
            Some(fraction) => Ok(WorkerMessage::Progress { fraction }),
            None => Err(ProtocolError::MissingFraction),
        },
        Some("sarif") => {
            let report: SarifLog =
                serde_json::from_value(envelope.result.unwrap_or(serde_json::Value::Null))?;
            Ok(WorkerMessage::Diagnostics(report.findings()))
        }
        Some("hover") => Ok(WorkerMessage::Hover {
            id: envelope.id.ok_or(ProtocolError::MissingHoverId)?,
            contents: envelope.text.unwrap_or_default(),
        }),
        Some("groth16 keys") => Ok(keys_message(KeyScheme::Groth16, envelope)),
        Some("plonk keys") => Ok(keys_message(KeyScheme::Plonk, envelope)),
        other => Ok(WorkerMessage::Result {
            kind: match other {
                Some(kind) if !kind.is_empty() => kind.to_string(),
                _ => "result".to_string(),
            },
            text: envelope.text.unwrap_or_default(),
            files: into_artifacts(envelope.files),
            url: envelope.url,
        }),
    }
}

fn keys_message(scheme: KeyScheme, envelope: RawEnvelope) -> WorkerMessage {
    WorkerMessage::Keys {
        scheme,
        text: envelope.text.unwrap_or_default(),
        files: into_artifacts(envelope.files),
        url: envelope.url,
    }
}

fn into_artifacts(files: Option<BTreeMap<String, Vec<u8>>>) -> BTreeMap<String, Bytes> {
    files
        .unwrap_or_default()
        .into_iter()
        .map(|(name, data)| (name, Bytes::from(data)))
        .collect()
}
