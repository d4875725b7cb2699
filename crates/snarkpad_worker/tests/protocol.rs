use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::json;
use snarkpad_worker::{classify, JobFile, KeyScheme, RawEnvelope, WorkerMessage, WorkerRequest};

#[test]
fn done_flag_wins_over_any_payload() {
    let envelope = RawEnvelope {
        kind: Some("stdout".to_string()),
        text: Some("leftover".to_string()),
        done: true,
        ..RawEnvelope::default()
    };

    assert_eq!(classify(envelope).expect("classify"), WorkerMessage::Done);
    assert_eq!(
        classify(RawEnvelope::done()).expect("classify"),
        WorkerMessage::Done
    );
}

#[test]
fn debug_and_progress_are_side_channel_messages() {
    assert_eq!(
        classify(RawEnvelope::debug("compiling")).expect("classify"),
        WorkerMessage::Debug {
            text: "compiling".to_string()
        }
    );
    assert_eq!(
        classify(RawEnvelope::progress(0.75)).expect("classify"),
        WorkerMessage::Progress { fraction: 0.75 }
    );

    let malformed = RawEnvelope {
        kind: Some("progress".to_string()),
        ..RawEnvelope::default()
    };
    assert!(classify(malformed).is_err());
}

#[test]
fn unknown_envelopes_fall_back_to_generic_results() {
    let envelope = RawEnvelope {
        kind: Some("witness".to_string()),
        text: Some("computed".to_string()),
        url: Some("https://example.org".to_string()),
        ..RawEnvelope::default()
    };
    match classify(envelope).expect("classify") {
        WorkerMessage::Result {
            kind, text, url, ..
        } => {
            assert_eq!(kind, "witness");
            assert_eq!(text, "computed");
            assert_eq!(url.as_deref(), Some("https://example.org"));
        }
        other => panic!("expected Result, got {other:?}"),
    }

    // No discriminant at all still lands in the log.
    match classify(RawEnvelope::default()).expect("classify") {
        WorkerMessage::Result { kind, .. } => assert_eq!(kind, "result"),
        other => panic!("expected Result, got {other:?}"),
    }
}

#[test]
fn key_bundles_keep_scheme_and_artifacts() {
    let mut files = BTreeMap::new();
    files.insert("main.plonk.sol".to_string(), b"contract".to_vec());
    let envelope = RawEnvelope::keys(KeyScheme::Plonk, "done", files);

    match classify(envelope).expect("classify") {
        WorkerMessage::Keys {
            scheme, files, ..
        } => {
            assert_eq!(scheme, KeyScheme::Plonk);
            assert_eq!(files["main.plonk.sol"].as_ref(), b"contract");
        }
        other => panic!("expected Keys, got {other:?}"),
    }
}

#[test]
fn sarif_reports_flatten_into_findings() {
    let report = json!({
        "runs": [{
            "results": [{
                "level": "warning",
                "message": { "text": "result-level text" },
                "locations": [
                    {
                        "physicalLocation": {
                            "artifactLocation": { "uri": "file://main.circom" },
                            "region": { "startLine": 3, "startColumn": 5, "endLine": 3, "endColumn": 9 }
                        },
                        "message": { "text": "signal is never constrained" }
                    },
                    {
                        // No region: cannot be placed on a buffer.
                        "physicalLocation": {
                            "artifactLocation": { "uri": "file://main.circom" }
                        }
                    }
                ]
            }]
        }]
    });

    match classify(RawEnvelope::sarif(report)).expect("classify") {
        WorkerMessage::Diagnostics(findings) => {
            assert_eq!(findings.len(), 1);
            let finding = &findings[0];
            assert_eq!(finding.uri, "file://main.circom");
            assert_eq!(finding.level.as_deref(), Some("warning"));
            // The location message wins over the result message.
            assert_eq!(finding.message, "signal is never constrained");
            assert_eq!(finding.start_line, 3);
            assert_eq!(finding.end_column, 9);
        }
        other => panic!("expected Diagnostics, got {other:?}"),
    }
}

#[test]
fn requests_serialize_to_the_wire_shapes() {
    let run = WorkerRequest::Run {
        files: vec![JobFile {
            value: "x === 42;".to_string(),
            name: "main.circom".to_string(),
            active: true,
        }],
    };
    assert_eq!(
        serde_json::to_value(&run).expect("serialize"),
        json!({
            "type": "run",
            "files": [{ "value": "x === 42;", "name": "main.circom", "active": true }]
        })
    );

    let keys = WorkerRequest::Plonk {
        url: "https://play.example.org/".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&keys).expect("serialize"),
        json!({ "type": "plonk", "url": "https://play.example.org/" })
    );
}
