use snarkpad_core::AppViewModel;

/// Disclaimer attached to groth16 key bundles.
const INSECURE_KEYS_WARNING: &str = "WARNING: These keys are strictly for testing purposes, \
and are generated without a proper trusted setup!";

/// Renders the output view as plain text lines, one entry per message plus
/// its artifact list, then the progress and loading indicators.
pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in &view.entries {
        lines.push(format!("{}: {}", entry.label, entry.text));
        if entry.insecure {
            lines.push(INSECURE_KEYS_WARNING.to_string());
        }
        if let Some(url) = &entry.url {
            lines.push(format!("  -> {url}"));
        }
        for file in &entry.files {
            lines.push(format!("  {} ({} KB)", file.name, file.size_kb));
        }
    }
    if view.progress_visible {
        lines.push(format!("progress: {:.0}%", view.progress * 100.0));
    }
    if view.running.is_some() {
        lines.push("running...".to_string());
    }
    lines
}
