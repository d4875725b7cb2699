use crate::diagnostics::Marker;
use crate::state::{AppState, RunToken, WorkerLink};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    /// Animation identity for the loading indicator; `None` when idle.
    pub running: Option<RunToken>,
    pub progress: f64,
    /// The progress bar is shown only while the fraction is not 1.
    pub progress_visible: bool,
    pub entries: Vec<LogEntryView>,
    /// Key-generation and verify actions are offered only when no run is in
    /// flight and a worker instance exists.
    pub actions_enabled: bool,
    pub buffers: Vec<BufferView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferView {
    pub name: String,
    pub active: bool,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntryView {
    pub label: String,
    pub text: String,
    pub url: Option<String>,
    /// Groth16 key bundles carry the trusted-setup disclaimer.
    pub insecure: bool,
    pub files: Vec<ArtifactView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactView {
    pub name: String,
    /// Size in kilobytes, two decimal places.
    pub size_kb: String,
}

/// Formats a byte length in kilobytes to two decimal places.
pub fn format_size_kb(len: usize) -> String {
    format!("{:.2}", len as f64 / 1000.0)
}

impl AppViewModel {
    pub(crate) fn of(state: &AppState) -> Self {
        let running = state.run_token();
        Self {
            running,
            progress: state.progress(),
            progress_visible: state.progress() != 1.0,
            entries: state
                .log()
                .iter()
                .map(|entry| LogEntryView {
                    label: entry.kind.clone(),
                    text: entry.text.clone(),
                    url: entry.url.clone(),
                    insecure: entry.kind == "groth16 keys",
                    files: entry
                        .files
                        .iter()
                        .map(|(name, data)| ArtifactView {
                            name: name.clone(),
                            size_kb: format_size_kb(data.len()),
                        })
                        .collect(),
                })
                .collect(),
            actions_enabled: running.is_none() && state.worker_link() != WorkerLink::Absent,
            buffers: state
                .buffers()
                .iter()
                .map(|buffer| BufferView {
                    name: buffer.name.clone(),
                    active: buffer.active,
                    markers: buffer.markers.clone(),
                })
                .collect(),
            dirty: state.is_dirty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::format_size_kb;

    #[test]
    fn sizes_are_rendered_in_kilobytes() {
        assert_eq!(format_size_kb(0), "0.00");
        assert_eq!(format_size_kb(1234), "1.23");
        assert_eq!(format_size_kb(1000000), "1000.00");
    }
}
