//! Analyzer findings and the per-buffer markers derived from them.

/// A structured static-analysis report, already flattened from the wire
/// format into one finding per (result, location) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiagnosticSet {
    pub findings: Vec<Finding>,
}

/// One analyzer finding, still carrying the raw file reference and severity
/// level exactly as reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// File reference as reported, possibly a `file:/` URI.
    pub file: String,
    pub message: String,
    /// Severity level as reported (`warning`, `note`, ...), if any.
    pub level: Option<String>,
    pub range: TextRange,
}

/// 1-based line/column span of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// A marker attached to a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub message: String,
    pub severity: MarkerSeverity,
    pub range: TextRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSeverity {
    Error,
    Warning,
    Info,
}

/// Maps a reported severity level to a marker severity.
/// Unknown levels are errors.
pub fn map_severity(level: Option<&str>) -> MarkerSeverity {
    match level {
        Some("warning") => MarkerSeverity::Warning,
        Some("note") => MarkerSeverity::Info,
        _ => MarkerSeverity::Error,
    }
}

/// Normalizes a reported file reference so it can be compared against a
/// buffer name: strips a `file:/` scheme prefix and a leading separator.
pub fn normalize_file_ref(file: &str) -> &str {
    let file = file.strip_prefix("file:/").unwrap_or(file);
    file.strip_prefix('/').unwrap_or(file)
}

impl DiagnosticSet {
    /// Collects the markers this set places on the buffer with the given
    /// name. Matching is computed independently per buffer.
    pub fn markers_for(&self, buffer_name: &str) -> Vec<Marker> {
        self.findings
            .iter()
            .filter(|finding| normalize_file_ref(&finding.file) == buffer_name)
            .map(|finding| Marker {
                message: finding.message.clone(),
                severity: map_severity(finding.level.as_deref()),
                range: finding.range,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_mapping_defaults_to_error() {
        assert_eq!(map_severity(Some("warning")), MarkerSeverity::Warning);
        assert_eq!(map_severity(Some("note")), MarkerSeverity::Info);
        assert_eq!(map_severity(Some("fatal")), MarkerSeverity::Error);
        assert_eq!(map_severity(None), MarkerSeverity::Error);
    }

    #[test]
    fn file_refs_are_normalized() {
        assert_eq!(normalize_file_ref("file://main.circom"), "main.circom");
        assert_eq!(normalize_file_ref("/main.circom"), "main.circom");
        assert_eq!(normalize_file_ref("main.circom"), "main.circom");
    }
}
