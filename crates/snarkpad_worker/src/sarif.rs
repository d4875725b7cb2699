//! The subset of the SARIF static-analysis format the analyzer emits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SarifLog {
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SarifRun {
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SarifResult {
    pub level: Option<String>,
    pub message: Option<SarifMessage>,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SarifMessage {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: Option<PhysicalLocation>,
    pub message: Option<SarifMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicalLocation {
    pub artifact_location: Option<ArtifactLocation>,
    pub region: Option<Region>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArtifactLocation {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Region {
    pub start_line: Option<u32>,
    pub start_column: Option<u32>,
    pub end_line: Option<u32>,
    pub end_column: Option<u32>,
}

/// One finding flattened out of a report: one (result, location) pair with a
/// resolvable file reference and a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// File reference as reported, possibly a `file:/` URI.
    pub uri: String,
    /// Severity level as reported (`warning`, `note`, ...), if any.
    pub level: Option<String>,
    pub message: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl SarifLog {
    /// Flattens the report into findings. Locations without a file reference
    /// or a region cannot be placed on a buffer and are skipped.
    pub fn findings(&self) -> Vec<Finding> {
        self.runs
            .iter()
            .flat_map(|run| &run.results)
            .flat_map(|result| {
                result.locations.iter().filter_map(move |location| {
                    let physical = location.physical_location.as_ref()?;
                    let uri = physical.artifact_location.as_ref()?.uri.clone()?;
                    let region = physical.region.as_ref()?;
                    let start_line = region.start_line.unwrap_or(1);
                    let start_column = region.start_column.unwrap_or(1);
                    Some(Finding {
                        uri,
                        level: result.level.clone(),
                        message: location
                            .message
                            .as_ref()
                            .and_then(|m| m.text.clone())
                            .or_else(|| result.message.as_ref().and_then(|m| m.text.clone()))
                            .unwrap_or_default(),
                        start_line,
                        start_column,
                        end_line: region.end_line.unwrap_or(start_line),
                        end_column: region.end_column.unwrap_or(start_column),
                    })
                })
            })
            .collect()
    }
}
