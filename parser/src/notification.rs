//! Inactive-region notification payload

use serde::{Deserialize, Serialize};
use source_map::Range;

/// Method name of the notification telling the editor which ranges the
/// preprocessor disabled
pub const INACTIVE_REGIONS_METHOD: &str = "krkrtools/inactiveRegions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InactiveRegionParams {
    pub file_uri: String,
    pub ranges: Vec<Range>,
}

impl InactiveRegionParams {
    pub fn new(file_uri: impl Into<String>, ranges: &[Range]) -> Self {
        Self {
            file_uri: file_uri.into(),
            ranges: ranges.to_vec(),
        }
    }
}
