use crate::types::TimeUs;
use serde::{Deserialize, Serialize};

/// Tunables for a [`crate::editor::TimelineEditor`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Shortest segment any edit may produce.
    pub min_duration: TimeUs,
    /// Gap left between consecutive segments by `initialize_from_source`.
    pub segment_gap: TimeUs,
    /// Length given to a source segment that has no words.
    pub default_segment_duration: TimeUs,
    /// Maximum number of undo steps kept.
    pub history_size: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_duration: TimeUs(100_000),
            segment_gap: TimeUs(100_000),
            default_segment_duration: TimeUs(5_000_000),
            history_size: 100,
        }
    }
}
