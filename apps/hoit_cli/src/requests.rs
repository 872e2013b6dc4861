//! JSON shapes accepted on the command line. Times are in seconds.

use hoit_core::types::{Lane, SourceSegment, SourceWord, TimeUs, TimelineSegment, TrackKind};
use hoit_core::{CoreError, TimelineEditor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds to `TimeUs`, rejecting values the timeline cannot hold.
pub fn secs(s: f64) -> hoit_core::Result<TimeUs> {
    TimeUs::try_from_seconds(s).ok_or_else(|| {
        CoreError::InvalidRange(format!(
            "{} s is outside +/-{} s",
            s,
            TimeUs::MAX_SECONDS
        ))
    })
}

// ---------------------------------------------------------------------------
// Transcript import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptWord {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub text: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptSegment {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub speaker: String,
    pub words: Vec<TranscriptWord>,
}

impl TryFrom<TranscriptSegment> for SourceSegment {
    type Error = CoreError;

    fn try_from(segment: TranscriptSegment) -> hoit_core::Result<Self> {
        let words = segment
            .words
            .into_iter()
            .map(|w| -> hoit_core::Result<SourceWord> {
                Ok(SourceWord {
                    id: w.id.unwrap_or_else(Uuid::new_v4),
                    start: secs(w.start)?,
                    end: secs(w.end)?,
                    text: w.text,
                })
            })
            .collect::<hoit_core::Result<Vec<_>>>()?;
        Ok(SourceSegment {
            id: segment.id.unwrap_or_else(Uuid::new_v4),
            speaker: segment.speaker,
            words,
        })
    }
}

// ---------------------------------------------------------------------------
// Edit requests
// ---------------------------------------------------------------------------

fn default_track() -> TrackKind {
    TrackKind::Subtitle
}

/// A new segment placed by `insert` or `overwrite`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub source: Uuid,
    pub start: f64,
    pub in_point: f64,
    pub out_point: f64,
    #[serde(default = "default_track")]
    pub track: TrackKind,
    #[serde(default)]
    pub track_index: u32,
}

impl Placement {
    fn to_segment(&self) -> hoit_core::Result<TimelineSegment> {
        Ok(TimelineSegment::new(
            self.source,
            Lane::new(self.track, self.track_index),
            secs(self.start)?,
            secs(self.in_point)?,
            secs(self.out_point)?,
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditRequest {
    Split {
        segment: Uuid,
        at: f64,
    },
    Trim {
        segment: Uuid,
        #[serde(default)]
        in_point: Option<f64>,
        #[serde(default)]
        out_point: Option<f64>,
    },
    RippleMove {
        segment: Uuid,
        start: f64,
    },
    Insert(Placement),
    Overwrite(Placement),
    Remove {
        segment: Uuid,
    },
    Move {
        segment: Uuid,
        start: f64,
        #[serde(default)]
        track_index: Option<u32>,
    },
    Duplicate {
        segment: Uuid,
    },
    Reorder {
        #[serde(default = "default_track")]
        track: TrackKind,
        #[serde(default)]
        track_index: u32,
        order: Vec<Uuid>,
    },
    SetEnabled {
        segment: Uuid,
        enabled: bool,
    },
    SetLocked {
        segment: Uuid,
        locked: bool,
    },
    Delete {
        segment: Uuid,
    },
    Restore {
        segment: Uuid,
    },
    Undo,
    Redo,
}

impl EditRequest {
    /// Run the request against an editor. Returns the id of a segment the
    /// request created, if any.
    pub fn apply(&self, editor: &mut TimelineEditor) -> hoit_core::Result<Option<Uuid>> {
        match self {
            EditRequest::Split { segment, at } => {
                let (_, right) = editor.split(*segment, secs(*at)?)?;
                Ok(Some(right))
            }
            EditRequest::Trim {
                segment,
                in_point,
                out_point,
            } => {
                let in_point = in_point.map(secs).transpose()?;
                let out_point = out_point.map(secs).transpose()?;
                editor.trim(*segment, in_point, out_point).map(|_| None)
            }
            EditRequest::RippleMove { segment, start } => {
                editor.ripple_move(*segment, secs(*start)?).map(|_| None)
            }
            EditRequest::Insert(placement) => editor.insert(placement.to_segment()?).map(Some),
            EditRequest::Overwrite(placement) => {
                editor.overwrite(placement.to_segment()?).map(Some)
            }
            EditRequest::Remove { segment } => editor.remove(*segment).map(|_| None),
            EditRequest::Move {
                segment,
                start,
                track_index,
            } => editor
                .move_segment(*segment, secs(*start)?, *track_index)
                .map(|_| None),
            EditRequest::Duplicate { segment } => editor.duplicate(*segment).map(Some),
            EditRequest::Reorder {
                track,
                track_index,
                order,
            } => editor
                .reorder(Lane::new(*track, *track_index), order.clone())
                .map(|_| None),
            EditRequest::SetEnabled { segment, enabled } => {
                editor.set_enabled(*segment, *enabled).map(|_| None)
            }
            EditRequest::SetLocked { segment, locked } => {
                editor.set_locked(*segment, *locked).map(|_| None)
            }
            EditRequest::Delete { segment } => editor.delete_segment(*segment).map(|_| None),
            EditRequest::Restore { segment } => editor.restore_segment(*segment).map(|_| None),
            EditRequest::Undo => editor.undo().map(|_| None),
            EditRequest::Redo => editor.redo().map(|_| None),
        }
    }
}
