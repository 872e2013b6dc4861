use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Segment not found: {0}")]
    UnknownSegment(Uuid),

    #[error("Source segment not found: {0}")]
    UnknownSource(Uuid),

    #[error("Segment is locked: {0}")]
    SegmentLocked(Uuid),

    #[error("Segment {segment} overlaps {existing}")]
    OverlapDetected { segment: Uuid, existing: Uuid },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

pub type Result<T> = std::result::Result<T, CoreError>;
