use crate::config::EditorConfig;
use crate::editing;
use crate::error::{CoreError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Everything an edit can change: the segment sequence and the deletion set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EditState {
    pub segments: Vec<TimelineSegment>,
    #[serde(default)]
    pub deleted: BTreeSet<Uuid>,
}

impl EditState {
    pub fn new(segments: Vec<TimelineSegment>) -> Self {
        Self {
            segments,
            deleted: BTreeSet::new(),
        }
    }

    /// Replace the sequence, forgetting deletions of segments that are gone.
    pub fn with_segments(&self, segments: Vec<TimelineSegment>) -> Self {
        let deleted = self
            .deleted
            .iter()
            .copied()
            .filter(|id| segments.iter().any(|s| s.id == *id))
            .collect();
        Self { segments, deleted }
    }

    /// Like `with_segments`, for edits that cut fresh segments out of
    /// existing ones. Each `(parent, child)` pair passes the parent's
    /// deletion on to the child.
    pub fn with_replacements(
        &self,
        segments: Vec<TimelineSegment>,
        replaced: &[(Uuid, Uuid)],
    ) -> Self {
        let mut next = self.with_segments(segments);
        for (parent, child) in replaced {
            if self.deleted.contains(parent) {
                next.deleted.insert(*child);
            }
        }
        next
    }

    pub fn validate(&self, config: &EditorConfig) -> Result<()> {
        editing::validate(&self.segments, config)?;
        if let Some(id) = self
            .deleted
            .iter()
            .find(|id| !self.segments.iter().any(|s| s.id == **id))
        {
            return Err(CoreError::InvariantViolation(format!(
                "deleted id {} has no segment",
                id
            )));
        }
        Ok(())
    }
}

/// An edit that derives a new state from the current one.
pub trait Command: std::fmt::Debug {
    fn apply(&self, state: &EditState, config: &EditorConfig) -> Result<EditState>;
    fn description(&self) -> &str;
}

#[derive(Debug)]
struct Entry {
    command: Box<dyn Command>,
    before: EditState,
    after: EditState,
}

/// Undo/redo history stack.
///
/// Entries keep the states on both sides of a command, so redo brings back
/// exactly the segment ids the command produced the first time.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<Entry>,
    redo_stack: Vec<Entry>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
        }
    }

    /// Apply a command to `current` and push it onto the undo stack. The
    /// result must pass validation; nothing is recorded otherwise. Clears
    /// the redo stack.
    pub fn execute(
        &mut self,
        cmd: Box<dyn Command>,
        current: &EditState,
        config: &EditorConfig,
    ) -> Result<EditState> {
        let after = cmd.apply(current, config)?;
        after.validate(config)?;

        self.redo_stack.clear();
        self.undo_stack.push(Entry {
            command: cmd,
            before: current.clone(),
            after: after.clone(),
        });
        if self.undo_stack.len() > self.max_size {
            self.undo_stack.remove(0);
        }
        Ok(after)
    }

    /// Undo the last command, returning the state before it.
    pub fn undo(&mut self) -> Result<EditState> {
        let entry = self.undo_stack.pop().ok_or(CoreError::NothingToUndo)?;
        let state = entry.before.clone();
        self.redo_stack.push(entry);
        Ok(state)
    }

    /// Redo the last undone command, returning the state after it.
    pub fn redo(&mut self) -> Result<EditState> {
        let entry = self.redo_stack.pop().ok_or(CoreError::NothingToRedo)?;
        let state = entry.after.clone();
        self.undo_stack.push(entry);
        Ok(state)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.command.description())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.command.description())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

// ---------------------------------------------------------------------------
// SplitCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SplitCommand {
    segment_id: Uuid,
    at: TimeUs,
}

impl SplitCommand {
    pub fn new(segment_id: Uuid, at: TimeUs) -> Self {
        Self { segment_id, at }
    }
}

impl Command for SplitCommand {
    fn apply(&self, state: &EditState, config: &EditorConfig) -> Result<EditState> {
        let idx = editing::find_index(&state.segments, self.segment_id)?;
        let segments = editing::split_in_sequence(&state.segments, self.segment_id, self.at, config)?;
        let halves = [
            (self.segment_id, segments[idx].id),
            (self.segment_id, segments[idx + 1].id),
        ];
        Ok(state.with_replacements(segments, &halves))
    }

    fn description(&self) -> &str {
        "Split segment"
    }
}

// ---------------------------------------------------------------------------
// TrimCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct TrimCommand {
    segment_id: Uuid,
    new_in: Option<TimeUs>,
    new_out: Option<TimeUs>,
}

impl TrimCommand {
    pub fn new(segment_id: Uuid, new_in: Option<TimeUs>, new_out: Option<TimeUs>) -> Self {
        Self {
            segment_id,
            new_in,
            new_out,
        }
    }
}

impl Command for TrimCommand {
    fn apply(&self, state: &EditState, config: &EditorConfig) -> Result<EditState> {
        let segments = editing::trim_in_sequence(
            &state.segments,
            self.segment_id,
            self.new_in,
            self.new_out,
            config,
        )?;
        Ok(state.with_segments(segments))
    }

    fn description(&self) -> &str {
        "Trim segment"
    }
}

// ---------------------------------------------------------------------------
// RippleMoveCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RippleMoveCommand {
    segment_id: Uuid,
    new_start: TimeUs,
}

impl RippleMoveCommand {
    pub fn new(segment_id: Uuid, new_start: TimeUs) -> Self {
        Self {
            segment_id,
            new_start,
        }
    }
}

impl Command for RippleMoveCommand {
    fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
        let segments = editing::ripple_move(&state.segments, self.segment_id, self.new_start)?;
        Ok(state.with_segments(segments))
    }

    fn description(&self) -> &str {
        "Ripple move"
    }
}

// ---------------------------------------------------------------------------
// InsertCommand / OverwriteCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct InsertCommand {
    segment: TimelineSegment,
}

impl InsertCommand {
    pub fn new(segment: TimelineSegment) -> Self {
        Self { segment }
    }
}

impl Command for InsertCommand {
    fn apply(&self, state: &EditState, config: &EditorConfig) -> Result<EditState> {
        let segments = editing::insert(&state.segments, self.segment.clone(), config)?;
        Ok(state.with_segments(segments))
    }

    fn description(&self) -> &str {
        "Insert segment"
    }
}

#[derive(Debug)]
pub struct OverwriteCommand {
    segment: TimelineSegment,
}

impl OverwriteCommand {
    pub fn new(segment: TimelineSegment) -> Self {
        Self { segment }
    }
}

impl Command for OverwriteCommand {
    fn apply(&self, state: &EditState, config: &EditorConfig) -> Result<EditState> {
        let (segments, lineage) =
            editing::overwrite_traced(&state.segments, self.segment.clone(), config)?;
        Ok(state.with_replacements(segments, &lineage))
    }

    fn description(&self) -> &str {
        "Overwrite"
    }
}

// ---------------------------------------------------------------------------
// RemoveCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct RemoveCommand {
    segment_id: Uuid,
}

impl RemoveCommand {
    pub fn new(segment_id: Uuid) -> Self {
        Self { segment_id }
    }
}

impl Command for RemoveCommand {
    fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
        let segments = editing::remove(&state.segments, self.segment_id)?;
        Ok(state.with_segments(segments))
    }

    fn description(&self) -> &str {
        "Remove segment"
    }
}

// ---------------------------------------------------------------------------
// MoveCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct MoveCommand {
    segment_id: Uuid,
    new_start: TimeUs,
    new_track_index: Option<u32>,
}

impl MoveCommand {
    pub fn new(segment_id: Uuid, new_start: TimeUs, new_track_index: Option<u32>) -> Self {
        Self {
            segment_id,
            new_start,
            new_track_index,
        }
    }
}

impl Command for MoveCommand {
    fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
        let segments = editing::move_segment(
            &state.segments,
            self.segment_id,
            self.new_start,
            self.new_track_index,
        )?;
        Ok(state.with_segments(segments))
    }

    fn description(&self) -> &str {
        if self.new_track_index.is_some() {
            "Move segment to lane"
        } else {
            "Move segment"
        }
    }
}

// ---------------------------------------------------------------------------
// DuplicateCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DuplicateCommand {
    segment_id: Uuid,
    copy_id: Uuid,
}

impl DuplicateCommand {
    pub fn new(segment_id: Uuid) -> Self {
        Self {
            segment_id,
            copy_id: Uuid::new_v4(),
        }
    }

    pub fn copy_id(&self) -> Uuid {
        self.copy_id
    }
}

impl Command for DuplicateCommand {
    fn apply(&self, state: &EditState, config: &EditorConfig) -> Result<EditState> {
        let segments = editing::duplicate(&state.segments, self.segment_id, self.copy_id, config)?;
        Ok(state.with_segments(segments))
    }

    fn description(&self) -> &str {
        "Duplicate segment"
    }
}

// ---------------------------------------------------------------------------
// ReorderCommand
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ReorderCommand {
    lane: Lane,
    order: Vec<Uuid>,
}

impl ReorderCommand {
    pub fn new(lane: Lane, order: Vec<Uuid>) -> Self {
        Self { lane, order }
    }
}

impl Command for ReorderCommand {
    fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
        let segments = editing::reorder(&state.segments, self.lane, &self.order)?;
        Ok(state.with_segments(segments))
    }

    fn description(&self) -> &str {
        "Reorder segments"
    }
}

// ---------------------------------------------------------------------------
// Flag commands
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct SetEnabledCommand {
    segment_id: Uuid,
    enabled: bool,
}

impl SetEnabledCommand {
    pub fn new(segment_id: Uuid, enabled: bool) -> Self {
        Self {
            segment_id,
            enabled,
        }
    }
}

impl Command for SetEnabledCommand {
    fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
        let segments = editing::set_enabled(&state.segments, self.segment_id, self.enabled)?;
        Ok(state.with_segments(segments))
    }

    fn description(&self) -> &str {
        if self.enabled {
            "Enable segment"
        } else {
            "Disable segment"
        }
    }
}

#[derive(Debug)]
pub struct SetLockedCommand {
    segment_id: Uuid,
    locked: bool,
}

impl SetLockedCommand {
    pub fn new(segment_id: Uuid, locked: bool) -> Self {
        Self { segment_id, locked }
    }
}

impl Command for SetLockedCommand {
    fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
        let segments = editing::set_locked(&state.segments, self.segment_id, self.locked)?;
        Ok(state.with_segments(segments))
    }

    fn description(&self) -> &str {
        if self.locked {
            "Lock segment"
        } else {
            "Unlock segment"
        }
    }
}

// ---------------------------------------------------------------------------
// Deletion commands
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct DeleteSegmentCommand {
    segment_id: Uuid,
}

impl DeleteSegmentCommand {
    pub fn new(segment_id: Uuid) -> Self {
        Self { segment_id }
    }
}

impl Command for DeleteSegmentCommand {
    fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
        editing::find_index(&state.segments, self.segment_id)?;
        let mut next = state.clone();
        next.deleted.insert(self.segment_id);
        Ok(next)
    }

    fn description(&self) -> &str {
        "Delete segment"
    }
}

#[derive(Debug)]
pub struct RestoreSegmentCommand {
    segment_id: Uuid,
}

impl RestoreSegmentCommand {
    pub fn new(segment_id: Uuid) -> Self {
        Self { segment_id }
    }
}

impl Command for RestoreSegmentCommand {
    fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
        editing::find_index(&state.segments, self.segment_id)?;
        let mut next = state.clone();
        next.deleted.remove(&self.segment_id);
        Ok(next)
    }

    fn description(&self) -> &str {
        "Restore segment"
    }
}

#[derive(Debug, Default)]
pub struct ClearDeletionsCommand;

impl ClearDeletionsCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ClearDeletionsCommand {
    fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
        Ok(EditState::new(state.segments.clone()))
    }

    fn description(&self) -> &str {
        "Restore all segments"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: i64 = 1_000_000;

    fn make_segment(start_s: i64, len_s: i64) -> TimelineSegment {
        TimelineSegment::new(
            Uuid::new_v4(),
            Lane::new(TrackKind::Subtitle, 0),
            TimeUs(start_s * SEC),
            TimeUs::ZERO,
            TimeUs(len_s * SEC),
        )
    }

    fn make_test_state() -> (EditState, Uuid, Uuid) {
        let a = make_segment(0, 5);
        let b = make_segment(5, 5);
        let (a_id, b_id) = (a.id, b.id);
        (EditState::new(vec![a, b]), a_id, b_id)
    }

    // -----------------------------------------------------------------------
    // Execute + undo/redo
    // -----------------------------------------------------------------------

    #[test]
    fn split_undo_redo() {
        let (state, a_id, _) = make_test_state();
        let config = EditorConfig::default();
        let mut history = History::new(100);

        let cmd = Box::new(SplitCommand::new(a_id, TimeUs(2 * SEC)));
        let after = history.execute(cmd, &state, &config).unwrap();
        assert_eq!(after.segments.len(), 3);

        // Undo: original state back
        let undone = history.undo().unwrap();
        assert_eq!(undone, state);

        // Redo: same ids as the first time
        let redone = history.redo().unwrap();
        assert_eq!(redone, after);
    }

    #[test]
    fn split_halves_inherit_deletion() {
        let (mut state, a_id, b_id) = make_test_state();
        state.deleted.insert(a_id);
        let config = EditorConfig::default();
        let mut history = History::new(100);

        let after = history
            .execute(Box::new(SplitCommand::new(a_id, TimeUs(2 * SEC))), &state, &config)
            .unwrap();
        let halves: BTreeSet<Uuid> = after.segments[..2].iter().map(|s| s.id).collect();
        assert_eq!(after.deleted, halves);
        assert!(!after.deleted.contains(&b_id));

        // Splitting a kept segment deletes nothing.
        let after = history
            .execute(Box::new(SplitCommand::new(b_id, TimeUs(7 * SEC))), &after, &config)
            .unwrap();
        assert_eq!(after.deleted, halves);
    }

    #[test]
    fn overwrite_remnants_inherit_deletion() {
        let (mut state, a_id, _) = make_test_state();
        state.deleted.insert(a_id);
        let config = EditorConfig::default();
        let mut history = History::new(100);

        let source = state.segments[0].source_segment_id;
        let new = TimelineSegment::new(
            source,
            Lane::new(TrackKind::Subtitle, 0),
            TimeUs(2 * SEC),
            TimeUs::ZERO,
            TimeUs(SEC),
        );
        let new_id = new.id;
        let after = history
            .execute(Box::new(OverwriteCommand::new(new)), &state, &config)
            .unwrap();

        // a = [0,5) is spanned by [2,3): head [0,2) and tail [3,5) stay cut.
        assert_eq!(after.segments.len(), 4);
        assert_eq!(after.deleted.len(), 2);
        assert!(!after.deleted.contains(&new_id));
        for id in &after.deleted {
            let s = after.segments.iter().find(|s| s.id == *id).unwrap();
            assert_eq!(s.source_segment_id, state.segments[0].source_segment_id);
            assert_ne!(s.id, a_id);
        }
    }

    #[test]
    fn new_action_clears_redo() {
        let (state, a_id, b_id) = make_test_state();
        let config = EditorConfig::default();
        let mut history = History::new(100);

        history
            .execute(Box::new(RemoveCommand::new(a_id)), &state, &config)
            .unwrap();
        let state = history.undo().unwrap();
        assert!(history.can_redo());

        history
            .execute(Box::new(RemoveCommand::new(b_id)), &state, &config)
            .unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_empty_history_errors() {
        let mut history = History::new(100);
        assert!(matches!(history.undo().unwrap_err(), CoreError::NothingToUndo));
    }

    #[test]
    fn redo_empty_stack_errors() {
        let mut history = History::new(100);
        assert!(matches!(history.redo().unwrap_err(), CoreError::NothingToRedo));
    }

    #[test]
    fn failed_command_records_nothing() {
        let (state, a_id, _) = make_test_state();
        let config = EditorConfig::default();
        let mut history = History::new(100);

        let result = history.execute(
            Box::new(MoveCommand::new(a_id, TimeUs(3 * SEC), None)),
            &state,
            &config,
        );
        assert!(matches!(result, Err(CoreError::OverlapDetected { .. })));
        assert!(!history.can_undo());
    }

    #[test]
    fn invalid_result_is_rejected() {
        #[derive(Debug)]
        struct Corrupt;
        impl Command for Corrupt {
            fn apply(&self, state: &EditState, _config: &EditorConfig) -> Result<EditState> {
                let mut next = state.clone();
                next.segments[1].start_time = TimeUs(SEC);
                Ok(next)
            }
            fn description(&self) -> &str {
                "Corrupt"
            }
        }

        let (state, _, _) = make_test_state();
        let mut history = History::new(100);
        let result = history.execute(Box::new(Corrupt), &state, &EditorConfig::default());
        assert!(matches!(result, Err(CoreError::InvariantViolation(_))));
        assert!(!history.can_undo());
    }

    #[test]
    fn max_size_limits_undo_stack() {
        let config = EditorConfig::default();
        let mut state = EditState::new(vec![make_segment(0, 5)]);
        let id = state.segments[0].id;
        let mut history = History::new(3);

        for i in 1..=5 {
            let cmd = Box::new(MoveCommand::new(id, TimeUs(i * 10 * SEC), None));
            state = history.execute(cmd, &state, &config).unwrap();
        }

        let mut undos = 0;
        while history.undo().is_ok() {
            undos += 1;
        }
        assert_eq!(undos, 3);
    }

    #[test]
    fn can_undo_can_redo_flags() {
        let (state, a_id, _) = make_test_state();
        let config = EditorConfig::default();
        let mut history = History::new(100);
        assert!(!history.can_undo());
        assert!(!history.can_redo());

        history
            .execute(Box::new(SetLockedCommand::new(a_id, true)), &state, &config)
            .unwrap();
        assert!(history.can_undo());
        assert!(!history.can_redo());

        history.undo().unwrap();
        assert!(!history.can_undo());
        assert!(history.can_redo());

        history.clear();
        assert!(!history.can_redo());
    }

    #[test]
    fn description_methods() {
        let (state, a_id, _) = make_test_state();
        let config = EditorConfig::default();
        let mut history = History::new(100);
        assert_eq!(history.undo_description(), None);

        history
            .execute(Box::new(SetEnabledCommand::new(a_id, false)), &state, &config)
            .unwrap();
        assert_eq!(history.undo_description(), Some("Disable segment"));

        history.undo().unwrap();
        assert_eq!(history.redo_description(), Some("Disable segment"));
    }

    // -----------------------------------------------------------------------
    // Individual commands
    // -----------------------------------------------------------------------

    #[test]
    fn duplicate_uses_reserved_id() {
        let (state, a_id, b_id) = make_test_state();
        let config = EditorConfig::default();
        let cmd = DuplicateCommand::new(a_id);
        let copy_id = cmd.copy_id();

        let after = cmd.apply(&state, &config).unwrap();
        let copy = &after.segments[editing::find_index(&after.segments, copy_id).unwrap()];
        assert_eq!(copy.start_time, TimeUs(5 * SEC));
        let b = &after.segments[editing::find_index(&after.segments, b_id).unwrap()];
        assert_eq!(b.start_time, TimeUs(10 * SEC));
    }

    #[test]
    fn delete_and_restore_toggle_state() {
        let (state, a_id, _) = make_test_state();
        let config = EditorConfig::default();

        let deleted = DeleteSegmentCommand::new(a_id).apply(&state, &config).unwrap();
        assert!(deleted.deleted.contains(&a_id));
        assert_eq!(deleted.segments, state.segments);

        let restored = RestoreSegmentCommand::new(a_id).apply(&deleted, &config).unwrap();
        assert_eq!(restored, state);

        let result = DeleteSegmentCommand::new(Uuid::new_v4()).apply(&state, &config);
        assert!(matches!(result, Err(CoreError::UnknownSegment(_))));
    }

    #[test]
    fn removing_a_deleted_segment_forgets_deletion() {
        let (state, a_id, _) = make_test_state();
        let config = EditorConfig::default();
        let deleted = DeleteSegmentCommand::new(a_id).apply(&state, &config).unwrap();
        let removed = RemoveCommand::new(a_id).apply(&deleted, &config).unwrap();
        assert!(removed.deleted.is_empty());
        removed.validate(&config).unwrap();
    }

    #[test]
    fn ripple_and_trim_commands() {
        let (state, a_id, b_id) = make_test_state();
        let config = EditorConfig::default();

        let trimmed = TrimCommand::new(a_id, None, Some(TimeUs(3 * SEC)))
            .apply(&state, &config)
            .unwrap();
        assert_eq!(trimmed.segments[0].end_time(), TimeUs(3 * SEC));

        let rippled = RippleMoveCommand::new(b_id, TimeUs(3 * SEC))
            .apply(&trimmed, &config)
            .unwrap();
        assert_eq!(rippled.segments[1].start_time, TimeUs(3 * SEC));
        rippled.validate(&config).unwrap();
    }

    #[test]
    fn insert_overwrite_reorder_commands() {
        let (state, a_id, b_id) = make_test_state();
        let config = EditorConfig::default();

        let inserted = InsertCommand::new(make_segment(5, 1))
            .apply(&state, &config)
            .unwrap();
        assert_eq!(inserted.segments.len(), 3);
        inserted.validate(&config).unwrap();

        let overwritten = OverwriteCommand::new(make_segment(4, 2))
            .apply(&state, &config)
            .unwrap();
        overwritten.validate(&config).unwrap();

        let reordered = ReorderCommand::new(Lane::new(TrackKind::Subtitle, 0), vec![b_id, a_id])
            .apply(&state, &config)
            .unwrap();
        let b = &reordered.segments[editing::find_index(&reordered.segments, b_id).unwrap()];
        assert_eq!(b.start_time, TimeUs::ZERO);
    }

    #[test]
    fn validate_rejects_dangling_deletion() {
        let (mut state, _, _) = make_test_state();
        state.deleted.insert(Uuid::new_v4());
        assert!(matches!(
            state.validate(&EditorConfig::default()),
            Err(CoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn state_serde_roundtrip() {
        let (mut state, a_id, _) = make_test_state();
        state.deleted.insert(a_id);
        let json = serde_json::to_string(&state).unwrap();
        let back: EditState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
