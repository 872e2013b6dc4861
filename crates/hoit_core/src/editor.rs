use crate::config::EditorConfig;
use crate::editing::{self, MappingResult};
use crate::error::{CoreError, Result};
use crate::history::*;
use crate::ranges::{PlayableRange, RangeMapper, RangeSnapshot, SkipDecision};
use crate::types::*;
use crate::words::{MappingStats, WordMapper, WordMapping};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// One editing session over a transcript.
///
/// Owns the segment sequence and keeps the range and word mappers in step
/// with it. Every structural edit goes through the undo history.
#[derive(Debug)]
pub struct TimelineEditor {
    config: EditorConfig,
    sources: BTreeMap<Uuid, SourceSegment>,
    state: EditState,
    ranges: RangeMapper,
    words: WordMapper,
    words_version: Option<u64>,
    history: History,
    version: u64,
}

impl TimelineEditor {
    /// Start a session with one segment per source segment.
    pub fn new(sources: Vec<SourceSegment>, media_duration: TimeUs, config: EditorConfig) -> Self {
        let segments = editing::initialize_from_source(&sources, &config);
        tracing::info!(
            sources = sources.len(),
            segments = segments.len(),
            media_duration = %media_duration,
            "timeline initialized"
        );
        Self::assemble(sources, media_duration, EditState::new(segments), config)
    }

    /// Resume a session from a saved state.
    pub fn from_state(
        sources: Vec<SourceSegment>,
        media_duration: TimeUs,
        state: EditState,
        config: EditorConfig,
    ) -> Result<Self> {
        state.validate(&config)?;
        if let Some(missing) = state
            .segments
            .iter()
            .map(|s| s.source_segment_id)
            .find(|id| !sources.iter().any(|src| src.id == *id))
        {
            return Err(CoreError::UnknownSource(missing));
        }
        tracing::info!(
            segments = state.segments.len(),
            deleted = state.deleted.len(),
            "timeline restored"
        );
        Ok(Self::assemble(sources, media_duration, state, config))
    }

    fn assemble(
        sources: Vec<SourceSegment>,
        media_duration: TimeUs,
        state: EditState,
        config: EditorConfig,
    ) -> Self {
        let mut ranges = RangeMapper::new(&state.segments, media_duration);
        ranges.replace_deletions(state.deleted.clone());
        Self {
            history: History::new(config.history_size),
            sources: sources.into_iter().map(|s| (s.id, s)).collect(),
            words: WordMapper::new(),
            words_version: None,
            version: 0,
            config,
            state,
            ranges,
        }
    }

    // -----------------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------------

    /// Split a segment; returns the ids of the left and right halves.
    pub fn split(&mut self, segment_id: Uuid, at: TimeUs) -> Result<(Uuid, Uuid)> {
        let idx = editing::find_index(&self.state.segments, segment_id)?;
        self.run(Box::new(SplitCommand::new(segment_id, at)))?;
        Ok((self.state.segments[idx].id, self.state.segments[idx + 1].id))
    }

    /// Change a segment's trim window. Points are clamped to the source
    /// segment's length.
    pub fn trim(
        &mut self,
        segment_id: Uuid,
        new_in: Option<TimeUs>,
        new_out: Option<TimeUs>,
    ) -> Result<()> {
        let segment = self.require_segment(segment_id)?;
        let limit = editing::source_length(self.require_source(segment.source_segment_id)?, &self.config);
        let new_in = new_in.map(|t| t.min(limit - self.config.min_duration));
        let new_out = new_out.map(|t| t.min(limit));
        self.run(Box::new(TrimCommand::new(segment_id, new_in, new_out)))
    }

    pub fn ripple_move(&mut self, segment_id: Uuid, new_start: TimeUs) -> Result<()> {
        self.run(Box::new(RippleMoveCommand::new(segment_id, new_start)))
    }

    pub fn insert(&mut self, segment: TimelineSegment) -> Result<Uuid> {
        self.require_source(segment.source_segment_id)?;
        let id = segment.id;
        self.run(Box::new(InsertCommand::new(segment)))?;
        Ok(id)
    }

    pub fn overwrite(&mut self, segment: TimelineSegment) -> Result<Uuid> {
        self.require_source(segment.source_segment_id)?;
        let id = segment.id;
        self.run(Box::new(OverwriteCommand::new(segment)))?;
        Ok(id)
    }

    pub fn remove(&mut self, segment_id: Uuid) -> Result<()> {
        self.run(Box::new(RemoveCommand::new(segment_id)))
    }

    pub fn move_segment(
        &mut self,
        segment_id: Uuid,
        new_start: TimeUs,
        new_track_index: Option<u32>,
    ) -> Result<()> {
        self.run(Box::new(MoveCommand::new(segment_id, new_start, new_track_index)))
    }

    /// Duplicate a segment right after itself; returns the copy's id.
    pub fn duplicate(&mut self, segment_id: Uuid) -> Result<Uuid> {
        let cmd = DuplicateCommand::new(segment_id);
        let copy_id = cmd.copy_id();
        self.run(Box::new(cmd))?;
        Ok(copy_id)
    }

    pub fn reorder(&mut self, lane: Lane, order: Vec<Uuid>) -> Result<()> {
        self.run(Box::new(ReorderCommand::new(lane, order)))
    }

    pub fn set_enabled(&mut self, segment_id: Uuid, enabled: bool) -> Result<()> {
        self.run(Box::new(SetEnabledCommand::new(segment_id, enabled)))
    }

    pub fn set_locked(&mut self, segment_id: Uuid, locked: bool) -> Result<()> {
        self.run(Box::new(SetLockedCommand::new(segment_id, locked)))
    }

    // -----------------------------------------------------------------------
    // Deletions
    // -----------------------------------------------------------------------

    /// Cut a segment out of playback. `Ok(false)` when it already was.
    pub fn delete_segment(&mut self, segment_id: Uuid) -> Result<bool> {
        self.require_segment(segment_id)?;
        if self.state.deleted.contains(&segment_id) {
            return Ok(false);
        }
        self.run(Box::new(DeleteSegmentCommand::new(segment_id)))?;
        Ok(true)
    }

    /// Bring a deleted segment back. `Ok(false)` when it was not deleted.
    pub fn restore_segment(&mut self, segment_id: Uuid) -> Result<bool> {
        self.require_segment(segment_id)?;
        if !self.state.deleted.contains(&segment_id) {
            return Ok(false);
        }
        self.run(Box::new(RestoreSegmentCommand::new(segment_id)))?;
        Ok(true)
    }

    /// Restore every deleted segment; returns how many there were.
    pub fn clear_deletions(&mut self) -> Result<usize> {
        let count = self.state.deleted.len();
        if count > 0 {
            self.run(Box::new(ClearDeletionsCommand::new()))?;
        }
        Ok(count)
    }

    pub fn is_deleted(&self, segment_id: Uuid) -> bool {
        self.state.deleted.contains(&segment_id)
    }

    pub fn deleted_ids(&self) -> &BTreeSet<Uuid> {
        &self.state.deleted
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<()> {
        let state = self.history.undo()?;
        tracing::debug!(version = self.version + 1, "undo");
        self.commit(state);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        let state = self.history.redo()?;
        tracing::debug!(version = self.version + 1, "redo");
        self.commit(state);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    // -----------------------------------------------------------------------
    // Sequence queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Bumped on every applied edit, undo and redo.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn segments(&self) -> &[TimelineSegment] {
        &self.state.segments
    }

    pub fn segment(&self, segment_id: Uuid) -> Option<&TimelineSegment> {
        self.state.segments.iter().find(|s| s.id == segment_id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceSegment> {
        self.sources.values()
    }

    pub fn source(&self, source_id: Uuid) -> Option<&SourceSegment> {
        self.sources.get(&source_id)
    }

    pub fn media_duration(&self) -> TimeUs {
        self.ranges.media_duration()
    }

    /// Enabled, undeleted segments covering `t`.
    pub fn active_segments_at(&self, t: TimeUs, track: Option<TrackKind>) -> Vec<&TimelineSegment> {
        editing::active_segments_at(&self.state.segments, t, track)
            .into_iter()
            .filter(|s| !self.state.deleted.contains(&s.id))
            .collect()
    }

    pub fn total_duration(&self) -> TimeUs {
        editing::total_duration(&self.state.segments)
    }

    /// Source-local time under a timeline position on the given track.
    pub fn map_timeline_to_source(&self, t: TimeUs, track: TrackKind) -> MappingResult {
        match self.active_segments_at(t, Some(track)).first() {
            Some(segment) => editing::map_timeline_to_source(segment, t),
            None => MappingResult::OutOfRange,
        }
    }

    // -----------------------------------------------------------------------
    // Range queries
    // -----------------------------------------------------------------------

    pub fn playable_ranges(&self) -> &[PlayableRange] {
        self.ranges.playable_ranges()
    }

    pub fn map_to_original_time(&self, adjusted: TimeUs) -> TimeUs {
        self.ranges.map_to_original_time(adjusted)
    }

    pub fn map_to_adjusted_time(&self, original: TimeUs) -> Option<TimeUs> {
        self.ranges.map_to_adjusted_time(original)
    }

    pub fn should_skip_segment(&self, adjusted: TimeUs) -> SkipDecision {
        self.ranges.should_skip_segment(adjusted)
    }

    pub fn should_skip_original(&self, original: TimeUs) -> SkipDecision {
        self.ranges.should_skip_original(original)
    }

    pub fn adjusted_duration(&self) -> TimeUs {
        self.ranges.adjusted_duration()
    }

    pub fn segment_at_adjusted(&self, adjusted: TimeUs) -> Option<Uuid> {
        self.ranges.segment_at_adjusted(adjusted)
    }

    pub fn range_snapshot(&self) -> RangeSnapshot {
        self.ranges.snapshot()
    }

    // -----------------------------------------------------------------------
    // Word queries
    // -----------------------------------------------------------------------

    pub fn active_words_at(&mut self, t: TimeUs) -> Result<Vec<&WordMapping>> {
        self.sync_words()?;
        Ok(self.words.active_words_at(t))
    }

    pub fn word_timeline_range(&mut self, word_id: Uuid) -> Result<Option<TimeRange>> {
        self.sync_words()?;
        Ok(self.words.word_timeline_range(word_id))
    }

    pub fn word_mapping(&mut self, segment_id: Uuid) -> Result<Option<&[WordMapping]>> {
        self.sync_words()?;
        Ok(self.words.mapping(segment_id))
    }

    pub fn display_text(&mut self, segment_id: Uuid, window: Option<TimeRange>) -> Result<String> {
        self.sync_words()?;
        Ok(self.words.display_text(segment_id, window))
    }

    pub fn word_stats(&mut self) -> Result<MappingStats> {
        self.sync_words()?;
        Ok(self.words.stats())
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn run(&mut self, cmd: Box<dyn Command>) -> Result<()> {
        let description = cmd.description().to_string();
        match self.history.execute(cmd, &self.state, &self.config) {
            Ok(next) => {
                tracing::debug!(edit = %description, version = self.version + 1, "edit applied");
                self.commit(next);
                Ok(())
            }
            Err(CoreError::InvariantViolation(msg)) => {
                tracing::error!(edit = %description, "invariant violated: {}", msg);
                debug_assert!(false, "{} broke an invariant: {}", description, msg);
                Err(CoreError::InvariantViolation(msg))
            }
            Err(e) => {
                tracing::warn!(edit = %description, error = %e, "edit rejected");
                Err(e)
            }
        }
    }

    fn commit(&mut self, state: EditState) {
        self.ranges.set_segments(&state.segments);
        self.ranges.replace_deletions(state.deleted.clone());
        self.state = state;
        self.version += 1;
    }

    fn sync_words(&mut self) -> Result<()> {
        if self.words_version == Some(self.version) {
            return Ok(());
        }
        let deleted = &self.state.deleted;
        let live = self
            .state
            .segments
            .iter()
            .filter(|s| s.enabled && !deleted.contains(&s.id));
        self.words.sync(live, &self.sources)?;
        self.words_version = Some(self.version);
        Ok(())
    }

    fn require_segment(&self, segment_id: Uuid) -> Result<&TimelineSegment> {
        self.segment(segment_id)
            .ok_or(CoreError::UnknownSegment(segment_id))
    }

    fn require_source(&self, source_id: Uuid) -> Result<&SourceSegment> {
        self.sources
            .get(&source_id)
            .ok_or(CoreError::UnknownSource(source_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
