//! Deletion-aware mapping between original media time and adjusted
//! (playback) time.

use crate::error::{CoreError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::BTreeSet;
use uuid::Uuid;

/// A stretch of adjusted time that plays a contiguous stretch of the
/// original media.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayableRange {
    pub adjusted_start: TimeUs,
    pub adjusted_end: TimeUs,
    pub original_start: TimeUs,
    pub original_end: TimeUs,
}

impl PlayableRange {
    pub fn duration(&self) -> TimeUs {
        self.adjusted_end - self.adjusted_start
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SkipDecision {
    Play,
    /// Jump to this adjusted time.
    Skip { to: TimeUs },
    EndOfMedia,
}

/// Original placement of a segment as seen by the mapper.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentSpan {
    pub id: Uuid,
    pub span: TimeRange,
    pub enabled: bool,
}

/// Serializable dump of the mapper's state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RangeSnapshot {
    pub media_duration: TimeUs,
    pub spans: Vec<SegmentSpan>,
    pub deleted: Vec<Uuid>,
    pub ranges: Vec<PlayableRange>,
    pub adjusted_duration: TimeUs,
}

/// Tracks deleted segments and answers time conversions.
///
/// Ranges are derived lazily and memoized until the deletions or the
/// segment list change.
#[derive(Debug, Clone)]
pub struct RangeMapper {
    spans: Vec<SegmentSpan>,
    deleted: BTreeSet<Uuid>,
    media_duration: TimeUs,
    version: u64,
    ranges: OnceCell<Vec<PlayableRange>>,
}

impl RangeMapper {
    pub fn new(segments: &[TimelineSegment], media_duration: TimeUs) -> Self {
        Self {
            spans: spans_of(segments),
            deleted: BTreeSet::new(),
            media_duration,
            version: 0,
            ranges: OnceCell::new(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn media_duration(&self) -> TimeUs {
        self.media_duration
    }

    /// End of the original axis: the media duration, or the furthest
    /// segment end when segments run past it.
    pub fn media_end(&self) -> TimeUs {
        self.spans
            .iter()
            .map(|s| s.span.end)
            .fold(self.media_duration, TimeUs::max)
    }

    pub fn spans(&self) -> &[SegmentSpan] {
        &self.spans
    }

    // -----------------------------------------------------------------------
    // Deletions
    // -----------------------------------------------------------------------

    /// Mark a segment deleted. Returns `false` when it already was.
    pub fn delete_segment(&mut self, id: Uuid) -> Result<bool> {
        self.ensure_known(id)?;
        let changed = self.deleted.insert(id);
        if changed {
            tracing::debug!(segment = %id, "segment deleted");
            self.invalidate();
        }
        Ok(changed)
    }

    /// Undo a deletion. Returns `false` when the segment was not deleted.
    pub fn restore_segment(&mut self, id: Uuid) -> Result<bool> {
        self.ensure_known(id)?;
        let changed = self.deleted.remove(&id);
        if changed {
            tracing::debug!(segment = %id, "segment restored");
            self.invalidate();
        }
        Ok(changed)
    }

    pub fn is_deleted(&self, id: Uuid) -> bool {
        self.deleted.contains(&id)
    }

    pub fn deleted_ids(&self) -> &BTreeSet<Uuid> {
        &self.deleted
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    /// Restore everything. Returns how many deletions were dropped.
    pub fn clear_deletions(&mut self) -> usize {
        let count = self.deleted.len();
        if count > 0 {
            self.deleted.clear();
            self.invalidate();
        }
        count
    }

    /// Swap in a whole deletion set. Ids without a segment are ignored.
    pub fn replace_deletions(&mut self, deleted: BTreeSet<Uuid>) {
        let known: BTreeSet<Uuid> = deleted
            .into_iter()
            .filter(|id| self.spans.iter().any(|s| s.id == *id))
            .collect();
        if known != self.deleted {
            self.deleted = known;
            self.invalidate();
        }
    }

    /// Take a new segment list. Deletions of segments that no longer exist
    /// are dropped.
    pub fn set_segments(&mut self, segments: &[TimelineSegment]) {
        self.spans = spans_of(segments);
        let spans = &self.spans;
        self.deleted.retain(|id| spans.iter().any(|s| s.id == *id));
        self.invalidate();
    }

    pub fn set_media_duration(&mut self, media_duration: TimeUs) {
        if media_duration != self.media_duration {
            self.media_duration = media_duration;
            self.invalidate();
        }
    }

    // -----------------------------------------------------------------------
    // Ranges
    // -----------------------------------------------------------------------

    pub fn playable_ranges(&self) -> &[PlayableRange] {
        self.ranges.get_or_init(|| self.compute_ranges())
    }

    pub fn adjusted_duration(&self) -> TimeUs {
        self.playable_ranges()
            .last()
            .map_or(TimeUs::ZERO, |r| r.adjusted_end)
    }

    /// Convert a playback position to media time.
    ///
    /// Each range owns `[adjusted_start, adjusted_end)`; the last one also
    /// owns its end. Positions before zero clamp to the first range, past
    /// the end to the last one. With no ranges the time is returned as is.
    pub fn map_to_original_time(&self, adjusted: TimeUs) -> TimeUs {
        let ranges = self.playable_ranges();
        let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
            return adjusted;
        };
        if adjusted < first.adjusted_start {
            return first.original_start;
        }
        if adjusted >= last.adjusted_end {
            return last.original_end;
        }

        let idx = ranges.partition_point(|r| r.adjusted_end <= adjusted);
        let range = &ranges[idx];
        range.original_start + (adjusted - range.adjusted_start)
    }

    /// Convert media time to a playback position; `None` when that moment
    /// of the media has been cut.
    pub fn map_to_adjusted_time(&self, original: TimeUs) -> Option<TimeUs> {
        let ranges = self.playable_ranges();
        if ranges.is_empty() {
            return (!self.has_skipped_content()).then_some(original);
        }

        let idx = ranges.partition_point(|r| r.original_end <= original);
        if let Some(range) = ranges.get(idx) {
            if range.original_start <= original {
                return Some(range.adjusted_start + (original - range.original_start));
            }
            return None;
        }

        ranges
            .last()
            .filter(|last| last.original_end == original)
            .map(|last| last.adjusted_end)
    }

    /// Decide what the player should do at a media-clock position.
    pub fn should_skip_original(&self, original: TimeUs) -> SkipDecision {
        let ranges = self.playable_ranges();
        if ranges.is_empty() {
            return if self.has_skipped_content() {
                SkipDecision::EndOfMedia
            } else {
                SkipDecision::Play
            };
        }

        let idx = ranges.partition_point(|r| r.original_end <= original);
        match ranges.get(idx) {
            Some(range) if range.original_start <= original => SkipDecision::Play,
            Some(range) => SkipDecision::Skip {
                to: range.adjusted_start,
            },
            None => SkipDecision::EndOfMedia,
        }
    }

    /// Same decision, driven by a playback position.
    pub fn should_skip_segment(&self, adjusted: TimeUs) -> SkipDecision {
        self.should_skip_original(self.map_to_original_time(adjusted))
    }

    /// The kept segment playing at a playback position, if any.
    pub fn segment_at_adjusted(&self, adjusted: TimeUs) -> Option<Uuid> {
        if adjusted < TimeUs::ZERO || adjusted >= self.adjusted_duration() {
            return None;
        }
        let original = self.map_to_original_time(adjusted);
        self.spans
            .iter()
            .find(|s| !self.is_skipped(s) && s.span.contains(original))
            .map(|s| s.id)
    }

    pub fn snapshot(&self) -> RangeSnapshot {
        RangeSnapshot {
            media_duration: self.media_duration,
            spans: self.spans.clone(),
            deleted: self.deleted.iter().copied().collect(),
            ranges: self.playable_ranges().to_vec(),
            adjusted_duration: self.adjusted_duration(),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_known(&self, id: Uuid) -> Result<()> {
        if self.spans.iter().any(|s| s.id == id) {
            Ok(())
        } else {
            Err(CoreError::UnknownSegment(id))
        }
    }

    fn invalidate(&mut self) {
        self.version += 1;
        self.ranges = OnceCell::new();
    }

    fn is_skipped(&self, span: &SegmentSpan) -> bool {
        !span.enabled || self.deleted.contains(&span.id)
    }

    fn has_skipped_content(&self) -> bool {
        self.spans
            .iter()
            .any(|s| self.is_skipped(s) && s.span.duration() > TimeUs::ZERO)
    }

    fn compute_ranges(&self) -> Vec<PlayableRange> {
        let mut ranges = Vec::new();
        let mut original_cursor = TimeUs::ZERO;
        let mut adjusted_cursor = TimeUs::ZERO;

        let mut push = |from: TimeUs, to: TimeUs, adjusted_cursor: &mut TimeUs| {
            let length = to - from;
            ranges.push(PlayableRange {
                adjusted_start: *adjusted_cursor,
                adjusted_end: *adjusted_cursor + length,
                original_start: from,
                original_end: to,
            });
            *adjusted_cursor += length;
        };

        for span in self.spans.iter().filter(|s| self.is_skipped(s)) {
            if span.span.duration() <= TimeUs::ZERO {
                continue;
            }
            if span.span.start > original_cursor {
                push(original_cursor, span.span.start, &mut adjusted_cursor);
            }
            original_cursor = original_cursor.max(span.span.end);
        }

        let end = self.media_end();
        if end > original_cursor {
            push(original_cursor, end, &mut adjusted_cursor);
        }

        ranges
    }
}

fn spans_of(segments: &[TimelineSegment]) -> Vec<SegmentSpan> {
    let mut spans: Vec<SegmentSpan> = segments
        .iter()
        .map(|s| SegmentSpan {
            id: s.id,
            span: s.span(),
            enabled: s.enabled,
        })
        .collect();
    spans.sort_by_key(|s| s.span.start);
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: i64 = 1_000_000;

    fn secs(s: i64) -> TimeUs {
        TimeUs(s * SEC)
    }

    fn make_segment(start_s: i64, end_s: i64) -> TimelineSegment {
        TimelineSegment::new(
            Uuid::new_v4(),
            Lane::new(TrackKind::Subtitle, 0),
            secs(start_s),
            TimeUs::ZERO,
            secs(end_s - start_s),
        )
    }

    /// Segments at [0,5), [5,10), [10,15) over 15 s of media.
    fn make_mapper() -> (RangeMapper, Vec<TimelineSegment>) {
        let segments = vec![make_segment(0, 5), make_segment(5, 10), make_segment(10, 15)];
        (RangeMapper::new(&segments, secs(15)), segments)
    }

    fn assert_covers_media(mapper: &RangeMapper) {
        let ranges = mapper.playable_ranges();
        let mut expected_adjusted = TimeUs::ZERO;
        for r in ranges {
            assert_eq!(r.adjusted_start, expected_adjusted);
            assert_eq!(r.duration(), r.original_end - r.original_start);
            assert!(r.duration() > TimeUs::ZERO);
            expected_adjusted = r.adjusted_end;
        }
        for pair in ranges.windows(2) {
            assert!(pair[0].original_end < pair[1].original_start);
        }
    }

    // -----------------------------------------------------------------------
    // Ranges
    // -----------------------------------------------------------------------

    #[test]
    fn no_deletions_single_range() {
        let (mapper, _) = make_mapper();
        assert_eq!(
            mapper.playable_ranges(),
            &[PlayableRange {
                adjusted_start: TimeUs::ZERO,
                adjusted_end: secs(15),
                original_start: TimeUs::ZERO,
                original_end: secs(15),
            }]
        );
        assert_eq!(mapper.adjusted_duration(), secs(15));
    }

    #[test]
    fn delete_middle_scenario() {
        let (mut mapper, segments) = make_mapper();
        assert!(mapper.delete_segment(segments[1].id).unwrap());

        assert_eq!(
            mapper.playable_ranges(),
            &[
                PlayableRange {
                    adjusted_start: secs(0),
                    adjusted_end: secs(5),
                    original_start: secs(0),
                    original_end: secs(5),
                },
                PlayableRange {
                    adjusted_start: secs(5),
                    adjusted_end: secs(10),
                    original_start: secs(10),
                    original_end: secs(15),
                },
            ]
        );
        assert_eq!(mapper.map_to_original_time(secs(6)), secs(11));
        assert_eq!(mapper.map_to_adjusted_time(secs(7)), None);
        assert_eq!(mapper.map_to_adjusted_time(secs(12)), Some(secs(7)));
        assert_eq!(mapper.adjusted_duration(), secs(10));
        assert_covers_media(&mapper);
    }

    #[test]
    fn boundaries_are_half_open_except_last() {
        let (mut mapper, segments) = make_mapper();
        mapper.delete_segment(segments[1].id).unwrap();

        // The first range does not own adjusted 5; the second does.
        assert_eq!(mapper.map_to_original_time(secs(5)), secs(10));
        assert_eq!(mapper.map_to_adjusted_time(secs(5)), None);
        assert_eq!(mapper.map_to_adjusted_time(secs(10)), Some(secs(5)));
        // The last range owns its end.
        assert_eq!(mapper.map_to_original_time(secs(10)), secs(15));
        assert_eq!(mapper.map_to_adjusted_time(secs(15)), Some(secs(10)));
    }

    #[test]
    fn out_of_bounds_clamp() {
        let (mut mapper, segments) = make_mapper();
        mapper.delete_segment(segments[0].id).unwrap();

        assert_eq!(mapper.map_to_original_time(TimeUs(-SEC)), secs(5));
        assert_eq!(mapper.map_to_original_time(secs(100)), secs(15));
        assert_eq!(mapper.map_to_adjusted_time(secs(16)), None);
        assert_eq!(mapper.map_to_adjusted_time(TimeUs(-SEC)), None);
    }

    #[test]
    fn no_ranges_is_identity() {
        let mapper = RangeMapper::new(&[], TimeUs::ZERO);
        assert!(mapper.playable_ranges().is_empty());
        assert_eq!(mapper.map_to_original_time(secs(3)), secs(3));
        assert_eq!(mapper.map_to_adjusted_time(secs(3)), Some(secs(3)));
        assert_eq!(mapper.should_skip_original(secs(3)), SkipDecision::Play);
    }

    #[test]
    fn everything_deleted() {
        let (mut mapper, segments) = make_mapper();
        for s in &segments {
            mapper.delete_segment(s.id).unwrap();
        }
        assert!(mapper.playable_ranges().is_empty());
        assert_eq!(mapper.adjusted_duration(), TimeUs::ZERO);
        assert_eq!(mapper.should_skip_original(secs(1)), SkipDecision::EndOfMedia);
        assert_eq!(mapper.map_to_adjusted_time(secs(7)), None);
        assert_eq!(mapper.map_to_adjusted_time(TimeUs::ZERO), None);
        assert_eq!(mapper.segment_at_adjusted(TimeUs::ZERO), None);
    }

    #[test]
    fn media_tail_beyond_segments_stays_playable() {
        let segments = vec![make_segment(0, 5), make_segment(5, 10)];
        let mut mapper = RangeMapper::new(&segments, secs(12));
        mapper.delete_segment(segments[1].id).unwrap();

        let ranges = mapper.playable_ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].original_start, secs(10));
        assert_eq!(ranges[1].original_end, secs(12));
        assert_eq!(mapper.adjusted_duration(), secs(7));
    }

    #[test]
    fn disabled_segments_are_skipped() {
        let mut segments = vec![make_segment(0, 5), make_segment(5, 10), make_segment(10, 15)];
        segments[0].enabled = false;
        let mapper = RangeMapper::new(&segments, secs(15));

        assert_eq!(mapper.playable_ranges().len(), 1);
        assert_eq!(mapper.playable_ranges()[0].original_start, secs(5));
        assert_eq!(mapper.adjusted_duration(), secs(10));
    }

    #[test]
    fn overlapping_deleted_spans_compose() {
        let mut a = make_segment(2, 6);
        let b = make_segment(4, 8);
        a.track_index = 1;
        let segments = vec![a.clone(), b.clone()];
        let mut mapper = RangeMapper::new(&segments, secs(10));
        mapper.delete_segment(a.id).unwrap();
        mapper.delete_segment(b.id).unwrap();

        let ranges = mapper.playable_ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].original_end, secs(2));
        assert_eq!(ranges[1].original_start, secs(8));
        assert_eq!(mapper.adjusted_duration(), secs(4));
        assert_covers_media(&mapper);
    }

    #[test]
    fn zero_length_deleted_segment_emits_nothing() {
        let mut empty = make_segment(5, 10);
        empty.out_point = empty.in_point;
        let segments = vec![make_segment(0, 5), empty.clone(), make_segment(5, 10)];
        let mut mapper = RangeMapper::new(&segments, secs(10));
        mapper.delete_segment(empty.id).unwrap();

        assert_eq!(mapper.playable_ranges().len(), 1);
        assert_eq!(mapper.adjusted_duration(), secs(10));
    }

    #[test]
    fn coverage_accounts_for_all_media() {
        let segments: Vec<TimelineSegment> = (0..10).map(|i| make_segment(i * 2, i * 2 + 2)).collect();
        let mut mapper = RangeMapper::new(&segments, secs(20));
        for i in [0, 3, 4, 9] {
            mapper.delete_segment(segments[i].id).unwrap();
        }

        let deleted_total = secs(2) * 4;
        assert_eq!(mapper.adjusted_duration() + deleted_total, secs(20));
        assert_covers_media(&mapper);
    }

    #[test]
    fn gaps_between_segments_stay_playable() {
        // 1 s segments with 100 ms gaps, as the initial layout produces.
        let ms = TimeUs::from_millis;
        let lane = Lane::new(TrackKind::Subtitle, 0);
        let segments: Vec<TimelineSegment> = [0, 1_100, 2_200]
            .into_iter()
            .map(|start| TimelineSegment::new(Uuid::new_v4(), lane, ms(start), TimeUs::ZERO, ms(1_000)))
            .collect();
        let mut mapper = RangeMapper::new(&segments, ms(3_200));

        // Nothing deleted: the whole media plays, gaps included.
        let kept_segments: TimeUs = segments.iter().fold(TimeUs::ZERO, |acc, s| acc + s.duration());
        assert_eq!(kept_segments, ms(3_000));
        assert_eq!(mapper.adjusted_duration(), ms(3_200));

        mapper.delete_segment(segments[1].id).unwrap();
        let ranges = mapper.playable_ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!((ranges[0].original_start, ranges[0].original_end), (ms(0), ms(1_100)));
        assert_eq!((ranges[1].original_start, ranges[1].original_end), (ms(2_100), ms(3_200)));

        // Union of playable spans is the media minus the deleted span.
        let played = ranges
            .iter()
            .fold(TimeUs::ZERO, |acc, r| acc + (r.original_end - r.original_start));
        assert_eq!(played, mapper.media_end() - segments[1].duration());
        // Adjusted time is the kept segments plus the uncovered gaps.
        assert_eq!(mapper.adjusted_duration(), ms(2_000) + ms(200));
        assert_covers_media(&mapper);
    }

    #[test]
    fn inverse_law_holds() {
        let segments: Vec<TimelineSegment> = (0..6).map(|i| make_segment(i * 3, i * 3 + 3)).collect();
        let mut mapper = RangeMapper::new(&segments, secs(18));
        mapper.delete_segment(segments[1].id).unwrap();
        mapper.delete_segment(segments[4].id).unwrap();

        let step = TimeUs(250_000);
        let mut a = TimeUs::ZERO;
        while a <= mapper.adjusted_duration() {
            let original = mapper.map_to_original_time(a);
            assert_eq!(mapper.map_to_adjusted_time(original), Some(a));
            a += step;
        }

        let mut t = TimeUs::ZERO;
        while t <= secs(18) {
            if let Some(adjusted) = mapper.map_to_adjusted_time(t) {
                assert_eq!(mapper.map_to_original_time(adjusted), t);
            }
            t += step;
        }
    }

    // -----------------------------------------------------------------------
    // Deletions
    // -----------------------------------------------------------------------

    #[test]
    fn deletion_is_idempotent() {
        let (mut mapper, segments) = make_mapper();
        assert!(mapper.delete_segment(segments[1].id).unwrap());
        let once = mapper.playable_ranges().to_vec();
        assert!(!mapper.delete_segment(segments[1].id).unwrap());
        assert_eq!(mapper.playable_ranges(), &once[..]);
        assert_eq!(mapper.deleted_count(), 1);

        assert!(mapper.restore_segment(segments[1].id).unwrap());
        assert!(!mapper.restore_segment(segments[1].id).unwrap());
        assert_eq!(mapper.playable_ranges().len(), 1);
    }

    #[test]
    fn unknown_ids_rejected() {
        let (mut mapper, _) = make_mapper();
        assert!(matches!(
            mapper.delete_segment(Uuid::new_v4()),
            Err(CoreError::UnknownSegment(_))
        ));
        assert!(matches!(
            mapper.restore_segment(Uuid::new_v4()),
            Err(CoreError::UnknownSegment(_))
        ));
    }

    #[test]
    fn version_bumps_only_on_change() {
        let (mut mapper, segments) = make_mapper();
        let v0 = mapper.version();
        mapper.delete_segment(segments[0].id).unwrap();
        let v1 = mapper.version();
        assert!(v1 > v0);
        mapper.delete_segment(segments[0].id).unwrap();
        assert_eq!(mapper.version(), v1);
    }

    #[test]
    fn clear_and_replace_deletions() {
        let (mut mapper, segments) = make_mapper();
        mapper.delete_segment(segments[0].id).unwrap();
        mapper.delete_segment(segments[2].id).unwrap();
        assert!(mapper.is_deleted(segments[0].id));
        assert_eq!(mapper.clear_deletions(), 2);
        assert_eq!(mapper.deleted_count(), 0);

        let set: BTreeSet<Uuid> = [segments[1].id, Uuid::new_v4()].into_iter().collect();
        mapper.replace_deletions(set);
        assert_eq!(mapper.deleted_ids().len(), 1);
        assert!(mapper.is_deleted(segments[1].id));
    }

    #[test]
    fn set_segments_drops_stale_deletions() {
        let (mut mapper, segments) = make_mapper();
        mapper.delete_segment(segments[1].id).unwrap();
        mapper.delete_segment(segments[2].id).unwrap();

        mapper.set_segments(&segments[..2]);
        assert_eq!(mapper.deleted_count(), 1);
        assert!(mapper.is_deleted(segments[1].id));
        // Media after the last segment is still covered.
        assert_eq!(mapper.adjusted_duration(), secs(10));
    }

    // -----------------------------------------------------------------------
    // Skip decisions
    // -----------------------------------------------------------------------

    #[test]
    fn skip_over_deleted_span() {
        let (mut mapper, segments) = make_mapper();
        mapper.delete_segment(segments[1].id).unwrap();

        assert_eq!(mapper.should_skip_original(secs(3)), SkipDecision::Play);
        assert_eq!(
            mapper.should_skip_original(secs(5)),
            SkipDecision::Skip { to: secs(5) }
        );
        assert_eq!(
            mapper.should_skip_original(secs(7)),
            SkipDecision::Skip { to: secs(5) }
        );
        assert_eq!(mapper.should_skip_original(secs(10)), SkipDecision::Play);
        assert_eq!(mapper.should_skip_original(secs(15)), SkipDecision::EndOfMedia);
    }

    #[test]
    fn skip_at_deleted_tail_ends_media() {
        let (mut mapper, segments) = make_mapper();
        mapper.delete_segment(segments[2].id).unwrap();

        assert_eq!(mapper.should_skip_original(secs(12)), SkipDecision::EndOfMedia);
        assert_eq!(mapper.should_skip_segment(secs(4)), SkipDecision::Play);
        assert_eq!(mapper.should_skip_segment(secs(10)), SkipDecision::EndOfMedia);
    }

    #[test]
    fn skip_by_adjusted_time_plays_inside_ranges() {
        let (mut mapper, segments) = make_mapper();
        mapper.delete_segment(segments[1].id).unwrap();
        assert_eq!(mapper.should_skip_segment(secs(0)), SkipDecision::Play);
        assert_eq!(mapper.should_skip_segment(secs(5)), SkipDecision::Play);
        assert_eq!(mapper.should_skip_segment(secs(9)), SkipDecision::Play);
    }

    #[test]
    fn segment_at_adjusted_ignores_deleted() {
        let (mut mapper, segments) = make_mapper();
        mapper.delete_segment(segments[1].id).unwrap();
        assert_eq!(mapper.segment_at_adjusted(secs(1)), Some(segments[0].id));
        assert_eq!(mapper.segment_at_adjusted(secs(6)), Some(segments[2].id));
        assert_eq!(mapper.segment_at_adjusted(secs(10)), None);
    }

    #[test]
    fn snapshot_serializes() {
        let (mut mapper, segments) = make_mapper();
        mapper.delete_segment(segments[1].id).unwrap();
        let snapshot = mapper.snapshot();
        assert_eq!(snapshot.deleted, vec![segments[1].id]);
        assert_eq!(snapshot.ranges.len(), 2);
        assert_eq!(snapshot.adjusted_duration, secs(10));

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: RangeSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
