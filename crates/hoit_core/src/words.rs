use crate::error::{CoreError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A source word projected onto the timeline through one segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordMapping {
    pub word: SourceWord,
    pub segment_id: Uuid,
    pub timeline_start: TimeUs,
    pub timeline_end: TimeUs,
    pub source_start: TimeUs,
    pub source_end: TimeUs,
}

impl WordMapping {
    pub fn timeline_range(&self) -> TimeRange {
        TimeRange::new(self.timeline_start, self.timeline_end)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MappingStats {
    pub total_segments: usize,
    pub total_words: usize,
    pub average_words_per_segment: f64,
}

/// Project the words of `source` that start inside the segment's trim
/// window onto the timeline.
///
/// Timing is scaled by `segment.duration() / source.word_span()`, or 1 when
/// the source has no measurable span. Word ends never pass the segment end.
pub fn map_words(segment: &TimelineSegment, source: &SourceSegment) -> Vec<WordMapping> {
    let Some(origin) = source.first_word_start() else {
        return Vec::new();
    };
    let scale = scale_for(segment, source);
    let window = TimeRange::new(segment.in_point, segment.out_point);
    let segment_end = segment.end_time();

    source
        .words
        .iter()
        .filter(|word| window.contains(word.start - origin))
        .map(|word| {
            let rel_start = word.start - origin;
            let rel_end = (word.end - origin).min(segment.out_point);
            let timeline_start = segment.start_time + (rel_start - segment.in_point).scaled(scale);
            let timeline_end = (segment.start_time + (rel_end - segment.in_point).scaled(scale))
                .min(segment_end)
                .max(timeline_start);
            WordMapping {
                word: word.clone(),
                segment_id: segment.id,
                timeline_start,
                timeline_end,
                source_start: word.start,
                source_end: word.end,
            }
        })
        .collect()
}

fn scale_for(segment: &TimelineSegment, source: &SourceSegment) -> f64 {
    let span = source.word_span();
    if span > TimeUs::ZERO {
        segment.duration().0 as f64 / span.0 as f64
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// WordMapper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Entry {
    segment: TimelineSegment,
    words: Vec<WordMapping>,
}

/// Per-segment cache of word mappings.
#[derive(Debug, Clone, Default)]
pub struct WordMapper {
    entries: BTreeMap<Uuid, Entry>,
}

impl WordMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute and cache the mapping for one segment.
    pub fn create_mapping(
        &mut self,
        segment: &TimelineSegment,
        source: &SourceSegment,
    ) -> &[WordMapping] {
        let words = map_words(segment, source);
        let entry = self.entries.entry(segment.id).or_insert_with(|| Entry {
            segment: segment.clone(),
            words: Vec::new(),
        });
        entry.segment = segment.clone();
        entry.words = words;
        &entry.words
    }

    pub fn mapping(&self, segment_id: Uuid) -> Option<&[WordMapping]> {
        self.entries.get(&segment_id).map(|e| e.words.as_slice())
    }

    pub fn mappings(&self) -> impl Iterator<Item = (Uuid, &[WordMapping])> {
        self.entries.iter().map(|(id, e)| (*id, e.words.as_slice()))
    }

    pub fn remove_mapping(&mut self, segment_id: Uuid) -> bool {
        self.entries.remove(&segment_id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bring the cache in line with `segments`: new or changed segments are
    /// remapped, segments no longer present are dropped. Returns how many
    /// mappings were rebuilt.
    pub fn sync<'a>(
        &mut self,
        segments: impl IntoIterator<Item = &'a TimelineSegment>,
        sources: &BTreeMap<Uuid, SourceSegment>,
    ) -> Result<usize> {
        let mut live = BTreeMap::new();
        let mut rebuilt = 0;

        for segment in segments {
            let entry = match self.entries.remove(&segment.id) {
                Some(entry) if same_placement(&entry.segment, segment) => entry,
                _ => {
                    let source = sources
                        .get(&segment.source_segment_id)
                        .ok_or(CoreError::UnknownSource(segment.source_segment_id))?;
                    rebuilt += 1;
                    Entry {
                        segment: segment.clone(),
                        words: map_words(segment, source),
                    }
                }
            };
            live.insert(segment.id, entry);
        }

        self.entries = live;
        if rebuilt > 0 {
            tracing::debug!(rebuilt, total = self.entries.len(), "word mappings synced");
        }
        Ok(rebuilt)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every word playing at `t`, ordered by timeline start.
    pub fn active_words_at(&self, t: TimeUs) -> Vec<&WordMapping> {
        let mut active: Vec<&WordMapping> = self
            .entries
            .values()
            .flat_map(|e| e.words.iter())
            .filter(|w| w.timeline_range().contains(t))
            .collect();
        active.sort_by_key(|w| w.timeline_start);
        active
    }

    /// Timeline span of a word. When the word shows up in several segments
    /// the earliest placement wins.
    pub fn word_timeline_range(&self, word_id: Uuid) -> Option<TimeRange> {
        self.entries
            .values()
            .flat_map(|e| e.words.iter())
            .filter(|w| w.word.id == word_id)
            .min_by_key(|w| w.timeline_start)
            .map(WordMapping::timeline_range)
    }

    /// Source-local time under a timeline position of a mapped segment.
    pub fn timeline_to_source_time(&self, segment_id: Uuid, t: TimeUs) -> Option<TimeUs> {
        let segment = &self.entries.get(&segment_id)?.segment;
        if !segment.contains(t) {
            return None;
        }
        Some(segment.in_point + (t - segment.start_time))
    }

    pub fn source_to_timeline_time(&self, segment_id: Uuid, source_t: TimeUs) -> Option<TimeUs> {
        let segment = &self.entries.get(&segment_id)?.segment;
        if !TimeRange::new(segment.in_point, segment.out_point).contains(source_t) {
            return None;
        }
        Some(segment.start_time + (source_t - segment.in_point))
    }

    /// Words of a segment joined by spaces, optionally limited to those
    /// touching a timeline window.
    pub fn display_text(&self, segment_id: Uuid, window: Option<TimeRange>) -> String {
        let Some(entry) = self.entries.get(&segment_id) else {
            return String::new();
        };
        entry
            .words
            .iter()
            .filter(|w| window.map_or(true, |r| w.timeline_range().overlaps(&r)))
            .map(|w| w.word.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn stats(&self) -> MappingStats {
        let total_segments = self.entries.len();
        let total_words: usize = self.entries.values().map(|e| e.words.len()).sum();
        let average_words_per_segment = if total_segments > 0 {
            total_words as f64 / total_segments as f64
        } else {
            0.0
        };
        MappingStats {
            total_segments,
            total_words,
            average_words_per_segment,
        }
    }
}

fn same_placement(a: &TimelineSegment, b: &TimelineSegment) -> bool {
    a.source_segment_id == b.source_segment_id
        && a.in_point == b.in_point
        && a.out_point == b.out_point
        && a.start_time == b.start_time
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
