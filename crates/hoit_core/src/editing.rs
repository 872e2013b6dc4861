//! Structural edits over a segment sequence.
//!
//! Every operation borrows the current sequence and returns a new one; the
//! input is never touched, so a rejected edit leaves the caller's sequence
//! exactly as it was.

use crate::config::EditorConfig;
use crate::error::{CoreError, Result};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Outcome of projecting a timeline instant into a segment's source axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum MappingResult {
    Valid {
        source_segment_id: Uuid,
        source_time: TimeUs,
    },
    OutOfRange,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build one subtitle-lane segment per source segment.
///
/// Segments are chained left to right with `config.segment_gap` between
/// them. A source with words is anchored at its first word when that lies
/// past the chain cursor, so freshly loaded segments line up with the media.
pub fn initialize_from_source(
    sources: &[SourceSegment],
    config: &EditorConfig,
) -> Vec<TimelineSegment> {
    let lane = Lane::new(TrackKind::Subtitle, 0);
    let mut cursor = TimeUs::ZERO;
    let mut segments = Vec::with_capacity(sources.len());

    for source in sources {
        let start = source.first_word_start().map_or(cursor, |first| first.max(cursor));
        let segment =
            TimelineSegment::new(source.id, lane, start, TimeUs::ZERO, source_length(source, config));
        cursor = segment.end_time() + config.segment_gap;
        segments.push(segment);
    }

    tracing::debug!(count = segments.len(), "initialized segments from source");
    segments
}

/// Length of a source segment's local axis: its word span, or the default
/// length when it has no words, never below `min_duration`.
pub fn source_length(source: &SourceSegment, config: &EditorConfig) -> TimeUs {
    let length = if source.words.is_empty() {
        config.default_segment_duration
    } else {
        source.word_span()
    };
    length.max(config.min_duration)
}

// ---------------------------------------------------------------------------
// Split / trim
// ---------------------------------------------------------------------------

/// Split a segment at a timeline position strictly inside it.
///
/// Both halves get fresh ids and keep the original `source_segment_id`;
/// their trim windows partition the original one.
pub fn split(
    segment: &TimelineSegment,
    at: TimeUs,
    config: &EditorConfig,
) -> Result<(TimelineSegment, TimelineSegment)> {
    ensure_unlocked(segment)?;
    if at <= segment.start_time || at >= segment.end_time() {
        return Err(CoreError::InvalidRange(format!(
            "split at {} is not inside ({}, {})",
            at,
            segment.start_time,
            segment.end_time()
        )));
    }

    let split_point = segment.in_point + (at - segment.start_time);
    let left = TimelineSegment {
        id: Uuid::new_v4(),
        out_point: split_point,
        ..segment.clone()
    };
    let right = TimelineSegment {
        id: Uuid::new_v4(),
        in_point: split_point,
        start_time: at,
        ..segment.clone()
    };

    if left.duration() < config.min_duration || right.duration() < config.min_duration {
        return Err(CoreError::InvalidRange(format!(
            "split at {} leaves a part shorter than {}",
            at, config.min_duration
        )));
    }

    Ok((left, right))
}

/// Split the segment `id` in place; the right half follows the left one in
/// the returned sequence.
pub fn split_in_sequence(
    segments: &[TimelineSegment],
    id: Uuid,
    at: TimeUs,
    config: &EditorConfig,
) -> Result<Vec<TimelineSegment>> {
    let idx = find_index(segments, id)?;
    let (left, right) = split(&segments[idx], at, config)?;

    let mut out = segments.to_vec();
    out[idx] = left;
    out.insert(idx + 1, right);
    Ok(out)
}

/// Adjust a segment's trim window. `start_time` stays put, so the segment's
/// end moves with the out-point.
///
/// `new_in` is clamped to `>= 0`; the out-point is kept at least
/// `min_duration` after the in-point. When only the in-point is given it is
/// pulled back so the existing out-point still holds.
pub fn trim(
    segment: &TimelineSegment,
    new_in: Option<TimeUs>,
    new_out: Option<TimeUs>,
    config: &EditorConfig,
) -> TimelineSegment {
    let min = config.min_duration;
    let (in_point, out_point) = match (new_in, new_out) {
        (Some(i), Some(o)) => {
            let i = i.max(TimeUs::ZERO);
            (i, o.max(i.saturating_add(min)))
        }
        (Some(i), None) => {
            let ceiling = (segment.out_point - min).max(TimeUs::ZERO);
            (i.max(TimeUs::ZERO).min(ceiling), segment.out_point)
        }
        (None, Some(o)) => (segment.in_point, o.max(segment.in_point + min)),
        (None, None) => (segment.in_point, segment.out_point),
    };

    TimelineSegment {
        in_point,
        out_point,
        ..segment.clone()
    }
}

/// Trim the segment `id`, rejecting a result that would run into a lane
/// neighbour.
pub fn trim_in_sequence(
    segments: &[TimelineSegment],
    id: Uuid,
    new_in: Option<TimeUs>,
    new_out: Option<TimeUs>,
    config: &EditorConfig,
) -> Result<Vec<TimelineSegment>> {
    let idx = find_index(segments, id)?;
    ensure_unlocked(&segments[idx])?;
    let trimmed = trim(&segments[idx], new_in, new_out, config);
    ensure_representable(&trimmed)?;
    if trimmed.duration() < config.min_duration {
        return Err(CoreError::InvalidRange(format!(
            "trim of {} leaves less than {}",
            id, config.min_duration
        )));
    }

    if let Some(other) = first_collision(segments, &trimmed, |s| s.id == id) {
        return Err(CoreError::InvalidRange(format!(
            "trim of {} would overlap {}",
            id, other.id
        )));
    }

    let mut out = segments.to_vec();
    out[idx] = trimmed;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Ripple / insert / overwrite
// ---------------------------------------------------------------------------

/// Move a segment to `new_start` and shift every later segment in its lane
/// by the same delta.
pub fn ripple_move(
    segments: &[TimelineSegment],
    id: Uuid,
    new_start: TimeUs,
) -> Result<Vec<TimelineSegment>> {
    let idx = find_index(segments, id)?;
    let target = &segments[idx];
    if new_start < TimeUs::ZERO {
        return Err(CoreError::InvalidRange(format!(
            "ripple move of {} to negative time {}",
            id, new_start
        )));
    }
    let delta = new_start - target.start_time;
    if delta == TimeUs::ZERO {
        return Ok(segments.to_vec());
    }

    let lane = target.lane();
    let origin = target.start_time;
    let follows = |i: usize, s: &TimelineSegment| {
        i == idx || (s.lane() == lane && s.start_time > origin)
    };

    for (i, s) in segments.iter().enumerate() {
        if follows(i, s) {
            ensure_unlocked(s)?;
        }
    }

    // The shifted group keeps its internal spacing, so only its leading
    // segment can reach the segments left behind.
    let moved = TimelineSegment {
        start_time: new_start,
        ..target.clone()
    };
    ensure_representable(&moved)?;
    if let Some(other) = first_collision(segments, &moved, |s| {
        s.id == id || s.start_time > origin
    }) {
        return Err(CoreError::InvalidRange(format!(
            "ripple move of {} would overlap {}",
            id, other.id
        )));
    }

    segments
        .iter()
        .enumerate()
        .map(|(i, s)| if follows(i, s) { shifted(s, delta) } else { Ok(s.clone()) })
        .collect()
}

/// Insert a segment, pushing every lane segment at or after its start
/// forward by its duration.
pub fn insert(
    segments: &[TimelineSegment],
    new_segment: TimelineSegment,
    config: &EditorConfig,
) -> Result<Vec<TimelineSegment>> {
    check_new_segment(segments, &new_segment, config)?;
    let lane = new_segment.lane();
    let at = new_segment.start_time;
    let shift = new_segment.duration();

    for s in segments.iter().filter(|s| s.lane() == lane) {
        if s.start_time < at && s.end_time() > at {
            return Err(CoreError::InvalidRange(format!(
                "insert point {} falls inside segment {}",
                at, s.id
            )));
        }
        if s.start_time >= at {
            ensure_unlocked(s)?;
        }
    }

    let mut out = segments
        .iter()
        .map(|s| {
            if s.lane() == lane && s.start_time >= at {
                shifted(s, shift)
            } else {
                Ok(s.clone())
            }
        })
        .collect::<Result<Vec<_>>>()?;
    out.push(new_segment);
    Ok(out)
}

/// Place a segment over whatever occupies its span in the same lane.
///
/// Each overlapped segment is handled by the first matching case:
/// fully covered (removed), tail covered (head kept), head covered (tail
/// kept and moved to the new segment's end), or spanning the new segment
/// (split into head and tail). Remnants shorter than `min_duration` are
/// dropped.
pub fn overwrite(
    segments: &[TimelineSegment],
    new_segment: TimelineSegment,
    config: &EditorConfig,
) -> Result<Vec<TimelineSegment>> {
    overwrite_traced(segments, new_segment, config).map(|(out, _)| out)
}

/// `overwrite`, also reporting the fresh segments cut out of a spanned
/// segment as `(parent, child)` id pairs.
pub fn overwrite_traced(
    segments: &[TimelineSegment],
    new_segment: TimelineSegment,
    config: &EditorConfig,
) -> Result<(Vec<TimelineSegment>, Vec<(Uuid, Uuid)>)> {
    check_new_segment(segments, &new_segment, config)?;
    let span = new_segment.span();
    let (new_start, new_end) = (span.start, span.end);

    for s in segments.iter().filter(|s| s.overlaps(&new_segment)) {
        ensure_unlocked(s)?;
    }

    let mut out = Vec::with_capacity(segments.len() + 2);
    let mut lineage = Vec::new();
    let keep = |remnant: TimelineSegment, out: &mut Vec<TimelineSegment>| {
        if remnant.duration() >= config.min_duration {
            out.push(remnant);
            true
        } else {
            tracing::debug!(segment = %remnant.id, "dropping overwrite remnant below minimum length");
            false
        }
    };

    for s in segments {
        if !s.overlaps(&new_segment) {
            out.push(s.clone());
            continue;
        }

        let (start, end) = (s.start_time, s.end_time());
        if start >= new_start && end <= new_end {
            tracing::debug!(segment = %s.id, "overwrite removes covered segment");
        } else if start < new_start && end <= new_end {
            keep(
                TimelineSegment {
                    out_point: s.in_point + (new_start - start),
                    ..s.clone()
                },
                &mut out,
            );
        } else if start >= new_start && end > new_end {
            keep(
                TimelineSegment {
                    in_point: s.in_point + (new_end - start),
                    start_time: new_end,
                    ..s.clone()
                },
                &mut out,
            );
        } else {
            let head = TimelineSegment {
                id: Uuid::new_v4(),
                out_point: s.in_point + (new_start - start),
                ..s.clone()
            };
            let tail = TimelineSegment {
                id: Uuid::new_v4(),
                in_point: s.in_point + (new_end - start),
                start_time: new_end,
                ..s.clone()
            };
            for piece in [head, tail] {
                let piece_id = piece.id;
                if keep(piece, &mut out) {
                    lineage.push((s.id, piece_id));
                }
            }
        }
    }

    out.push(new_segment);
    Ok((out, lineage))
}

// ---------------------------------------------------------------------------
// Other sequence edits
// ---------------------------------------------------------------------------

pub fn remove(segments: &[TimelineSegment], id: Uuid) -> Result<Vec<TimelineSegment>> {
    let idx = find_index(segments, id)?;
    ensure_unlocked(&segments[idx])?;
    let mut out = segments.to_vec();
    out.remove(idx);
    Ok(out)
}

/// Move a single segment, optionally to another lane of the same track.
/// Nothing else shifts; a collision is rejected.
pub fn move_segment(
    segments: &[TimelineSegment],
    id: Uuid,
    new_start: TimeUs,
    new_track_index: Option<u32>,
) -> Result<Vec<TimelineSegment>> {
    let idx = find_index(segments, id)?;
    ensure_unlocked(&segments[idx])?;
    if new_start < TimeUs::ZERO {
        return Err(CoreError::InvalidRange(format!(
            "move of {} to negative time {}",
            id, new_start
        )));
    }

    let moved = TimelineSegment {
        start_time: new_start,
        track_index: new_track_index.unwrap_or(segments[idx].track_index),
        ..segments[idx].clone()
    };
    ensure_representable(&moved)?;
    if let Some(existing) = first_collision(segments, &moved, |s| s.id == id) {
        return Err(CoreError::OverlapDetected {
            segment: id,
            existing: existing.id,
        });
    }

    let mut out = segments.to_vec();
    out[idx] = moved;
    Ok(out)
}

/// Copy a segment under `copy_id` and insert the copy right after the
/// original.
pub fn duplicate(
    segments: &[TimelineSegment],
    id: Uuid,
    copy_id: Uuid,
    config: &EditorConfig,
) -> Result<Vec<TimelineSegment>> {
    let idx = find_index(segments, id)?;
    let original = &segments[idx];
    let copy = TimelineSegment {
        id: copy_id,
        start_time: original.end_time(),
        locked: false,
        ..original.clone()
    };
    insert(segments, copy, config)
}

/// Lay the listed lane segments end to end from zero in the given order.
/// Lane segments missing from `order` are placed after them and disabled.
pub fn reorder(
    segments: &[TimelineSegment],
    lane: Lane,
    order: &[Uuid],
) -> Result<Vec<TimelineSegment>> {
    let mut seen = HashSet::new();
    for id in order {
        let s = &segments[find_index(segments, *id)?];
        if s.lane() != lane {
            return Err(CoreError::InvalidRange(format!(
                "segment {} is not on lane {}",
                id, lane
            )));
        }
        if !seen.insert(*id) {
            return Err(CoreError::InvalidRange(format!(
                "segment {} listed twice in reorder",
                id
            )));
        }
    }

    let mut out: Vec<TimelineSegment> = segments
        .iter()
        .filter(|s| s.lane() != lane)
        .cloned()
        .collect();
    let mut cursor = TimeUs::ZERO;

    for id in order {
        let s = &segments[find_index(segments, *id)?];
        out.push(relaid(s, cursor, s.enabled)?);
        cursor += s.duration();
    }

    for s in lane_segments(segments, lane) {
        if seen.contains(&s.id) {
            continue;
        }
        out.push(relaid(s, cursor, false)?);
        cursor += s.duration();
    }

    Ok(out)
}

pub fn set_enabled(
    segments: &[TimelineSegment],
    id: Uuid,
    enabled: bool,
) -> Result<Vec<TimelineSegment>> {
    let idx = find_index(segments, id)?;
    ensure_unlocked(&segments[idx])?;
    let mut out = segments.to_vec();
    out[idx].enabled = enabled;
    Ok(out)
}

pub fn set_locked(
    segments: &[TimelineSegment],
    id: Uuid,
    locked: bool,
) -> Result<Vec<TimelineSegment>> {
    let idx = find_index(segments, id)?;
    let mut out = segments.to_vec();
    out[idx].locked = locked;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Enabled segments containing `t`, optionally restricted to one track.
pub fn active_segments_at(
    segments: &[TimelineSegment],
    t: TimeUs,
    track: Option<TrackKind>,
) -> Vec<&TimelineSegment> {
    segments
        .iter()
        .filter(|s| s.enabled && s.contains(t) && track.map_or(true, |k| s.track == k))
        .collect()
}

pub fn segment_at(
    segments: &[TimelineSegment],
    t: TimeUs,
    track: Option<TrackKind>,
) -> Option<&TimelineSegment> {
    active_segments_at(segments, t, track).into_iter().next()
}

/// End of the last segment on any lane.
pub fn total_duration(segments: &[TimelineSegment]) -> TimeUs {
    segments
        .iter()
        .map(|s| s.end_time())
        .max()
        .unwrap_or(TimeUs::ZERO)
        .max(TimeUs::ZERO)
}

/// Pairs of same-lane segments whose spans intersect.
pub fn find_overlaps(segments: &[TimelineSegment]) -> Vec<(Uuid, Uuid)> {
    let mut lanes: BTreeMap<Lane, Vec<&TimelineSegment>> = BTreeMap::new();
    for s in segments {
        lanes.entry(s.lane()).or_default().push(s);
    }

    let mut pairs = Vec::new();
    for lane in lanes.values_mut() {
        lane.sort_by_key(|s| s.start_time);
        for (i, a) in lane.iter().enumerate() {
            for b in &lane[i + 1..] {
                if b.start_time >= a.end_time() {
                    break;
                }
                pairs.push((a.id, b.id));
            }
        }
    }
    pairs
}

/// Convert a timeline instant into the segment's source-local time. The
/// segment's end is still mapped.
pub fn map_timeline_to_source(segment: &TimelineSegment, t: TimeUs) -> MappingResult {
    if t < segment.start_time || t > segment.end_time() {
        return MappingResult::OutOfRange;
    }
    MappingResult::Valid {
        source_segment_id: segment.source_segment_id,
        source_time: segment.in_point + (t - segment.start_time),
    }
}

/// Segments of one lane in ascending start order.
pub fn lane_segments(segments: &[TimelineSegment], lane: Lane) -> Vec<&TimelineSegment> {
    let mut out: Vec<&TimelineSegment> = segments.iter().filter(|s| s.lane() == lane).collect();
    out.sort_by_key(|s| s.start_time);
    out
}

pub fn find_index(segments: &[TimelineSegment], id: Uuid) -> Result<usize> {
    segments
        .iter()
        .position(|s| s.id == id)
        .ok_or(CoreError::UnknownSegment(id))
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

/// Check the sequence invariants: unique ids, `0 <= in < out`,
/// `duration >= min_duration`, and no overlap inside a lane.
pub fn validate(segments: &[TimelineSegment], config: &EditorConfig) -> Result<()> {
    let mut ids = HashSet::with_capacity(segments.len());
    for s in segments {
        if !ids.insert(s.id) {
            return Err(CoreError::InvariantViolation(format!(
                "duplicate segment id {}",
                s.id
            )));
        }
        if s.in_point < TimeUs::ZERO || s.in_point >= s.out_point {
            return Err(CoreError::InvariantViolation(format!(
                "segment {} has trim window [{}, {})",
                s.id, s.in_point, s.out_point
            )));
        }
        if s.duration() < config.min_duration {
            return Err(CoreError::InvariantViolation(format!(
                "segment {} is shorter than {}",
                s.id, config.min_duration
            )));
        }
    }

    if let Some((a, b)) = find_overlaps(segments).into_iter().next() {
        return Err(CoreError::InvariantViolation(format!(
            "segments {} and {} overlap",
            a, b
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ensure_unlocked(segment: &TimelineSegment) -> Result<()> {
    if segment.locked {
        Err(CoreError::SegmentLocked(segment.id))
    } else {
        Ok(())
    }
}

/// Reject a segment whose end does not fit in `TimeUs`.
fn ensure_representable(segment: &TimelineSegment) -> Result<()> {
    let end = segment
        .out_point
        .0
        .checked_sub(segment.in_point.0)
        .and_then(|length| segment.start_time.0.checked_add(length));
    match end {
        Some(_) => Ok(()),
        None => Err(CoreError::InvalidRange(format!(
            "segment {} ends past the representable time range",
            segment.id
        ))),
    }
}

fn shifted(segment: &TimelineSegment, delta: TimeUs) -> Result<TimelineSegment> {
    let start_time = segment.start_time.checked_add(delta).ok_or_else(|| {
        CoreError::InvalidRange(format!("shifting segment {} overflows the timeline", segment.id))
    })?;
    let moved = TimelineSegment {
        start_time,
        ..segment.clone()
    };
    ensure_representable(&moved)?;
    Ok(moved)
}

fn check_new_segment(
    segments: &[TimelineSegment],
    segment: &TimelineSegment,
    config: &EditorConfig,
) -> Result<()> {
    if segments.iter().any(|s| s.id == segment.id) {
        return Err(CoreError::InvalidRange(format!(
            "segment {} is already on the timeline",
            segment.id
        )));
    }
    if segment.start_time < TimeUs::ZERO || segment.in_point < TimeUs::ZERO {
        return Err(CoreError::InvalidRange(format!(
            "segment {} starts before zero",
            segment.id
        )));
    }
    ensure_representable(segment)?;
    if segment.duration() < config.min_duration {
        return Err(CoreError::InvalidRange(format!(
            "segment {} is shorter than {}",
            segment.id, config.min_duration
        )));
    }
    Ok(())
}

/// First segment, other than those `skip` excludes, that `candidate` would
/// overlap.
fn first_collision<'a>(
    segments: &'a [TimelineSegment],
    candidate: &TimelineSegment,
    skip: impl Fn(&TimelineSegment) -> bool,
) -> Option<&'a TimelineSegment> {
    segments
        .iter()
        .filter(|s| !skip(s))
        .find(|s| s.overlaps(candidate))
}

fn relaid(segment: &TimelineSegment, start: TimeUs, enabled: bool) -> Result<TimelineSegment> {
    if segment.start_time != start || segment.enabled != enabled {
        ensure_unlocked(segment)?;
    }
    Ok(TimelineSegment {
        start_time: start,
        enabled,
        ..segment.clone()
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
