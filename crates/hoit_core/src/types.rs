use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TimeUs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeUs(pub i64);

impl TimeUs {
    pub const ZERO: Self = Self(0);

    /// Largest magnitude `try_from_seconds` accepts, about 31 years.
    pub const MAX_SECONDS: f64 = 1.0e9;

    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000_000.0).round() as i64)
    }

    /// `None` for non-finite input or magnitudes past `MAX_SECONDS`.
    pub fn try_from_seconds(s: f64) -> Option<Self> {
        (s.is_finite() && s.abs() <= Self::MAX_SECONDS).then(|| Self::from_seconds(s))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms * 1_000)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Multiply by a real factor, rounding to the nearest microsecond.
    pub fn scaled(self, factor: f64) -> Self {
        Self((self.0 as f64 * factor).round() as i64)
    }
}

impl Add for TimeUs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for TimeUs {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for TimeUs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for TimeUs {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<i64> for TimeUs {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<i64> for TimeUs {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self(self.0 / rhs)
    }
}

impl fmt::Display for TimeUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_us = self.0.unsigned_abs();
        let total_ms = total_us / 1_000;
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if self.0 < 0 {
            write!(f, "-{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        }
    }
}

// ---------------------------------------------------------------------------
// TimeRange
// ---------------------------------------------------------------------------

/// Half-open span `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeRange {
    pub start: TimeUs,
    pub end: TimeUs,
}

impl TimeRange {
    pub fn new(start: TimeUs, end: TimeUs) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> TimeUs {
        self.end - self.start
    }

    pub fn contains(&self, t: TimeUs) -> bool {
        self.start <= t && t < self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

// ---------------------------------------------------------------------------
// TrackKind / Lane
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
}

/// A track category plus the lane number inside it. Segments in the same
/// lane may not overlap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lane {
    pub track: TrackKind,
    pub index: u32,
}

impl Lane {
    pub fn new(track: TrackKind, index: u32) -> Self {
        Self { track, index }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{}", self.track, self.index)
    }
}

// ---------------------------------------------------------------------------
// TimelineSegment
// ---------------------------------------------------------------------------

/// One unit of the edited sequence: a trim window `[in_point, out_point)`
/// into a source segment's local axis, placed at `start_time` on the
/// timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineSegment {
    pub id: Uuid,
    pub source_segment_id: Uuid,
    pub in_point: TimeUs,
    pub out_point: TimeUs,
    pub start_time: TimeUs,
    pub track: TrackKind,
    pub track_index: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
}

fn default_enabled() -> bool {
    true
}

impl TimelineSegment {
    /// A fresh, enabled, unlocked segment on the given lane.
    pub fn new(
        source_segment_id: Uuid,
        lane: Lane,
        start_time: TimeUs,
        in_point: TimeUs,
        out_point: TimeUs,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_segment_id,
            in_point,
            out_point,
            start_time,
            track: lane.track,
            track_index: lane.index,
            enabled: true,
            locked: false,
        }
    }

    pub fn duration(&self) -> TimeUs {
        self.out_point - self.in_point
    }

    pub fn end_time(&self) -> TimeUs {
        self.start_time + self.duration()
    }

    pub fn lane(&self) -> Lane {
        Lane::new(self.track, self.track_index)
    }

    pub fn span(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time())
    }

    pub fn contains(&self, t: TimeUs) -> bool {
        self.span().contains(t)
    }

    /// True when both segments share a lane and their spans intersect.
    pub fn overlaps(&self, other: &TimelineSegment) -> bool {
        self.lane() == other.lane() && self.span().overlaps(&other.span())
    }
}

// ---------------------------------------------------------------------------
// SourceSegment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceWord {
    pub id: Uuid,
    pub text: String,
    pub start: TimeUs,
    pub end: TimeUs,
}

/// Immutable transcript segment. Words are ordered and non-overlapping; the
/// segment's local axis begins at the first word's start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSegment {
    pub id: Uuid,
    #[serde(default)]
    pub speaker: String,
    pub words: Vec<SourceWord>,
}

impl SourceSegment {
    pub fn first_word_start(&self) -> Option<TimeUs> {
        self.words.first().map(|w| w.start)
    }

    /// Distance from the first word's start to the last word's end.
    pub fn word_span(&self) -> TimeUs {
        match (self.words.first(), self.words.last()) {
            (Some(first), Some(last)) => last.end - first.start,
            _ => TimeUs::ZERO,
        }
    }

    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
