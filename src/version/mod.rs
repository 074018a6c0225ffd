//! Version model
//!
//! A version is parsed once from a dot/dash-delimited string into an ordered
//! sequence of numeric and textual segments, and is immutable afterwards.
//!
//! `compare_to` returns a signed magnitude, not just a sign: callers depend
//! on the aggregated segment-wise difference (e.g. `"1.10"` vs `"1.2"` is 8,
//! the numeric difference of the first segments that differ). Only the sign
//! is meaningful for ordering; `Ord` is derived from it.

pub mod constraint;

pub use constraint::VersionConstraint;

use std::cmp::Ordering;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One alphanumeric run of a version string.
///
/// The raw text is always kept: a numeric segment compared against a textual
/// one falls back to string comparison over the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    text: String,
    number: Option<i64>,
}

impl Segment {
    fn new(text: &str) -> Self {
        Segment {
            text: text.to_string(),
            number: text.parse::<i64>().ok(),
        }
    }
}

/// An immutable, totally ordered version value.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    segments: Vec<Segment>,
}

impl Version {
    /// Parse a version from its string form.
    ///
    /// Splitting happens on every non-alphanumeric boundary; empty runs are
    /// skipped, so `"1..2"` and `"1.2"` parse identically.
    pub fn new(raw: &str) -> Self {
        let segments = raw
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|s| !s.is_empty())
            .map(Segment::new)
            .collect();

        Version {
            raw: raw.to_string(),
            segments,
        }
    }

    /// The original string this version was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Compare two versions, returning a signed magnitude.
    ///
    /// Segments are compared pairwise:
    /// - two numeric segments compare as integers (difference returned)
    /// - any textual operand falls back to a character-wise string
    ///   comparison over the raw segment text (first differing character's
    ///   code point difference, length difference otherwise)
    /// - when the shared prefix is equal, the version with extra trailing
    ///   segments is the greater one (segment count difference returned)
    pub fn compare_to(&self, other: &Version) -> i64 {
        let shared = self.segments.len().min(other.segments.len());

        for i in 0..shared {
            let diff = compare_segments(&self.segments[i], &other.segments[i]);
            if diff != 0 {
                return diff;
            }
        }

        self.segments.len() as i64 - other.segments.len() as i64
    }
}

fn compare_segments(a: &Segment, b: &Segment) -> i64 {
    match (a.number, b.number) {
        (Some(x), Some(y)) => saturating_i64(x as i128 - y as i128),
        _ => compare_text(&a.text, &b.text),
    }
}

/// Character-wise string comparison: the first differing character's code
/// point difference, or the length difference when one is a prefix.
fn compare_text(a: &str, b: &str) -> i64 {
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            return ca as i64 - cb as i64;
        }
    }
    a.chars().count() as i64 - b.chars().count() as i64
}

fn saturating_i64(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare_to(other) == 0
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other).cmp(&0)
    }
}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash each segment's normalized value so that equal versions hash
        // equally even when the raw strings differ: numeric segments compare
        // by value ("1.01" == "1.1"), so they must hash by value too.
        for segment in &self.segments {
            match segment.number {
                Some(number) => number.hash(state),
                None => segment.text.hash(state),
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for Version {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Version::new(s))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.is_empty() {
            return Err(D::Error::custom("version string must not be empty"));
        }
        Ok(Version::new(&raw))
    }
}
