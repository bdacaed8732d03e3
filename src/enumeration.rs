//! Serial enumeration strings.
//!
//! Recognizes one narrow shape, `<unit><start>-<unit><end>:<subunit><n>`,
//! as in `v.1-v.4:no.3`. Anything else yields `None`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref ENUM_RANGE: Regex =
        Regex::new(r"^((?:v|Bd|no)\.)(\d+\w?)-((?:v|Bd|no)\.)(\d+\w?):((?:no|pt|Nr)\.|issue )(\d+)$")
            .unwrap_or_else(|e| unreachable!("enumeration pattern: {e}"));
}

/// A parsed enumeration range.
///
/// The input names a single unit range, so `start2` repeats `start1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationRange {
    /// Unit caption, e.g. `v.`.
    #[serde(rename = "ec1")]
    pub caption1: String,
    /// Subunit caption, e.g. `no.`.
    #[serde(rename = "ec2")]
    pub caption2: String,
    /// First unit.
    #[serde(rename = "es1")]
    pub start1: i64,
    /// Last unit.
    #[serde(rename = "ee1")]
    pub end1: i64,
    /// Same as `start1`.
    #[serde(rename = "es2")]
    pub start2: i64,
    /// Subunit number.
    #[serde(rename = "ee2")]
    pub end2: i64,
}

/// Parse an enumeration string.
///
/// Both unit captions must match, and unit numbers with a letter suffix
/// (`v.2a`) are not numeric and do not parse.
#[must_use]
pub fn parse_enum(value: &str) -> Option<EnumerationRange> {
    let caps = ENUM_RANGE.captures(value)?;
    if caps[1] != caps[3] {
        return None;
    }
    let start: i64 = caps[2].parse().ok()?;
    Some(EnumerationRange {
        caption1: caps[1].to_string(),
        caption2: caps[5].to_string(),
        start1: start,
        end1: caps[4].parse().ok()?,
        start2: start,
        end2: caps[6].parse().ok()?,
    })
}
