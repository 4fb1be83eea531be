//! Stream entry ids and read/append positions
//!
//! Ids are `<millis>-<seq>` pairs ordered lexicographically. Positions are
//! the special markers (`*`, `$`, `>`) parsed into enums at the boundary so
//! nothing past it compares magic strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error parsing a stream id or position marker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid stream id: {0:?}")]
pub struct ParseIdError(pub String);

/// A stream entry id (`<millis>-<seq>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    /// Milliseconds part (wall clock for broker-assigned ids)
    pub millis: u64,
    /// Sequence number within the same millisecond
    pub seq: u64,
}

impl StreamId {
    /// The smallest id; never a valid entry id
    pub const MIN: StreamId = StreamId { millis: 0, seq: 0 };

    pub const fn new(millis: u64, seq: u64) -> Self {
        Self { millis, seq }
    }

    /// Next id a broker would assign after `self` at wall-clock `now_millis`.
    ///
    /// Falls back to bumping the sequence when the clock has not advanced
    /// past the last id (same millisecond, or the clock went backwards); a
    /// full sequence rolls over into the next millisecond. `None` once both
    /// parts are at their maximum.
    pub fn next_after(&self, now_millis: u64) -> Option<Self> {
        if now_millis > self.millis {
            return Some(StreamId::new(now_millis, 0));
        }
        match self.seq.checked_add(1) {
            Some(seq) => Some(StreamId::new(self.millis, seq)),
            None => self.millis.checked_add(1).map(|millis| StreamId::new(millis, 0)),
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

impl FromStr for StreamId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseIdError(s.to_string());
        // u64::from_str also takes a leading '+'
        let part = |p: &str| -> Result<u64, ParseIdError> {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
            p.parse().map_err(|_| err())
        };
        match s.split_once('-') {
            Some((millis, seq)) => Ok(StreamId::new(part(millis)?, part(seq)?)),
            None => Ok(StreamId::new(part(s)?, 0)),
        }
    }
}

impl Serialize for StreamId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StreamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Id requested for an append
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppendId {
    /// Broker assigns the id (`*`)
    #[default]
    Auto,
    /// Caller-assigned id; must exceed the stream's current tail
    Explicit(StreamId),
}

impl FromStr for AppendId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "*" => Ok(AppendId::Auto),
            other => other.parse().map(AppendId::Explicit),
        }
    }
}

impl fmt::Display for AppendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppendId::Auto => write!(f, "*"),
            AppendId::Explicit(id) => write!(f, "{}", id),
        }
    }
}

/// Starting point of a non-group read (exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFrom {
    /// Only entries appended after the call begins (`$`)
    #[default]
    Latest,
    /// Entries with an id strictly greater than this one
    After(StreamId),
}

impl FromStr for ReadFrom {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "$" => Ok(ReadFrom::Latest),
            other => other.parse().map(ReadFrom::After),
        }
    }
}

impl fmt::Display for ReadFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadFrom::Latest => write!(f, "$"),
            ReadFrom::After(id) => write!(f, "{}", id),
        }
    }
}

/// Initial cursor of a new consumer group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupStart {
    /// Tail of the stream at creation time (`$`)
    #[default]
    Latest,
    /// Deliver entries after this id
    At(StreamId),
}

impl FromStr for GroupStart {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "$" => Ok(GroupStart::Latest),
            other => other.parse().map(GroupStart::At),
        }
    }
}

impl fmt::Display for GroupStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupStart::Latest => write!(f, "$"),
            GroupStart::At(id) => write!(f, "{}", id),
        }
    }
}

/// What a group read delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupReadFrom {
    /// Entries never delivered to any consumer of the group (`>`)
    #[default]
    Undelivered,
    /// This consumer's own pending entries with an id greater than this one
    PendingAfter(StreamId),
}

impl FromStr for GroupReadFrom {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(GroupReadFrom::Undelivered),
            other => other.parse().map(GroupReadFrom::PendingAfter),
        }
    }
}

impl fmt::Display for GroupReadFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupReadFrom::Undelivered => write!(f, ">"),
            GroupReadFrom::PendingAfter(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_id() {
        assert_eq!("1700000000000-3".parse::<StreamId>().unwrap(), StreamId::new(1700000000000, 3));
        assert_eq!("42".parse::<StreamId>().unwrap(), StreamId::new(42, 0));
        assert_eq!("0".parse::<StreamId>().unwrap(), StreamId::MIN);
        assert!("".parse::<StreamId>().is_err());
        assert!("abc-1".parse::<StreamId>().is_err());
        assert!("1-".parse::<StreamId>().is_err());
        assert!("-1".parse::<StreamId>().is_err());
    }

    #[test]
    fn test_parse_rejects_signs() {
        assert!("+5-+1".parse::<StreamId>().is_err());
        assert!("+5".parse::<StreamId>().is_err());
        assert!("5-+1".parse::<StreamId>().is_err());
        assert!(" 5 - 1".parse::<StreamId>().is_err());
        assert!("18446744073709551616-0".parse::<StreamId>().is_err());
    }

    #[test]
    fn test_stream_id_ordering() {
        assert!(StreamId::new(1, 5) < StreamId::new(2, 0));
        assert!(StreamId::new(2, 0) < StreamId::new(2, 1));
        assert_eq!(StreamId::new(5, 9).to_string(), "5-9");
    }

    #[test]
    fn test_next_after() {
        let last = StreamId::new(100, 4);
        assert_eq!(last.next_after(101), Some(StreamId::new(101, 0)));
        assert_eq!(last.next_after(100), Some(StreamId::new(100, 5)));
        // clock went backwards
        assert_eq!(last.next_after(50), Some(StreamId::new(100, 5)));
    }

    #[test]
    fn test_next_after_full_sequence_rolls_over() {
        let last = StreamId::new(99_999_999_999_999, u64::MAX);
        assert_eq!(last.next_after(1_000), Some(StreamId::new(100_000_000_000_000, 0)));
        assert!(last.next_after(1_000).unwrap() > last);
    }

    #[test]
    fn test_next_after_exhausted() {
        assert_eq!(StreamId::new(u64::MAX, u64::MAX).next_after(0), None);
        assert_eq!(
            StreamId::new(u64::MAX, 7).next_after(0),
            Some(StreamId::new(u64::MAX, 8))
        );
    }

    #[test]
    fn test_position_markers() {
        assert_eq!("*".parse::<AppendId>().unwrap(), AppendId::Auto);
        assert_eq!("$".parse::<ReadFrom>().unwrap(), ReadFrom::Latest);
        assert_eq!("0".parse::<ReadFrom>().unwrap(), ReadFrom::After(StreamId::MIN));
        assert_eq!("$".parse::<GroupStart>().unwrap(), GroupStart::Latest);
        assert_eq!(">".parse::<GroupReadFrom>().unwrap(), GroupReadFrom::Undelivered);
        assert_eq!(
            "7-1".parse::<GroupReadFrom>().unwrap(),
            GroupReadFrom::PendingAfter(StreamId::new(7, 1))
        );
        assert!(">".parse::<ReadFrom>().is_err());
        assert!("$".parse::<GroupReadFrom>().is_err());
    }

    #[test]
    fn test_stream_id_serde() {
        let id = StreamId::new(12, 3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"12-3\"");
        let back: StreamId = serde_json::from_str("\"12-3\"").unwrap();
        assert_eq!(back, id);
    }
}
