use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::CoreError;

///
/// A stretch of reference positions starting at `start` and covering `len` bases.
///
/// `end()` is inclusive, `end_exclusive()` is the first position after the range.
/// Boundary events and merging both work on the exclusive end, so two ranges
/// where `a.end_exclusive() == b.start` touch and form one contiguous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: i64,
    pub len: i64,
    pub ambiguous: bool,
}

impl Range {
    pub fn new(start: i64, len: i64, ambiguous: bool) -> Self {
        Range {
            start,
            len,
            ambiguous,
        }
    }

    /// Last position covered by the range.
    #[inline]
    pub fn end(&self) -> i64 {
        self.start + self.len - 1
    }

    /// First position after the range.
    #[inline]
    pub fn end_exclusive(&self) -> i64 {
        self.start + self.len
    }

    /// Check if the range shares at least one position with `[start, end]` (both inclusive).
    #[inline]
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start <= end && self.end() >= start
    }
}

impl Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = if self.ambiguous { 'A' } else { 'N' };
        write!(f, "{}{}.{}", flag, self.start, self.len)
    }
}

impl FromStr for Range {
    type Err = CoreError;

    /// Parse a `<A|N><start>.<len>` section, e.g. `A100.25`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let ambiguous = match s.chars().next() {
            Some('A') => true,
            Some('N') => false,
            _ => return Err(CoreError::RangeParseError(s.to_string())),
        };

        let (start, len) = s[1..]
            .split_once('.')
            .ok_or_else(|| CoreError::RangeParseError(s.to_string()))?;

        let start = start
            .parse::<i64>()
            .map_err(|_| CoreError::RangeParseError(s.to_string()))?;
        let len = len
            .parse::<i64>()
            .map_err(|_| CoreError::RangeParseError(s.to_string()))?;

        Ok(Range::new(start, len, ambiguous))
    }
}
