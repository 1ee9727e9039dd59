//! Ordered lists of ranges and the boundary events they produce.
//!
//! An [`IntervalList`] is the working buffer of the overlap engine. A feature keeps its exons in
//! one, and every alignment is turned into one from its CIGAR string. The overlap classifier
//! never looks at the ranges directly: it replays both lists as [`RangeEvent`] streams and
//! sweeps them together.
//!
//! ```rust
//! use genecount_core::models::{BoundaryKind, IntervalList};
//!
//! let mut exons = IntervalList::new();
//! exons.add(150, 50, false);
//! exons.add(100, 50, false);
//! exons.merge();
//! assert_eq!(exons.to_string(), "N100.100");
//!
//! let kinds: Vec<BoundaryKind> = exons.events().map(|e| e.kind).collect();
//! assert_eq!(kinds, vec![BoundaryKind::Start, BoundaryKind::End]);
//! ```
use std::fmt::{self, Display};

use super::range::Range;

/// What happens at a boundary position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryKind {
    Start,
    StartAmbiguous,
    End,
    EndAmbiguous,
}

impl BoundaryKind {
    pub fn is_start(&self) -> bool {
        matches!(self, BoundaryKind::Start | BoundaryKind::StartAmbiguous)
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(
            self,
            BoundaryKind::StartAmbiguous | BoundaryKind::EndAmbiguous
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeEvent {
    pub position: i64,
    pub kind: BoundaryKind,
}

///
/// A list of `(start, len, ambiguous)` ranges on one reference.
///
/// The list remembers whether ranges were added in ascending start order, so
/// [`IntervalList::sort`] is free for input that already arrives sorted. Index based accessors
/// never panic: reads outside `[0, len)` return `0` / `false` and writes are ignored.
#[derive(Debug, Clone)]
pub struct IntervalList {
    ranges: Vec<Range>,
    sorted: bool,
}

impl Default for IntervalList {
    fn default() -> Self {
        IntervalList::new()
    }
}

impl PartialEq for IntervalList {
    fn eq(&self, other: &Self) -> bool {
        self.ranges == other.ranges
    }
}

impl Eq for IntervalList {}

impl IntervalList {
    pub fn new() -> Self {
        IntervalList {
            ranges: Vec::new(),
            sorted: true,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        IntervalList {
            ranges: Vec::with_capacity(capacity),
            sorted: true,
        }
    }

    /// Drop all ranges but keep the allocation around for the next fill.
    pub fn clear(&mut self) {
        self.ranges.clear();
        self.sorted = true;
    }

    pub fn add(&mut self, start: i64, len: i64, ambiguous: bool) {
        self.push(Range::new(start, len, ambiguous));
    }

    pub fn push(&mut self, range: Range) {
        if let Some(last) = self.ranges.last() {
            if range.start < last.start {
                self.sorted = false;
            }
        }
        self.ranges.push(range);
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Range> {
        self.ranges.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&Range> {
        self.ranges.get(idx)
    }

    pub fn start_at(&self, idx: usize) -> i64 {
        self.ranges.get(idx).map(|r| r.start).unwrap_or(0)
    }

    pub fn len_at(&self, idx: usize) -> i64 {
        self.ranges.get(idx).map(|r| r.len).unwrap_or(0)
    }

    pub fn end_at(&self, idx: usize) -> i64 {
        self.ranges.get(idx).map(|r| r.end()).unwrap_or(0)
    }

    pub fn is_ambiguous_at(&self, idx: usize) -> bool {
        self.ranges.get(idx).map(|r| r.ambiguous).unwrap_or(false)
    }

    /// Negative lengths are ignored.
    pub fn set_len(&mut self, idx: usize, len: i64) {
        if len < 0 {
            return;
        }
        if let Some(range) = self.ranges.get_mut(idx) {
            range.len = len;
        }
    }

    pub fn set_ambiguous(&mut self, idx: usize, ambiguous: bool) {
        if let Some(range) = self.ranges.get_mut(idx) {
            range.ambiguous = ambiguous;
        }
    }

    /// First covered position, `0` for an empty list.
    pub fn start(&self) -> i64 {
        self.start_at(0)
    }

    /// Last covered position (inclusive), `0` for an empty list.
    pub fn end(&self) -> i64 {
        match self.ranges.len() {
            0 => 0,
            n => self.end_at(n - 1),
        }
    }

    /// Sum of all range lengths.
    pub fn total_len(&self) -> i64 {
        self.ranges.iter().map(|r| r.len).sum()
    }

    /// Stable ascending sort by start, skipped when the list is known to be sorted.
    pub fn sort(&mut self) {
        if !self.sorted {
            self.ranges.sort_by_key(|r| r.start);
            self.sorted = true;
        }
    }

    ///
    /// Sort, then coalesce overlapping or touching ranges into an ascending list.
    ///
    /// Ranges with the same flag merge when one starts at or before the other's exclusive end.
    /// Plain and ambiguous ranges never merge: where they overlap, the shared positions stay
    /// ambiguous and the plain range is cut around them, so a plain range can only touch an
    /// ambiguous one. Empty ranges are dropped in the same pass.
    pub fn merge(&mut self) {
        self.sort();

        if !self.ranges.iter().any(|r| r.ambiguous) {
            let kept = coalesce_in_place(&mut self.ranges);
            self.ranges.truncate(kept);
            return;
        }

        let mut plain: Vec<Range> = Vec::with_capacity(self.ranges.len());
        let mut ambiguous: Vec<Range> = Vec::new();
        for &range in self.ranges.iter().filter(|r| r.len > 0) {
            let target = if range.ambiguous {
                &mut ambiguous
            } else {
                &mut plain
            };
            match target.last_mut() {
                Some(last) if range.start <= last.end_exclusive() => {
                    if range.end_exclusive() > last.end_exclusive() {
                        last.len = range.end_exclusive() - last.start;
                    }
                }
                _ => target.push(range),
            }
        }

        self.ranges.clear();
        let mut amb_idx = 0;
        for range in plain {
            while amb_idx < ambiguous.len() && ambiguous[amb_idx].end_exclusive() <= range.start {
                self.ranges.push(ambiguous[amb_idx]);
                amb_idx += 1;
            }

            let mut cursor = range.start;
            let mut idx = amb_idx;
            while idx < ambiguous.len() && ambiguous[idx].start < range.end_exclusive() {
                let amb = ambiguous[idx];
                if amb.start > cursor {
                    self.ranges.push(Range::new(cursor, amb.start - cursor, false));
                }
                cursor = cursor.max(amb.end_exclusive());
                if amb.end_exclusive() <= range.end_exclusive() {
                    self.ranges.push(amb);
                    idx += 1;
                } else {
                    break;
                }
            }
            amb_idx = idx;
            if cursor < range.end_exclusive() {
                self.ranges.push(Range::new(cursor, range.end_exclusive() - cursor, false));
            }
        }
        self.ranges.extend_from_slice(&ambiguous[amb_idx..]);
    }

    ///
    /// Build the reference ranges covered by an alignment.
    ///
    /// # Arguments
    /// - start: reference position of the first aligned base
    /// - cigar: a CIGAR string such as `10M2D5M`
    pub fn from_cigar(start: i64, cigar: &str) -> Self {
        let mut list = IntervalList::new();
        list.fill_from_cigar(start, cigar);
        list
    }

    ///
    /// Clear the list and refill it from a CIGAR string.
    ///
    /// `M`, `=` and `X` cover reference bases, `D` and `N` skip over them, while `I`, `S`,
    /// `H` and `P` do not touch the reference at all. An operation without a count has
    /// length 1, and one whose count does not fit in an `i64` is skipped. The result is merged,
    /// so `5M5M` yields a single range.
    pub fn fill_from_cigar(&mut self, start: i64, cigar: &str) {
        self.clear();

        let mut offset: i64 = 0;
        for (op, len) in cigar_ops(cigar) {
            match op {
                'M' | '=' | 'X' => {
                    self.add(start.saturating_add(offset), len, false);
                    offset = offset.saturating_add(len);
                }
                'D' | 'N' => offset = offset.saturating_add(len),
                _ => {}
            }
        }

        self.merge();
    }

    ///
    /// Mark every part of this list that overlaps `other` as ambiguous.
    ///
    /// Both lists must be sorted and merged. Ranges are split where the overlap starts or
    /// stops, so a single range can turn into up to three: a plain head, an ambiguous middle
    /// and a plain tail. Total coverage never changes.
    pub fn detect_amb(&mut self, other: &IntervalList) {
        let mut this_idx = 0;
        let mut other_idx = 0;

        while this_idx < self.ranges.len() && other_idx < other.ranges.len() {
            let this = self.ranges[this_idx];
            let ovr = other.ranges[other_idx];
            let (this_end, ovr_end) = (this.end(), ovr.end());

            if ovr_end < this.start {
                // other lies before this
                other_idx += 1;
            } else if ovr.start > this_end {
                // other lies after this
                this_idx += 1;
            } else if ovr.start <= this.start && ovr_end >= this_end {
                // other covers this
                self.ranges[this_idx].ambiguous = true;
                if ovr_end == this_end {
                    other_idx += 1;
                }
                this_idx += 1;
            } else if ovr.start <= this.start {
                // other covers the head of this
                if !this.ambiguous {
                    self.ranges[this_idx] = Range::new(this.start, ovr_end - this.start + 1, true);
                    self.ranges.insert(
                        this_idx + 1,
                        Range::new(ovr_end + 1, this_end - ovr_end, false),
                    );
                    this_idx += 1;
                }
                other_idx += 1;
            } else if ovr_end < this_end {
                // other sits strictly inside this
                if !this.ambiguous {
                    self.ranges[this_idx] = Range::new(this.start, ovr.start - this.start, false);
                    self.ranges.insert(this_idx + 1, Range::new(ovr.start, ovr.len, true));
                    self.ranges.insert(
                        this_idx + 2,
                        Range::new(ovr_end + 1, this_end - ovr_end, false),
                    );
                    this_idx += 2;
                }
                other_idx += 1;
            } else {
                // other covers the tail of this
                if !this.ambiguous {
                    self.ranges[this_idx] = Range::new(this.start, ovr.start - this.start, false);
                    self.ranges.insert(
                        this_idx + 1,
                        Range::new(ovr.start, this_end - ovr.start + 1, true),
                    );
                    this_idx += 1;
                }
                this_idx += 1;
            }
        }
    }

    ///
    /// Replay the list as boundary events.
    ///
    /// Every range yields a start at `start` and an end at its exclusive end. When the next
    /// range begins exactly at that exclusive end, the end event is replaced by the next
    /// range's start, so a contiguous run produces one event per change of state. Calling
    /// `events()` again restarts the stream.
    pub fn events(&self) -> Events<'_> {
        Events {
            ranges: &self.ranges,
            idx: 0,
            at_end: false,
        }
    }
}

impl Display for IntervalList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, range) in self.ranges.iter().enumerate() {
            if idx > 0 {
                write!(f, ";")?;
            }
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}

impl FromIterator<Range> for IntervalList {
    fn from_iter<T: IntoIterator<Item = Range>>(iter: T) -> Self {
        let mut list = IntervalList::new();
        for range in iter {
            list.push(range);
        }
        list
    }
}

impl<'a> IntoIterator for &'a IntervalList {
    type Item = &'a Range;
    type IntoIter = std::slice::Iter<'a, Range>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

/// Boundary events of an [`IntervalList`], see [`IntervalList::events`].
pub struct Events<'a> {
    ranges: &'a [Range],
    idx: usize,
    at_end: bool,
}

impl Iterator for Events<'_> {
    type Item = RangeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let range = self.ranges.get(self.idx)?;

        if !self.at_end {
            self.at_end = true;
            return Some(RangeEvent {
                position: range.start,
                kind: start_kind(range),
            });
        }

        let position = range.end_exclusive();
        self.idx += 1;
        match self.ranges.get(self.idx) {
            Some(next) if next.start == position => Some(RangeEvent {
                position,
                kind: start_kind(next),
            }),
            _ => {
                self.at_end = false;
                Some(RangeEvent {
                    position,
                    kind: if range.ambiguous {
                        BoundaryKind::EndAmbiguous
                    } else {
                        BoundaryKind::End
                    },
                })
            }
        }
    }
}

/// Walk a CIGAR string as `(op, len)` pairs.
///
/// A missing count means 1. Ops whose count overflows are malformed and skipped.
pub fn cigar_ops(cigar: &str) -> CigarOps<'_> {
    CigarOps {
        chars: cigar.chars(),
    }
}

pub struct CigarOps<'a> {
    chars: std::str::Chars<'a>,
}

impl Iterator for CigarOps<'_> {
    type Item = (char, i64);

    fn next(&mut self) -> Option<Self::Item> {
        let mut count: Option<i64> = None;
        let mut malformed = false;
        for c in self.chars.by_ref() {
            if let Some(digit) = c.to_digit(10) {
                match count
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(i64::from(digit)))
                {
                    Some(v) => count = Some(v),
                    None => malformed = true,
                }
                continue;
            }
            if malformed {
                count = None;
                malformed = false;
                continue;
            }
            return Some((c, count.unwrap_or(1)));
        }
        None
    }
}

/// Merge a sorted run of same-flag ranges in place and return how many are kept.
fn coalesce_in_place(ranges: &mut [Range]) -> usize {
    let mut kept = 0;
    for idx in 0..ranges.len() {
        let curr = ranges[idx];
        if curr.len <= 0 {
            continue;
        }

        if kept > 0 && curr.start <= ranges[kept - 1].end_exclusive() {
            let last = &mut ranges[kept - 1];
            if curr.end_exclusive() > last.end_exclusive() {
                last.len = curr.end_exclusive() - last.start;
            }
        } else {
            ranges[kept] = curr;
            kept += 1;
        }
    }
    kept
}

fn start_kind(range: &Range) -> BoundaryKind {
    if range.ambiguous {
        BoundaryKind::StartAmbiguous
    } else {
        BoundaryKind::Start
    }
}
