use std::fmt::{self, Display};
use std::ops::{Add, AddAssign};

use serde::Serialize;

use crate::checker::Outcome;

///
/// Outcome tallies of an alignment-centric run.
///
/// Every counted alignment lands in exactly one of the five outcome buckets, so
/// [`LookupCounters::total_processed`] equals `alignments` for a finished run. Unaligned reads
/// are reported on their own and never enter the buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LookupCounters {
    pub alignments: u64,
    pub counted: u64,
    pub not_counted: u64,
    pub ambiguous: u64,
    pub no_feature: u64,
    pub mapq_low: u64,
    pub unaligned: u64,
}

impl LookupCounters {
    pub fn new() -> Self {
        LookupCounters::default()
    }

    /// Account for one alignment.
    pub fn record(&mut self, outcome: &Outcome) {
        self.alignments += 1;
        match outcome {
            Outcome::Counted(_) => self.counted += 1,
            Outcome::NotCounted => self.not_counted += 1,
            Outcome::Ambiguous => self.ambiguous += 1,
            Outcome::NoFeature => self.no_feature += 1,
            Outcome::MapqTooLow => self.mapq_low += 1,
        }
    }

    /// Sum of the five outcome buckets.
    pub fn total_processed(&self) -> u64 {
        self.counted + self.not_counted + self.ambiguous + self.no_feature + self.mapq_low
    }
}

impl AddAssign for LookupCounters {
    fn add_assign(&mut self, other: Self) {
        self.alignments += other.alignments;
        self.counted += other.counted;
        self.not_counted += other.not_counted;
        self.ambiguous += other.ambiguous;
        self.no_feature += other.no_feature;
        self.mapq_low += other.mapq_low;
        self.unaligned += other.unaligned;
    }
}

impl Add for LookupCounters {
    type Output = LookupCounters;

    fn add(mut self, other: Self) -> Self::Output {
        self += other;
        self
    }
}

impl Display for LookupCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "alignments = {}", self.alignments)?;
        writeln!(f, "alignment counts = {}", self.counted)?;
        writeln!(f, "alignment does not count = {}", self.not_counted)?;
        writeln!(f, "alignment ambiguous = {}", self.ambiguous)?;
        writeln!(f, "alignment has not features = {}", self.no_feature)?;
        writeln!(f, "alignment with mapq too low = {}", self.mapq_low)?;
        if self.unaligned > 0 {
            writeln!(f, "unaligned reads = {}", self.unaligned)?;
        }
        write!(f, "total processed = {}", self.total_processed())
    }
}

///
/// Tallies of a feature-centric run.
///
/// An alignment overlapping several features is seen once per feature, so these counts are
/// per (feature, alignment) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TotalCounts {
    pub total: u64,
    pub features: u64,
    pub no_features: u64,
    pub ambiguous: u64,
    pub low_mapq: u64,
    pub other_strand: u64,
}

impl AddAssign for TotalCounts {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.features += other.features;
        self.no_features += other.no_features;
        self.ambiguous += other.ambiguous;
        self.low_mapq += other.low_mapq;
        self.other_strand += other.other_strand;
    }
}

impl Add for TotalCounts {
    type Output = TotalCounts;

    fn add(mut self, other: Self) -> Self::Output {
        self += other;
        self
    }
}

impl Display for TotalCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total = {}", self.total)?;
        writeln!(f, "features = {}", self.features)?;
        writeln!(f, "no features = {}", self.no_features)?;
        writeln!(f, "ambiguous = {}", self.ambiguous)?;
        writeln!(f, "low mapq = {}", self.low_mapq)?;
        write!(f, "other strand = {}", self.other_strand)
    }
}
