//! # Counting alignments per feature
//!
//! This crate ties a [`FeatureIndex`](genecount_overlaprs::FeatureIndex) to an
//! [`AlignmentSource`] and counts, for every feature, the reads that fall on it.
//!
//! Two engines are available:
//! - [`count_alignments`] walks the alignments and decides, per alignment, which single
//!   feature (if any) it counts for.
//! - [`count_by_feature`] walks the features and classifies the alignments overlapping each
//!   of them against that feature alone.
//!
//! Both run sequentially or on a rayon pool. Workers never share mutable state; each builds
//! partial counts that are summed at the end. An indexed BAM is split by reference, other
//! sources by row range (see [`Partition`]).
//!
//! # Examples
//!
//! ```
//! use genecount_core::models::{Feature, IntervalList};
//! use genecount_counting::{CountSettings, InMemorySource, ReferenceName, RunOptions, count_alignments};
//! use genecount_overlaprs::FeatureIndex;
//!
//! let index = FeatureIndex::build(
//!     vec![Feature::new("g1".to_string(), "chr1".to_string(), false, IntervalList::from_cigar(100, "100M"))],
//!     1000,
//! );
//!
//! let mut source = InMemorySource::new(vec![ReferenceName::simple("chr1")]);
//! source.add("chr1", 120, "30M", 60, false);
//! source.add("chr1", 500, "30M", 60, false);
//!
//! let run = count_alignments(&source, &index, CountSettings::default(), &RunOptions::default()).unwrap();
//! assert_eq!(run.counts.get("g1"), Some(1));
//! assert_eq!(run.counters.no_feature, 1);
//! ```
pub mod bam;
pub mod by_feature;
pub mod checker;
pub mod counters;
pub mod errors;
pub mod feature_counts;
pub mod jobs;
pub mod lookup;
pub mod refs;
pub mod source;

pub use self::bam::BamSource;
pub use self::by_feature::count_by_feature;
pub use self::checker::{AlignmentChecker, CountSettings, Outcome};
pub use self::counters::{LookupCounters, TotalCounts};
pub use self::errors::{CountingError, Result};
pub use self::feature_counts::FeatureCounts;
pub use self::jobs::{Job, divide_jobs};
pub use self::lookup::{CountRun, RunOptions, count_alignments};
pub use self::refs::RefComparison;
pub use self::source::{
    Alignment, AlignmentIter, AlignmentSource, InMemorySource, Partition, ReferenceName, Visit,
};
