//! Overlap classification for genecount.
//!
//! Two pieces live here. [`FeatureIndex`] answers "which features could this alignment touch"
//! with a coarse, binned lookup per reference. [`OverlapClassifier`] then decides, for every
//! candidate, whether the alignment belongs to the feature, misses it, or lands on an ambiguous
//! part of it.
//!
//! All overlap logic should live here. The counting engines wrap it for their specific
//! traversal orders but should not reimplement it.
//!
//! ```rust
//! use genecount_core::models::{Feature, IntervalList};
//! use genecount_overlaprs::{Classification, CountMode, FeatureIndex, OverlapClassifier};
//!
//! let exons = IntervalList::from_cigar(1000, "200M300N100M");
//! let gene = Feature::new("BRCA1".to_string(), "chr17".to_string(), false, exons);
//! let index = FeatureIndex::build(vec![gene], 500_000);
//!
//! let read = IntervalList::from_cigar(1050, "50M");
//! let candidates = index.lookup("chr17", 1050, 50);
//! assert_eq!(candidates.len(), 1);
//!
//! let mut classifier = OverlapClassifier::new();
//! let verdict = classifier.classify(&candidates[0].ranges, &read, CountMode::Union);
//! assert_eq!(verdict, Classification::Feature);
//! ```

/// Event-sweep classification of one feature against one alignment.
///
/// See [`OverlapClassifier`] for details.
pub mod classifier;

/// Errors raised while configuring classification.
pub mod errors;

/// Per-reference binned feature index.
///
/// See [`FeatureIndex`] for details.
pub mod feature_index;

// re-exports
pub use self::classifier::{Classification, CountMode, OverlapClassifier, classify};
pub use self::errors::OverlapError;
pub use self::feature_index::{FeatureIndex, ReferenceReport};

/// Constants used throughout the crate.
pub mod consts {
    /// Default width of a feature index bin.
    pub const DEFAULT_BIN_SIZE: i64 = 500_000;
}
