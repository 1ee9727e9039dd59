//! # Core models for genecount
//!
//! This crate holds the small set of types every other genecount crate speaks in:
//!
//! - [`models::Range`]: a `(start, len, ambiguous)` triple on a reference.
//! - [`models::IntervalList`]: an ordered, mergeable list of ranges that can split itself
//!   where it overlaps another list and replay its boundaries as a stream of events.
//! - [`models::Feature`]: a named, stranded set of disjoint ranges (usually a gene assembled
//!   from its exons).
//!
//! ```rust
//! use genecount_core::models::IntervalList;
//!
//! let ranges = IntervalList::from_cigar(100, "10M2D5M");
//! assert_eq!(ranges.to_string(), "N100.10;N112.5");
//! ```
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::CoreError;
