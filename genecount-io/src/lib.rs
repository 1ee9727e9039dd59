//! # Input/Output utilities for genecount.
//!
//! This small crate reads and writes everything genecount keeps on disk:
//!
//! - raw GTF annotations ([`GtfReader`]), grouped into multi-range features by
//!   [`FeatureAssembler`];
//! - the preprocessed feature cache (`#preprocessed` header, one feature per line), see
//!   [`CacheReader`] and [`CacheWriter`];
//! - reference name translation tables ([`Translator`]);
//! - per-feature count tables ([`write_count_table`]).
//!
//! [`load_features`] ties the readers together and returns features with their ambiguous
//! segments already marked.
pub mod ambiguity;
pub mod assemble;
pub mod cache;
pub mod consts;
pub mod counts;
pub mod error;
pub mod gtf;
pub mod load;
pub mod translate;

// re-expose core functions
pub use ambiguity::*;
pub use assemble::*;
pub use cache::*;
pub use consts::*;
pub use counts::*;
pub use error::*;
pub use gtf::*;
pub use load::*;
pub use translate::*;
