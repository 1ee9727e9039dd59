pub mod feature;
pub mod interval_list;
pub mod range;

// re-export for cleaner imports
pub use self::feature::{Feature, is_reverse_strand};
pub use self::interval_list::{
    BoundaryKind, CigarOps, Events, IntervalList, RangeEvent, cigar_ops,
};
pub use self::range::Range;
