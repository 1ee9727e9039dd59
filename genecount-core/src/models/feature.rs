use super::interval_list::IntervalList;

///
/// A gene model: one id, one reference, one strand and a sorted, disjoint set of ranges.
///
/// Features are assembled once from annotation lines and are read only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub id: String,
    pub chromosome: String,
    pub reverse: bool,
    pub ranges: IntervalList,
}

impl Feature {
    pub fn new(id: String, chromosome: String, reverse: bool, ranges: IntervalList) -> Self {
        Feature {
            id,
            chromosome,
            reverse,
            ranges,
        }
    }

    /// First covered position.
    pub fn start(&self) -> i64 {
        self.ranges.start()
    }

    /// Last covered position (inclusive).
    pub fn end(&self) -> i64 {
        self.ranges.end()
    }

    /// Number of positions between `start()` and `end()`, introns included.
    pub fn span_len(&self) -> i64 {
        match self.ranges.is_empty() {
            true => 0,
            false => self.end() - self.start() + 1,
        }
    }

    pub fn strand(&self) -> char {
        if self.reverse { '-' } else { '+' }
    }
}

/// `-` is the reverse strand; anything else (`+`, `.`) counts as forward.
pub fn is_reverse_strand(strand: &str) -> bool {
    strand.trim() == "-"
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn feature() -> Feature {
        let mut ranges = IntervalList::new();
        ranges.add(100, 50, false);
        ranges.add(300, 20, false);
        Feature::new("g1".to_string(), "chr1".to_string(), true, ranges)
    }

    #[rstest]
    fn test_feature_span(feature: Feature) {
        assert_eq!(feature.start(), 100);
        assert_eq!(feature.end(), 319);
        assert_eq!(feature.span_len(), 220);
        assert_eq!(feature.strand(), '-');
    }

    #[rstest]
    fn test_empty_feature_span() {
        let feature = Feature::new(
            "g".to_string(),
            "chr1".to_string(),
            false,
            IntervalList::new(),
        );
        assert_eq!(feature.span_len(), 0);
    }

    #[rstest]
    #[case("-", true)]
    #[case("+", false)]
    #[case(".", false)]
    fn test_strand(#[case] strand: &str, #[case] expected: bool) {
        assert_eq!(is_reverse_strand(strand), expected);
    }
}
