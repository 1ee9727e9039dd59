//! Binned lookup of features by reference position.
//!
//! Every reference gets its own set of fixed width bins. A feature is registered in each bin its
//! span touches, so a long gene may sit in several bins; lookups therefore deduplicate. Bin
//! membership is only a coarse filter, the exact span test decides what is returned.
//!
//! The index is built once and never mutated afterwards, so any number of workers can share it
//! by reference.
//!
//! # Examples
//!
//! ```
//! use genecount_core::models::{Feature, IntervalList};
//! use genecount_overlaprs::FeatureIndex;
//!
//! let features = vec![
//!     Feature::new("g1".to_string(), "chr1".to_string(), false, IntervalList::from_cigar(100, "100M")),
//!     Feature::new("g2".to_string(), "chr1".to_string(), true, IntervalList::from_cigar(900, "50M")),
//! ];
//!
//! // index "chr1" and make it reachable as "1" as well
//! let references = vec![("chr1".to_string(), vec!["1".to_string()])];
//! let index = FeatureIndex::build_for_references(features, 250, &references);
//!
//! let hits = index.lookup("1", 150, 10);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].id, "g1");
//! ```
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use fxhash::FxHashMap as HashMap;

use genecount_core::models::Feature;

/// Features of one reference, bucketed by `position / bin_size`.
#[derive(Debug, Clone)]
struct ReferenceIndex {
    name: String,
    bins: BTreeMap<i64, Vec<usize>>,
    span_start: i64,
    span_end: i64,
    max_len: i64,
    count: usize,
}

impl ReferenceIndex {
    fn new(name: String) -> Self {
        ReferenceIndex {
            name,
            bins: BTreeMap::new(),
            span_start: i64::MAX,
            span_end: i64::MIN,
            max_len: 0,
            count: 0,
        }
    }

    fn add(&mut self, feature: &Feature, idx: usize, bin_size: i64) {
        let (start, end) = (feature.start(), feature.end());

        let first = start.div_euclid(bin_size);
        let last = end.div_euclid(bin_size);
        for bin in first..=last {
            self.bins.entry(bin).or_default().push(idx);
        }

        self.span_start = self.span_start.min(start);
        self.span_end = self.span_end.max(end);
        self.max_len = self.max_len.max(feature.span_len());
        self.count += 1;
    }
}

/// Per-reference statistics of a [`FeatureIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceReport {
    pub name: String,
    pub bins: usize,
    pub span_start: i64,
    pub span_end: i64,
    pub max_len: i64,
    pub features: usize,
    pub min_per_bin: usize,
    pub max_per_bin: usize,
}

impl Display for ReferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: bins = {}, span = {}..{}, max len = {}, features = {}, per bin = {}..{}",
            self.name,
            self.bins,
            self.span_start,
            self.span_end,
            self.max_len,
            self.features,
            self.min_per_bin,
            self.max_per_bin
        )
    }
}

///
/// Read-only, per-reference binned index over a set of features.
///
/// Features are owned by the index. A reference can be reachable under several names
/// (e.g. `chr1` in the annotation and `1` in the alignments); all names resolve to the same
/// bins.
#[derive(Debug, Clone)]
pub struct FeatureIndex {
    bin_size: i64,
    features: Vec<Feature>,
    names: HashMap<String, usize>,
    references: Vec<ReferenceIndex>,
}

impl FeatureIndex {
    ///
    /// Index every feature under its own chromosome name.
    ///
    /// # Arguments
    /// - features: the features to take ownership of
    /// - bin_size: width of a bin; values below 1 are treated as 1
    pub fn build(features: Vec<Feature>, bin_size: i64) -> Self {
        FeatureIndex::build_inner(features, bin_size, None)
    }

    ///
    /// Index only the features whose chromosome is listed in `references`, registering each
    /// reference under its own name plus the given synonyms. Features on any other chromosome
    /// are dropped.
    pub fn build_for_references(
        features: Vec<Feature>,
        bin_size: i64,
        references: &[(String, Vec<String>)],
    ) -> Self {
        FeatureIndex::build_inner(features, bin_size, Some(references))
    }

    fn build_inner(
        features: Vec<Feature>,
        bin_size: i64,
        references: Option<&[(String, Vec<String>)]>,
    ) -> Self {
        let bin_size = bin_size.max(1);

        let allowed: Option<HashMap<&str, &[String]>> = references.map(|refs| {
            refs.iter()
                .map(|(name, synonyms)| (name.as_str(), synonyms.as_slice()))
                .collect()
        });

        let mut kept: Vec<Feature> = Vec::with_capacity(features.len());
        let mut names: HashMap<String, usize> = HashMap::default();
        let mut indexes: Vec<ReferenceIndex> = Vec::new();

        for feature in features {
            if feature.ranges.is_empty() {
                continue;
            }

            let slot = match names.get(&feature.chromosome) {
                Some(&slot) => slot,
                None => {
                    let synonyms: &[String] = match &allowed {
                        Some(allowed) => match allowed.get(feature.chromosome.as_str()) {
                            Some(synonyms) => synonyms,
                            None => continue,
                        },
                        None => &[],
                    };

                    let slot = indexes.len();
                    indexes.push(ReferenceIndex::new(feature.chromosome.clone()));
                    names.insert(feature.chromosome.clone(), slot);
                    for synonym in synonyms {
                        names.entry(synonym.clone()).or_insert(slot);
                    }
                    slot
                }
            };

            let idx = kept.len();
            indexes[slot].add(&feature, idx, bin_size);
            kept.push(feature);
        }

        FeatureIndex {
            bin_size,
            features: kept,
            names,
            references: indexes,
        }
    }

    pub fn bin_size(&self) -> i64 {
        self.bin_size
    }

    /// All indexed features, in the order they were added.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains_reference(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    ///
    /// Collect the positions (into [`FeatureIndex::features`]) of all features whose span
    /// intersects `[start, start + len - 1]`. `hits` is cleared first and comes back sorted
    /// and free of duplicates. Unknown references yield no hits.
    pub fn lookup_into(&self, reference: &str, start: i64, len: i64, hits: &mut Vec<usize>) {
        hits.clear();

        let Some(&slot) = self.names.get(reference) else {
            return;
        };
        let index = &self.references[slot];

        let end = start + len - 1;
        if end < index.span_start || start > index.span_end {
            return;
        }

        let first = start.div_euclid(self.bin_size);
        let last = end.div_euclid(self.bin_size);
        if first > last {
            return;
        }

        for (_, members) in index.bins.range(first..=last) {
            for &idx in members {
                let feature = &self.features[idx];
                if start <= feature.end() && end >= feature.start() {
                    hits.push(idx);
                }
            }
        }

        hits.sort_unstable();
        hits.dedup();
    }

    /// Features whose span intersects `[start, start + len - 1]` on `reference`.
    pub fn lookup(&self, reference: &str, start: i64, len: i64) -> Vec<&Feature> {
        let mut hits = Vec::new();
        self.lookup_into(reference, start, len, &mut hits);
        hits.into_iter().map(|idx| &self.features[idx]).collect()
    }

    /// Statistics for every indexed reference, in the order they were first seen.
    pub fn report(&self) -> Vec<ReferenceReport> {
        self.references
            .iter()
            .map(|index| {
                let per_bin = index.bins.values().map(|members| members.len());
                ReferenceReport {
                    name: index.name.clone(),
                    bins: index.bins.len(),
                    span_start: index.span_start,
                    span_end: index.span_end,
                    max_len: index.max_len,
                    features: index.count,
                    min_per_bin: per_bin.clone().min().unwrap_or(0),
                    max_per_bin: per_bin.max().unwrap_or(0),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use genecount_core::models::IntervalList;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn feature(id: &str, chrom: &str, start: i64, len: i64) -> Feature {
        let mut ranges = IntervalList::new();
        ranges.add(start, len, false);
        Feature::new(id.to_string(), chrom.to_string(), false, ranges)
    }

    #[fixture]
    fn features() -> Vec<Feature> {
        vec![
            feature("short", "chr1", 100, 50),
            feature("long", "chr1", 50, 1000),
            feature("far", "chr1", 5000, 100),
            feature("other", "chr2", 100, 50),
        ]
    }

    fn ids(hits: Vec<&Feature>) -> Vec<String> {
        let mut ids: Vec<String> = hits.into_iter().map(|f| f.id.clone()).collect();
        ids.sort();
        ids
    }

    #[rstest]
    fn test_lookup_deduplicates_across_bins(features: Vec<Feature>) {
        let index = FeatureIndex::build(features, 100);

        // "long" sits in bins 0..=10 and the query spans several of them
        let hits = index.lookup("chr1", 0, 1200);
        assert_eq!(ids(hits), vec!["long", "short"]);
    }

    #[rstest]
    #[case(100, 1, vec!["long", "short"])]
    #[case(149, 2, vec!["long", "short"])]
    #[case(150, 10, vec!["long"])]
    #[case(1049, 10, vec!["long"])]
    #[case(1050, 10, vec![])]
    #[case(5099, 100, vec!["far"])]
    #[case(5100, 100, vec![])]
    fn test_lookup_exact_span_test(
        features: Vec<Feature>,
        #[case] start: i64,
        #[case] len: i64,
        #[case] expected: Vec<&str>,
    ) {
        let index = FeatureIndex::build(features, 100);
        assert_eq!(ids(index.lookup("chr1", start, len)), expected);
    }

    #[rstest]
    fn test_lookup_unknown_reference_is_empty(features: Vec<Feature>) {
        let index = FeatureIndex::build(features, 100);
        assert!(index.lookup("chrX", 100, 50).is_empty());
    }

    #[rstest]
    fn test_synonyms_and_filtering(features: Vec<Feature>) {
        let references = vec![("chr1".to_string(), vec!["1".to_string()])];
        let index = FeatureIndex::build_for_references(features, 100, &references);

        assert_eq!(ids(index.lookup("1", 120, 5)), vec!["long", "short"]);
        assert_eq!(ids(index.lookup("chr1", 120, 5)), vec!["long", "short"]);
        assert!(index.lookup("chr2", 100, 50).is_empty());
        assert!(!index.contains_reference("chr2"));
        assert_eq!(index.len(), 3);
    }

    #[rstest]
    fn test_lookup_into_reuses_buffer(features: Vec<Feature>) {
        let index = FeatureIndex::build(features, 100);
        let mut hits = vec![42, 43];

        index.lookup_into("chr1", 5000, 1, &mut hits);
        assert_eq!(hits.len(), 1);
        assert_eq!(index.features()[hits[0]].id, "far");

        index.lookup_into("chr2", 5000, 1, &mut hits);
        assert!(hits.is_empty());
    }

    #[rstest]
    fn test_bin_size_is_clamped(features: Vec<Feature>) {
        let index = FeatureIndex::build(features, 0);
        assert_eq!(index.bin_size(), 1);
        assert_eq!(ids(index.lookup("chr2", 120, 1)), vec!["other"]);
    }

    #[rstest]
    fn test_report(features: Vec<Feature>) {
        let index = FeatureIndex::build(features, 1000);
        let report = index.report();

        assert_eq!(report.len(), 2);
        assert_eq!(
            report[0],
            ReferenceReport {
                name: "chr1".to_string(),
                bins: 3,
                span_start: 50,
                span_end: 5099,
                max_len: 1000,
                features: 3,
                min_per_bin: 1,
                max_per_bin: 2,
            }
        );
        assert!(report[1].to_string().starts_with("chr2: bins = 1"));
    }
}
