use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use rstest::*;

use genecount_core::models::Feature;
use genecount_counting::{
    AlignmentSource, CountSettings, FeatureCounts, InMemorySource, LookupCounters, RefComparison,
    ReferenceName, RunOptions, TotalCounts, count_alignments, count_by_feature,
};
use genecount_io::{GtfSettings, load_features, write_count_table};
use genecount_overlaprs::FeatureIndex;

#[fixture]
fn path_to_gtf() -> &'static str {
    "tests/data/genes.gtf"
}

#[fixture]
fn path_to_alignments() -> &'static str {
    "tests/data/alignments.tsv"
}

#[fixture]
fn features(path_to_gtf: &str) -> Vec<Feature> {
    load_features(Path::new(path_to_gtf), &GtfSettings::default(), None, true).unwrap()
}

#[fixture]
fn source(path_to_alignments: &str) -> InMemorySource {
    let mut source = InMemorySource::new(vec![
        ReferenceName::simple("chr1"),
        ReferenceName::simple("chr2"),
        ReferenceName::simple("chrUn"),
    ]);

    let content = fs::read_to_string(path_to_alignments).unwrap();
    for line in content.lines().filter(|l| !l.starts_with('#')) {
        let cols: Vec<&str> = line.split('\t').collect();
        source.add(
            cols[0],
            cols[1].parse().unwrap(),
            cols[2],
            cols[3].parse().unwrap(),
            cols[4] == "-",
        );
    }
    source
}

fn build_index(features: &[Feature], source: &InMemorySource) -> (RefComparison, FeatureIndex) {
    let refs = RefComparison::compare(
        features.iter().map(|f| f.chromosome.as_str()),
        &source.references().unwrap(),
    );
    let index = FeatureIndex::build_for_references(features.to_vec(), 1000, &refs.index_references());
    (refs, index)
}

fn table(features: &[Feature], counts: FeatureCounts) -> Vec<(String, u64)> {
    let mut table = FeatureCounts::with_ids(features.iter().map(|f| f.id.as_str()));
    table.merge(counts);
    table.iter().map(|(id, n)| (id.to_string(), n)).collect()
}

fn expected_table() -> Vec<(String, u64)> {
    [("geneA", 2), ("geneB", 1), ("geneC", 0), ("geneD", 1), ("geneM", 0)]
        .into_iter()
        .map(|(id, n)| (id.to_string(), n))
        .collect()
}

mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[rstest]
    fn test_features_are_marked_ambiguous(features: Vec<Feature>) {
        let rendered: Vec<String> = features
            .iter()
            .map(|f| format!("{} {}", f.id, f.ranges))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "geneA N100.100;N300.50;A350.50",
                "geneB A350.50;N400.50",
                "geneC N1000.100",
                "geneD N50.100",
                "geneM N1.100",
            ]
        );
    }

    #[rstest]
    fn test_references(features: Vec<Feature>, source: InMemorySource) {
        let (refs, index) = build_index(&features, &source);

        assert_eq!(refs.only_in_features, vec!["chrM".to_string()]);
        assert_eq!(refs.only_in_source, vec![ReferenceName::simple("chrUn")]);
        assert!(!index.contains_reference("chrM"));
        assert_eq!(index.len(), 4);
    }

    #[rstest]
    #[case(1, 8)]
    #[case(3, 2)]
    fn test_count_alignments(
        features: Vec<Feature>,
        source: InMemorySource,
        #[case] threads: usize,
        #[case] slices: usize,
    ) {
        let (_, index) = build_index(&features, &source);
        let settings = CountSettings {
            min_mapq: 10,
            ..CountSettings::default()
        };
        let options = RunOptions {
            threads,
            slices,
            progress: false,
        };

        let run = count_alignments(&source, &index, settings, &options).unwrap();
        assert_eq!(
            run.counters,
            LookupCounters {
                alignments: 8,
                counted: 4,
                not_counted: 0,
                ambiguous: 1,
                no_feature: 2,
                mapq_low: 1,
                unaligned: 0,
            }
        );
        assert_eq!(table(&features, run.counts), expected_table());
    }

    #[rstest]
    fn test_count_by_feature(features: Vec<Feature>, source: InMemorySource) {
        let (refs, index) = build_index(&features, &source);
        let settings = CountSettings {
            min_mapq: 10,
            ..CountSettings::default()
        };

        let run = count_by_feature(&source, &index, &refs, settings, &RunOptions::default()).unwrap();
        assert_eq!(
            run.counters,
            TotalCounts {
                total: 8,
                features: 4,
                no_features: 0,
                ambiguous: 1,
                low_mapq: 1,
                other_strand: 2,
            }
        );
        assert_eq!(table(&features, run.counts), expected_table());
    }

    #[rstest]
    fn test_write_count_table(features: Vec<Feature>, source: InMemorySource) {
        let (_, index) = build_index(&features, &source);
        let mut run = count_alignments(&source, &index, CountSettings::default(), &RunOptions::default())
            .unwrap();
        run.counters.unaligned = 2;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("counts.txt");
        let mut table = FeatureCounts::with_ids(features.iter().map(|f| f.id.as_str()));
        table.merge(run.counts);
        write_count_table(&path, table.iter(), &run.counters).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "geneA\t2");
        assert_eq!(lines[2], "geneC\t1");
        assert_eq!(lines[4], "geneM\t0");
        assert_eq!(lines[5], "alignments = 8");
        assert!(lines.contains(&"unaligned reads = 2"));
        assert_eq!(lines.last(), Some(&"total processed = 8"));
    }
}
