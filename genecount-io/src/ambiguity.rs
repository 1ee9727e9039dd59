use std::collections::BTreeMap;

use genecount_core::models::Feature;

use crate::error::Result;

///
/// Sliding window marking the parts of features that overlap other features as ambiguous.
///
/// Features of one chromosome are pushed in start order. A feature is held back until no
/// later feature can overlap it any more (the next start lies past its end) and every feature
/// that started before it has been reported. It is then checked
/// against every feature still held back and every feature reported before it that may reach
/// into it, regardless of strand, and handed to the caller.
#[derive(Debug, Default)]
pub struct AmbiguityWindow {
    to_report: Vec<Feature>,
    reported: Vec<Feature>,
}

impl AmbiguityWindow {
    pub fn new() -> Self {
        AmbiguityWindow::default()
    }

    pub fn push<F>(&mut self, feature: Feature, emit: &mut F) -> Result<()>
    where
        F: FnMut(&Feature) -> Result<()>,
    {
        let start = feature.start();

        // flush from the head only, so features are reported in start order
        while self.to_report.first().is_some_and(|f| f.end() < start) {
            let done = self.to_report.remove(0);
            self.report(done, emit)?;
        }

        self.to_report.push(feature);
        Ok(())
    }

    /// Report everything still held back and forget the chromosome.
    pub fn finish<F>(&mut self, emit: &mut F) -> Result<()>
    where
        F: FnMut(&Feature) -> Result<()>,
    {
        while !self.to_report.is_empty() {
            let done = self.to_report.remove(0);
            self.report(done, emit)?;
        }
        self.reported.clear();
        Ok(())
    }

    fn report<F>(&mut self, mut feature: Feature, emit: &mut F) -> Result<()>
    where
        F: FnMut(&Feature) -> Result<()>,
    {
        for other in self.reported.iter().chain(self.to_report.iter()) {
            feature.ranges.detect_amb(&other.ranges);
        }

        let start = feature.start();
        self.reported.retain(|r| r.end() >= start);

        emit(&feature)?;
        self.reported.push(feature);
        Ok(())
    }
}

///
/// Run features through an [`AmbiguityWindow`] per chromosome and hand each finished feature
/// to `emit`. Returns the number of features processed.
///
/// Chromosomes flagged sorted in `sorted` (see [`prescan`](crate::assemble::prescan)) are
/// streamed; all others, or all chromosomes when `sorted` is `None`, are buffered and sorted
/// by start first. Buffered chromosomes are emitted after the streamed ones.
pub fn mark_ambiguous<I, F>(
    features: I,
    sorted: Option<&BTreeMap<String, bool>>,
    mut emit: F,
) -> Result<usize>
where
    I: Iterator<Item = Result<Feature>>,
    F: FnMut(&Feature) -> Result<()>,
{
    let mut window = AmbiguityWindow::new();
    let mut buffered: BTreeMap<String, Vec<Feature>> = BTreeMap::new();
    let mut current: Option<String> = None;
    let mut count = 0;

    for feature in features {
        let feature = feature?;
        count += 1;

        let streamed = sorted
            .and_then(|s| s.get(&feature.chromosome))
            .copied()
            .unwrap_or(false);
        if !streamed {
            buffered
                .entry(feature.chromosome.clone())
                .or_default()
                .push(feature);
            continue;
        }

        if current.as_deref() != Some(feature.chromosome.as_str()) {
            window.finish(&mut emit)?;
            current = Some(feature.chromosome.clone());
        }
        window.push(feature, &mut emit)?;
    }
    window.finish(&mut emit)?;

    for (_, mut group) in buffered {
        group.sort_by_key(|f| f.start());
        for feature in group {
            window.push(feature, &mut emit)?;
        }
        window.finish(&mut emit)?;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    use genecount_core::models::IntervalList;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn feature(id: &str, chrom: &str, ranges: &[(i64, i64)]) -> Feature {
        let mut list = IntervalList::new();
        for &(start, len) in ranges {
            list.add(start, len, false);
        }
        list.merge();
        Feature::new(id.to_string(), chrom.to_string(), id.ends_with('r'), list)
    }

    fn run(features: Vec<Feature>, sorted: Option<&BTreeMap<String, bool>>) -> Vec<(String, String)> {
        let mut out = Vec::new();
        mark_ambiguous(features.into_iter().map(Ok), sorted, |f| {
            out.push((f.id.clone(), f.ranges.to_string()));
            Ok(())
        })
        .unwrap();
        out.sort();
        out
    }

    #[fixture]
    fn features() -> Vec<Feature> {
        vec![
            feature("a", "chr1", &[(100, 100), (400, 100)]),
            feature("br", "chr1", &[(150, 100)]),
            feature("c", "chr1", &[(1000, 10)]),
            feature("d", "chr2", &[(100, 100)]),
        ]
    }

    fn expected() -> Vec<(String, String)> {
        vec![
            ("a".to_string(), "N100.50;A150.50;N400.100".to_string()),
            ("br".to_string(), "A150.50;N200.50".to_string()),
            ("c".to_string(), "N1000.10".to_string()),
            ("d".to_string(), "N100.100".to_string()),
        ]
    }

    #[rstest]
    fn test_mark_ambiguous_buffered(features: Vec<Feature>) {
        assert_eq!(run(features, None), expected());
    }

    #[rstest]
    fn test_mark_ambiguous_streamed(features: Vec<Feature>) {
        let sorted = BTreeMap::from([("chr1".to_string(), true), ("chr2".to_string(), true)]);
        assert_eq!(run(features, Some(&sorted)), expected());
    }

    #[rstest]
    fn test_unsorted_input_is_sorted_before_the_window(mut features: Vec<Feature>) {
        features.reverse();
        let sorted = BTreeMap::from([("chr1".to_string(), false), ("chr2".to_string(), true)]);
        assert_eq!(run(features, Some(&sorted)), expected());
    }

    #[rstest]
    fn test_feature_inside_a_long_feature() {
        let features = vec![
            feature("long", "chr1", &[(100, 1000)]),
            feature("x", "chr1", &[(200, 10)]),
            feature("y", "chr1", &[(900, 10)]),
        ];
        assert_eq!(
            run(features, None),
            vec![
                (
                    "long".to_string(),
                    "N100.100;A200.10;N210.690;A900.10;N910.190".to_string()
                ),
                ("x".to_string(), "A200.10".to_string()),
                ("y".to_string(), "A900.10".to_string()),
            ]
        );
    }

    #[rstest]
    fn test_short_features_wait_for_an_earlier_long_one() {
        let features = vec![
            feature("a", "chr1", &[(100, 1001)]),
            feature("x", "chr1", &[(150, 31)]),
            feature("b", "chr1", &[(200, 11)]),
            feature("c", "chr1", &[(900, 11)]),
            feature("d", "chr1", &[(1200, 10)]),
        ];
        let sorted = BTreeMap::from([("chr1".to_string(), true)]);
        assert_eq!(
            run(features, Some(&sorted)),
            vec![
                (
                    "a".to_string(),
                    "N100.50;A150.31;N181.19;A200.11;N211.689;A900.11;N911.190".to_string()
                ),
                ("b".to_string(), "A200.11".to_string()),
                ("c".to_string(), "A900.11".to_string()),
                ("d".to_string(), "N1200.10".to_string()),
                ("x".to_string(), "A150.31".to_string()),
            ]
        );
    }

    #[rstest]
    fn test_window_reports_in_order() {
        let mut window = AmbiguityWindow::new();
        let mut seen = Vec::new();
        let mut emit = |f: &Feature| {
            seen.push(f.id.clone());
            Ok(())
        };

        window.push(feature("a", "chr1", &[(100, 10)]), &mut emit).unwrap();
        window.push(feature("b", "chr1", &[(105, 10)]), &mut emit).unwrap();
        window.push(feature("c", "chr1", &[(500, 10)]), &mut emit).unwrap();
        window.finish(&mut emit).unwrap();

        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[rstest]
    fn test_window_holds_short_features_behind_a_long_one() {
        let mut window = AmbiguityWindow::new();
        let mut seen = Vec::new();
        let mut emit = |f: &Feature| {
            seen.push(f.id.clone());
            Ok(())
        };

        window.push(feature("long", "chr1", &[(100, 1000)]), &mut emit).unwrap();
        window.push(feature("x", "chr1", &[(150, 10)]), &mut emit).unwrap();
        window.push(feature("y", "chr1", &[(300, 10)]), &mut emit).unwrap();
        window.push(feature("z", "chr1", &[(2000, 10)]), &mut emit).unwrap();
        window.finish(&mut emit).unwrap();

        assert_eq!(seen, vec!["long", "x", "y", "z"]);
    }
}
