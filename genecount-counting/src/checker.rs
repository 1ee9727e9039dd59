use genecount_core::models::IntervalList;
use genecount_overlaprs::{Classification, CountMode, FeatureIndex, OverlapClassifier};

use crate::source::Alignment;

/// Knobs shared by both counting engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountSettings {
    pub mode: CountMode,
    /// Alignments below this mapping quality are not counted; values below 1 disable the check.
    pub min_mapq: u32,
    /// Count alignments on either strand of a feature.
    pub ignore_orientation: bool,
}

impl Default for CountSettings {
    fn default() -> Self {
        CountSettings {
            mode: CountMode::default(),
            min_mapq: 0,
            ignore_orientation: false,
        }
    }
}

impl CountSettings {
    pub fn passes_mapq(&self, mapping_quality: u8) -> bool {
        self.min_mapq < 1 || u32::from(mapping_quality) >= self.min_mapq
    }

    pub fn strand_matches(&self, feature_reverse: bool, alignment_reverse: bool) -> bool {
        self.ignore_orientation || feature_reverse == alignment_reverse
    }
}

/// What became of one alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Counted for the feature at this position of [`FeatureIndex::features`].
    Counted(usize),
    /// Overlaps several features without being ambiguous for any of them.
    NotCounted,
    Ambiguous,
    NoFeature,
    MapqTooLow,
}

///
/// Decides the [`Outcome`] of alignments against a [`FeatureIndex`].
///
/// Each worker owns one checker; the scratch buffers are reused from one alignment to the
/// next.
pub struct AlignmentChecker<'a> {
    index: &'a FeatureIndex,
    settings: CountSettings,
    classifier: OverlapClassifier,
    ranges: IntervalList,
    candidates: Vec<usize>,
}

impl<'a> AlignmentChecker<'a> {
    pub fn new(index: &'a FeatureIndex, settings: CountSettings) -> Self {
        AlignmentChecker {
            index,
            settings,
            classifier: OverlapClassifier::new(),
            ranges: IntervalList::new(),
            candidates: Vec::new(),
        }
    }

    ///
    /// Classify the alignment against every candidate feature on its strand and fold the
    /// verdicts into one outcome: any ambiguous verdict makes the alignment ambiguous,
    /// exactly one matching feature counts it, several leave it uncounted.
    pub fn check(&mut self, alignment: &Alignment) -> Outcome {
        if !self.settings.passes_mapq(alignment.mapping_quality) {
            return Outcome::MapqTooLow;
        }

        self.ranges.fill_from_cigar(alignment.position, &alignment.cigar);
        if self.ranges.is_empty() {
            return Outcome::NoFeature;
        }

        let start = self.ranges.start();
        let len = self.ranges.end() - start + 1;
        self.index
            .lookup_into(&alignment.reference, start, len, &mut self.candidates);

        let mut counted: Option<usize> = None;
        let mut matches = 0;
        let mut ambiguous = 0;
        let mut considered = 0;
        for &idx in &self.candidates {
            let feature = &self.index.features()[idx];
            if !self
                .settings
                .strand_matches(feature.reverse, alignment.reverse)
            {
                continue;
            }
            considered += 1;

            match self
                .classifier
                .classify(&feature.ranges, &self.ranges, self.settings.mode)
            {
                Classification::Feature => {
                    matches += 1;
                    counted = Some(idx);
                }
                Classification::Ambiguous => ambiguous += 1,
                Classification::NoFeature => {}
            }
        }

        match (ambiguous, considered, matches, counted) {
            (1.., _, _, _) => Outcome::Ambiguous,
            (_, 0, _, _) => Outcome::NoFeature,
            (_, _, 1, Some(idx)) => Outcome::Counted(idx),
            (_, _, 0, _) => Outcome::NoFeature,
            _ => Outcome::NotCounted,
        }
    }
}
