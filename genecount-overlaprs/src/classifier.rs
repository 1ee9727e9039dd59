//! The event-sweep state machine deciding whether an alignment counts for a feature.
//!
//! Both the feature's ranges and the alignment's ranges are replayed as boundary events
//! (see [`IntervalList::events`]). The two streams are merged by position; boundaries that
//! fall on the same position are fused into one compound [`Event`] so the machine never passes
//! through an artificial intermediate state. Three tallies are kept while walking, counting how
//! often the sweep *enters* a state:
//!
//! - `ali`: alignment only, no gene underneath
//! - `gene_and_ali`: alignment over an unambiguous part of the feature
//! - `amb_and_ali`: alignment over an ambiguous part of the feature
//!
//! [`CountMode`] turns those tallies into a [`Classification`].
//!
//! ```rust
//! use genecount_core::models::IntervalList;
//! use genecount_overlaprs::{Classification, CountMode, OverlapClassifier};
//!
//! let gene = IntervalList::from_cigar(100, "100M");
//! let read = IntervalList::from_cigar(120, "20M");
//!
//! let mut classifier = OverlapClassifier::new();
//! assert_eq!(classifier.classify(&gene, &read, CountMode::Strict), Classification::Feature);
//! ```
use std::fmt::{self, Display};
use std::str::FromStr;

use genecount_core::models::{BoundaryKind, IntervalList, RangeEvent};

use crate::errors::OverlapError;

/// Policy turning the walk tallies into a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CountMode {
    /// Any overlap with the feature counts, ambiguity is ignored.
    Simple,
    /// Ambiguous overlap wins over clean overlap.
    #[default]
    Union,
    /// The alignment must stay inside the feature.
    Strict,
    /// Clean overlap wins over ambiguous overlap.
    NonEmpty,
}

impl FromStr for CountMode {
    type Err = OverlapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SIMPLE" => Ok(CountMode::Simple),
            "UNION" => Ok(CountMode::Union),
            "STRICT" => Ok(CountMode::Strict),
            "NONEMPTY" => Ok(CountMode::NonEmpty),
            _ => Err(OverlapError::InvalidCountMode(s.to_string())),
        }
    }
}

impl Display for CountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CountMode::Simple => "SIMPLE",
            CountMode::Union => "UNION",
            CountMode::Strict => "STRICT",
            CountMode::NonEmpty => "NONEMPTY",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Feature,
    NoFeature,
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Empty,
    Gene,
    AmbiguousGene,
    Alignment,
    GeneAndAlignment,
    AmbiguousGeneAndAlignment,
}

/// A boundary of the alignment, of the gene, or of both at the same position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    StartAli,
    EndAli,
    StartGen,
    EndGen,
    StartGenStartAli,
    StartGenEndAli,
    EndGenStartAli,
    EndGenEndAli,
    StartAmb,
    EndAmb,
    StartAmbStartAli,
    StartAmbEndAli,
    EndAmbStartAli,
    EndAmbEndAli,
}

impl Event {
    fn from_alignment(kind: BoundaryKind) -> Event {
        match kind.is_start() {
            true => Event::StartAli,
            false => Event::EndAli,
        }
    }

    fn from_gene(kind: BoundaryKind) -> Event {
        match kind {
            BoundaryKind::Start => Event::StartGen,
            BoundaryKind::End => Event::EndGen,
            BoundaryKind::StartAmbiguous => Event::StartAmb,
            BoundaryKind::EndAmbiguous => Event::EndAmb,
        }
    }

    fn combine(alignment: BoundaryKind, gene: BoundaryKind) -> Event {
        match (gene, alignment.is_start()) {
            (BoundaryKind::Start, true) => Event::StartGenStartAli,
            (BoundaryKind::Start, false) => Event::StartGenEndAli,
            (BoundaryKind::End, true) => Event::EndGenStartAli,
            (BoundaryKind::End, false) => Event::EndGenEndAli,
            (BoundaryKind::StartAmbiguous, true) => Event::StartAmbStartAli,
            (BoundaryKind::StartAmbiguous, false) => Event::StartAmbEndAli,
            (BoundaryKind::EndAmbiguous, true) => Event::EndAmbStartAli,
            (BoundaryKind::EndAmbiguous, false) => Event::EndAmbEndAli,
        }
    }
}

impl State {
    ///
    /// Next state after `event`. Pairs not listed keep the current state.
    pub fn transition(self, event: Event) -> State {
        use Event::*;
        use State::*;

        match (self, event) {
            (Empty, StartAli | EndGenStartAli | EndAmbStartAli) => Alignment,
            (Empty, StartGen | StartGenEndAli) => Gene,
            (Empty, StartGenStartAli) => GeneAndAlignment,
            (Empty, StartAmb | StartAmbEndAli) => AmbiguousGene,
            (Empty, StartAmbStartAli) => AmbiguousGeneAndAlignment,

            (Gene, StartAli | StartGenStartAli | EndAmbStartAli) => GeneAndAlignment,
            (Gene, EndGen | EndGenEndAli) => Empty,
            (Gene, EndGenStartAli) => Alignment,
            (Gene, StartAmb | StartAmbEndAli) => AmbiguousGene,
            (Gene, StartAmbStartAli) => AmbiguousGeneAndAlignment,

            (AmbiguousGene, StartAli | EndGenStartAli | StartAmbStartAli) => {
                AmbiguousGeneAndAlignment
            }
            (AmbiguousGene, StartGen | StartGenEndAli) => Gene,
            (AmbiguousGene, StartGenStartAli) => GeneAndAlignment,
            (AmbiguousGene, EndAmb) => Empty,
            (AmbiguousGene, EndAmbStartAli) => Alignment,

            (Alignment, EndAli | EndGenEndAli | EndAmbEndAli) => Empty,
            (Alignment, StartGen | StartGenStartAli) => GeneAndAlignment,
            (Alignment, StartGenEndAli) => Gene,
            (Alignment, StartAmb | StartAmbStartAli) => AmbiguousGeneAndAlignment,
            (Alignment, StartAmbEndAli) => AmbiguousGene,

            (GeneAndAlignment, EndAli | StartGenEndAli | EndAmbEndAli) => Gene,
            (GeneAndAlignment, EndGen | EndGenStartAli) => Alignment,
            (GeneAndAlignment, EndGenEndAli) => Empty,
            (GeneAndAlignment, StartAmb | StartAmbStartAli) => AmbiguousGeneAndAlignment,
            (GeneAndAlignment, StartAmbEndAli) => AmbiguousGene,

            (AmbiguousGeneAndAlignment, EndAli | EndGenEndAli | StartAmbEndAli) => AmbiguousGene,
            (AmbiguousGeneAndAlignment, StartGen | StartGenStartAli) => GeneAndAlignment,
            (AmbiguousGeneAndAlignment, StartGenEndAli) => Gene,
            (AmbiguousGeneAndAlignment, EndAmb | EndAmbStartAli) => Alignment,
            (AmbiguousGeneAndAlignment, EndAmbEndAli) => Empty,

            (state, _) => state,
        }
    }
}

///
/// Reusable sweep over one (feature, alignment) pair.
///
/// The classifier holds no reference to its inputs, so a worker keeps one instance and calls
/// [`OverlapClassifier::classify`] for every candidate; each call starts from a clean slate.
#[derive(Debug, Clone)]
pub struct OverlapClassifier {
    state: State,
    ali: u32,
    gene_and_ali: u32,
    amb_and_ali: u32,
}

impl Default for OverlapClassifier {
    fn default() -> Self {
        OverlapClassifier::new()
    }
}

impl OverlapClassifier {
    pub fn new() -> Self {
        OverlapClassifier {
            state: State::Empty,
            ali: 0,
            gene_and_ali: 0,
            amb_and_ali: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = OverlapClassifier::new();
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// `(ali, gene_and_ali, amb_and_ali)` of the last walk.
    pub fn tallies(&self) -> (u32, u32, u32) {
        (self.ali, self.gene_and_ali, self.amb_and_ali)
    }

    /// Walk both event streams, starting from a reset state.
    pub fn walk(&mut self, gene: &IntervalList, alignment: &IntervalList) {
        self.reset();

        let mut gene_events = gene.events().peekable();
        let mut ali_events = alignment.events().peekable();

        loop {
            let event = match (gene_events.peek().copied(), ali_events.peek().copied()) {
                (None, None) => break,
                (Some(g), None) => {
                    gene_events.next();
                    Event::from_gene(g.kind)
                }
                (None, Some(a)) => {
                    ali_events.next();
                    Event::from_alignment(a.kind)
                }
                (Some(g), Some(a)) => next_event(g, a, &mut gene_events, &mut ali_events),
            };
            self.apply(event);
        }
    }

    fn apply(&mut self, event: Event) {
        let next = self.state.transition(event);
        if next != self.state {
            match next {
                State::Alignment => self.ali += 1,
                State::GeneAndAlignment => self.gene_and_ali += 1,
                State::AmbiguousGeneAndAlignment => self.amb_and_ali += 1,
                _ => {}
            }
        }
        self.state = next;
    }

    /// Verdict for the last walk.
    pub fn result(&self, mode: CountMode) -> Classification {
        match mode {
            CountMode::Simple => {
                if self.gene_and_ali + self.amb_and_ali > 0 {
                    Classification::Feature
                } else {
                    Classification::NoFeature
                }
            }
            CountMode::Union => {
                if self.amb_and_ali > 0 {
                    Classification::Ambiguous
                } else if self.gene_and_ali > 0 {
                    Classification::Feature
                } else {
                    Classification::NoFeature
                }
            }
            CountMode::Strict => {
                if self.ali > 0 {
                    Classification::NoFeature
                } else if self.gene_and_ali > 0 {
                    Classification::Feature
                } else if self.amb_and_ali > 0 {
                    Classification::Ambiguous
                } else {
                    Classification::NoFeature
                }
            }
            CountMode::NonEmpty => {
                if self.gene_and_ali > 0 {
                    Classification::Feature
                } else if self.amb_and_ali > 0 {
                    Classification::Ambiguous
                } else {
                    Classification::NoFeature
                }
            }
        }
    }

    pub fn classify(
        &mut self,
        gene: &IntervalList,
        alignment: &IntervalList,
        mode: CountMode,
    ) -> Classification {
        self.walk(gene, alignment);
        self.result(mode)
    }
}

fn next_event<G, A>(
    g: RangeEvent,
    a: RangeEvent,
    gene_events: &mut G,
    ali_events: &mut A,
) -> Event
where
    G: Iterator<Item = RangeEvent>,
    A: Iterator<Item = RangeEvent>,
{
    if g.position < a.position {
        gene_events.next();
        Event::from_gene(g.kind)
    } else if a.position < g.position {
        ali_events.next();
        Event::from_alignment(a.kind)
    } else {
        gene_events.next();
        ali_events.next();
        Event::combine(a.kind, g.kind)
    }
}

///
/// Classify a single pair with a throwaway classifier.
pub fn classify(gene: &IntervalList, alignment: &IntervalList, mode: CountMode) -> Classification {
    OverlapClassifier::new().classify(gene, alignment, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    use genecount_core::models::Range;
    use pretty_assertions::assert_eq;
    use rstest::*;

    use Classification::{Ambiguous as A, Feature as F, NoFeature as NF};

    fn ranges(spec: &[(i64, i64, bool)]) -> IntervalList {
        let mut list = IntervalList::new();
        for &(start, len, amb) in spec {
            list.add(start, len, amb);
        }
        list.merge();
        list
    }

    /// Ranges as a cache line stores them, taken as is.
    fn sections(line: &str) -> IntervalList {
        line.split(';')
            .map(|section| section.parse::<Range>().unwrap())
            .collect()
    }

    #[rstest]
    fn test_touching_plain_and_ambiguous_segments_stay_apart() {
        let gene = ranges(&[(100, 50, false), (150, 50, true)]);
        assert_eq!(gene, sections("N100.50;A150.50"));
    }

    #[rstest]
    // alignment runs from before the gene into its ambiguous half and out again
    #[case("N100.50;A150.50", "N50.120", A, NF, F)]
    #[case("N100.50;A150.50", "N50.100", F, NF, F)]
    #[case("N100.50;A150.50", "N120.50", A, F, F)]
    #[case("N100.50;A150.50", "N160.20", A, A, A)]
    #[case("A100.50;N150.50", "N160.20", F, F, F)]
    #[case("N100.20;A120.20;N140.60", "N110.50", A, F, F)]
    #[case("N100.20;A120.20;N140.60", "N125.10", A, A, A)]
    fn test_classify_cached_feature(
        #[case] gene: &str,
        #[case] alignment: &str,
        #[case] union: Classification,
        #[case] strict: Classification,
        #[case] nonempty: Classification,
    ) {
        let gene = sections(gene);
        let alignment = sections(alignment);
        let mut classifier = OverlapClassifier::new();

        assert_eq!(classifier.classify(&gene, &alignment, CountMode::Union), union);
        assert_eq!(classifier.classify(&gene, &alignment, CountMode::Strict), strict);
        assert_eq!(classifier.classify(&gene, &alignment, CountMode::NonEmpty), nonempty);
    }

    #[rstest]
    // alignment before the gene
    #[case(&[(50, 25, false)], &[(100, 100, false)], NF, NF, NF)]
    // alignment after the gene
    #[case(&[(300, 100, false)], &[(100, 100, false)], NF, NF, NF)]
    // alignment over the gene start
    #[case(&[(50, 100, false)], &[(100, 100, false)], F, NF, F)]
    // alignment covers the whole gene
    #[case(&[(50, 200, false)], &[(100, 100, false)], F, NF, F)]
    // alignment inside the gene
    #[case(&[(120, 20, false)], &[(100, 100, false)], F, F, F)]
    // alignment over the gene end
    #[case(&[(150, 100, false)], &[(100, 100, false)], F, NF, F)]
    #[case(&[(50, 100, false)], &[(100, 100, true)], A, NF, A)]
    #[case(&[(50, 200, false)], &[(100, 100, true)], A, NF, A)]
    #[case(&[(150, 20, false)], &[(100, 100, true)], A, A, A)]
    #[case(&[(150, 100, false)], &[(100, 100, true)], A, NF, A)]
    #[case(&[(50, 100, false)], &[(100, 50, false), (150, 50, true)], F, NF, F)]
    #[case(&[(50, 120, false)], &[(100, 50, false), (150, 50, true)], A, NF, F)]
    #[case(&[(120, 50, false)], &[(100, 50, false), (150, 50, true)], A, F, F)]
    // alignment bridges two exons
    #[case(&[(100, 100, false)], &[(90, 20, false), (190, 20, false)], F, NF, F)]
    // spliced alignment inside two exons
    #[case(&[(100, 20, false), (150, 20, false)], &[(90, 30, false), (150, 50, false)], F, F, F)]
    #[case(&[(100, 50, false)], &[(100, 100, true)], A, A, A)]
    #[case(&[(180, 20, false)], &[(100, 100, true)], A, A, A)]
    #[case(&[(180, 21, false)], &[(100, 100, true)], A, NF, A)]
    #[case(&[(100, 50, false)], &[(100, 50, true)], A, A, A)]
    fn test_classify(
        #[case] alignment: &[(i64, i64, bool)],
        #[case] gene: &[(i64, i64, bool)],
        #[case] union: Classification,
        #[case] strict: Classification,
        #[case] nonempty: Classification,
    ) {
        let alignment = ranges(alignment);
        let gene = ranges(gene);
        let mut classifier = OverlapClassifier::new();

        assert_eq!(classifier.classify(&gene, &alignment, CountMode::Union), union);
        assert_eq!(classifier.classify(&gene, &alignment, CountMode::Strict), strict);
        assert_eq!(classifier.classify(&gene, &alignment, CountMode::NonEmpty), nonempty);
    }

    #[rstest]
    #[case(&[(50, 25, false)], &[(100, 100, false)], NF)]
    #[case(&[(100, 50, false)], &[(100, 100, false)], F)]
    #[case(&[(150, 20, false)], &[(100, 100, true)], F)]
    fn test_classify_simple(
        #[case] alignment: &[(i64, i64, bool)],
        #[case] gene: &[(i64, i64, bool)],
        #[case] expected: Classification,
    ) {
        assert_eq!(
            classify(&ranges(gene), &ranges(alignment), CountMode::Simple),
            expected
        );
    }

    #[rstest]
    fn test_walk_tallies_entries_not_length() {
        let gene = ranges(&[(90, 20, false), (190, 20, false)]);
        let alignment = ranges(&[(100, 100, false)]);

        let mut classifier = OverlapClassifier::new();
        classifier.walk(&gene, &alignment);

        assert_eq!(classifier.tallies(), (1, 2, 0));
        assert_eq!(classifier.state(), State::Empty);
    }

    #[rstest]
    fn test_classifier_is_pure_across_calls() {
        let gene = ranges(&[(100, 100, false)]);
        let inside = ranges(&[(120, 20, false)]);
        let outside = ranges(&[(150, 100, false)]);

        let mut classifier = OverlapClassifier::new();
        let first = classifier.classify(&gene, &inside, CountMode::Strict);
        classifier.classify(&gene, &outside, CountMode::Strict);
        let again = classifier.classify(&gene, &inside, CountMode::Strict);

        assert_eq!(first, again);
        assert_eq!(first, classify(&gene, &inside, CountMode::Strict));
    }

    #[rstest]
    fn test_strict_feature_implies_union_and_nonempty_feature() {
        let gene = ranges(&[(100, 50, false), (200, 50, false)]);
        for start in (60..260).step_by(7) {
            for len in [5, 20, 45, 90] {
                let alignment = ranges(&[(start, len, false)]);
                if classify(&gene, &alignment, CountMode::Strict) == F {
                    assert_eq!(classify(&gene, &alignment, CountMode::Union), F);
                    assert_eq!(classify(&gene, &alignment, CountMode::NonEmpty), F);
                }
            }
        }
    }

    #[rstest]
    fn test_empty_inputs_have_no_feature() {
        let gene = ranges(&[(100, 100, false)]);
        let empty = IntervalList::new();
        for mode in [
            CountMode::Simple,
            CountMode::Union,
            CountMode::Strict,
            CountMode::NonEmpty,
        ] {
            assert_eq!(classify(&gene, &empty, mode), NF);
            assert_eq!(classify(&empty, &gene, mode), NF);
        }
    }

    #[rstest]
    #[case("union", CountMode::Union)]
    #[case("STRICT", CountMode::Strict)]
    #[case("NonEmpty", CountMode::NonEmpty)]
    #[case("simple", CountMode::Simple)]
    fn test_count_mode_from_str(#[case] s: &str, #[case] expected: CountMode) {
        let mode = CountMode::from_str(s).unwrap();
        assert_eq!(mode, expected);
        assert_eq!(CountMode::from_str(&mode.to_string()).unwrap(), mode);
    }

    #[rstest]
    fn test_count_mode_rejects_unknown() {
        assert!(CountMode::from_str("loose").is_err());
    }
}
