use std::collections::BTreeSet;
use std::fmt::{self, Display};

use crate::source::ReferenceName;

///
/// How the references of an annotation line up with those of an alignment source.
///
/// A feature reference matches a source reference when it equals either of the source's
/// names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefComparison {
    /// `(feature reference, source reference)` pairs, in feature name order.
    pub in_both: Vec<(String, ReferenceName)>,
    pub only_in_source: Vec<ReferenceName>,
    pub only_in_features: Vec<String>,
}

impl RefComparison {
    pub fn compare<'a, I>(feature_refs: I, source_refs: &[ReferenceName]) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let feature_refs: BTreeSet<&str> = feature_refs.into_iter().collect();

        let mut comparison = RefComparison::default();
        let mut matched: BTreeSet<usize> = BTreeSet::new();
        for name in feature_refs {
            match source_refs.iter().position(|r| r.matches(name)) {
                Some(idx) => {
                    matched.insert(idx);
                    comparison
                        .in_both
                        .push((name.to_string(), source_refs[idx].clone()));
                }
                None => comparison.only_in_features.push(name.to_string()),
            }
        }

        comparison.only_in_source = source_refs
            .iter()
            .enumerate()
            .filter(|(idx, _)| !matched.contains(idx))
            .map(|(_, r)| r.clone())
            .collect();
        comparison
    }

    /// Source reference to query for a feature reference.
    pub fn source_name(&self, feature_ref: &str) -> Option<&str> {
        self.in_both
            .iter()
            .find(|(name, _)| name == feature_ref)
            .map(|(_, r)| r.canonical.as_str())
    }

    ///
    /// References for [`FeatureIndex::build_for_references`](genecount_overlaprs::FeatureIndex::build_for_references):
    /// every shared feature reference with the source's names as synonyms.
    pub fn index_references(&self) -> Vec<(String, Vec<String>)> {
        self.in_both
            .iter()
            .map(|(name, reference)| {
                let synonyms: Vec<String> = [&reference.canonical, &reference.common]
                    .into_iter()
                    .filter(|synonym| *synonym != name)
                    .cloned()
                    .collect::<BTreeSet<String>>()
                    .into_iter()
                    .collect();
                (name.clone(), synonyms)
            })
            .collect()
    }
}

impl Display for RefComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .in_both
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);
        let rule = "-".repeat(40);

        writeln!(f, "in both ({}):", self.in_both.len())?;
        for (name, reference) in &self.in_both {
            write!(f, "  {:>width$} = {}", name, reference.canonical, width = width)?;
            if reference.common != reference.canonical {
                write!(f, " ({})", reference.common)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{}", rule)?;
        writeln!(f, "only in alignments ({}):", self.only_in_source.len())?;
        for reference in &self.only_in_source {
            writeln!(f, "  {} ({})", reference.canonical, reference.common)?;
        }

        writeln!(f, "{}", rule)?;
        write!(f, "only in features ({}):", self.only_in_features.len())?;
        for name in &self.only_in_features {
            write!(f, "\n  {}", name)?;
        }
        Ok(())
    }
}
