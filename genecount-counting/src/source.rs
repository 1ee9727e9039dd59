use fxhash::FxHashMap as HashMap;
use genecount_core::models::cigar_ops;

use crate::errors::{CountingError, Result};

/// One aligned read as the counting engines see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Row id within the source, starting at 1.
    pub id: u64,
    pub reference: String,
    /// 1-based position of the first aligned reference base.
    pub position: i64,
    pub cigar: String,
    pub mapping_quality: u8,
    pub reverse: bool,
}

/// A reference as an alignment source names it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceName {
    /// The name used to query the source.
    pub canonical: String,
    /// The name annotations usually use, e.g. `chr1` for canonical `NC_000001.11`.
    pub common: String,
}

impl ReferenceName {
    pub fn new(canonical: &str, common: &str) -> Self {
        ReferenceName {
            canonical: canonical.to_string(),
            common: common.to_string(),
        }
    }

    /// A reference known under a single name.
    pub fn simple(name: &str) -> Self {
        ReferenceName::new(name, name)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.canonical == name || self.common == name
    }
}

pub type AlignmentIter<'a> = Box<dyn Iterator<Item = Result<Alignment>> + 'a>;

/// Receives alignments one at a time; an error stops the read.
pub type Visit<'a> = dyn FnMut(Alignment) -> Result<()> + 'a;

/// How the alignment-centric engine should split a source into parallel jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Partition {
    /// Contiguous row ranges; the source can jump to any row cheaply.
    #[default]
    Rows,
    /// One job per reference, read with [`AlignmentSource::reference_alignments`].
    References,
    /// A single job; the source can only be read front to back.
    Sequential,
}

///
/// A place alignments can be read from.
///
/// Sources are shared by all workers of a run, so every method takes `&self` and opens
/// whatever per-call state it needs.
pub trait AlignmentSource: Sync {
    /// All references of the source, in source order.
    fn references(&self) -> Result<Vec<ReferenceName>>;

    /// Number of aligned reads.
    fn alignment_count(&self) -> Result<u64>;

    /// Aligned reads `first..first + count`, by row id (the first row is 1).
    fn alignment_rows(&self, first: u64, count: u64) -> Result<AlignmentIter<'_>>;

    ///
    /// Hand every aligned read on `reference` overlapping `[start, start + len - 1]` to
    /// `visit`. `reference` may be either name of a [`ReferenceName`]; unknown names are an
    /// error.
    fn alignment_slice(
        &self,
        reference: &str,
        start: i64,
        len: i64,
        visit: &mut Visit<'_>,
    ) -> Result<()>;

    /// Hand every aligned read on `reference` to `visit`.
    fn reference_alignments(&self, reference: &str, visit: &mut Visit<'_>) -> Result<()>;

    /// Number of reads without an alignment.
    fn unaligned_count(&self) -> Result<u64>;

    fn partition(&self) -> Partition {
        Partition::Rows
    }
}

///
/// An [`AlignmentSource`] backed by a vector, mostly for tests and small inputs.
///
/// Row ids are assigned in push order. `alignment_slice` finds reads by the span their CIGAR
/// covers on the reference.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    references: Vec<ReferenceName>,
    alignments: Vec<Alignment>,
    unaligned: u64,
    partition: Partition,
}

impl InMemorySource {
    pub fn new(references: Vec<ReferenceName>) -> Self {
        InMemorySource {
            references,
            alignments: Vec::new(),
            unaligned: 0,
            partition: Partition::Rows,
        }
    }

    pub fn with_unaligned(mut self, unaligned: u64) -> Self {
        self.unaligned = unaligned;
        self
    }

    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = partition;
        self
    }

    /// Append an alignment, overwriting its id with the next row id.
    pub fn push(&mut self, mut alignment: Alignment) {
        alignment.id = self.alignments.len() as u64 + 1;
        self.alignments.push(alignment);
    }

    /// Append an alignment given as its parts.
    pub fn add(&mut self, reference: &str, position: i64, cigar: &str, mapq: u8, reverse: bool) {
        self.push(Alignment {
            id: 0,
            reference: reference.to_string(),
            position,
            cigar: cigar.to_string(),
            mapping_quality: mapq,
            reverse,
        });
    }

    fn resolve(&self, name: &str) -> Result<&ReferenceName> {
        self.references
            .iter()
            .find(|r| r.matches(name))
            .ok_or_else(|| CountingError::UnknownReference(name.to_string()))
    }
}

impl AlignmentSource for InMemorySource {
    fn references(&self) -> Result<Vec<ReferenceName>> {
        Ok(self.references.clone())
    }

    fn alignment_count(&self) -> Result<u64> {
        Ok(self.alignments.len() as u64)
    }

    fn alignment_rows(&self, first: u64, count: u64) -> Result<AlignmentIter<'_>> {
        let skip = first.saturating_sub(1) as usize;
        let rows = self
            .alignments
            .iter()
            .skip(skip)
            .take(count as usize)
            .cloned()
            .map(Ok);
        Ok(Box::new(rows))
    }

    fn alignment_slice(
        &self,
        reference: &str,
        start: i64,
        len: i64,
        visit: &mut Visit<'_>,
    ) -> Result<()> {
        let reference = self.resolve(reference)?;
        let end = start + len - 1;

        for alignment in self.alignments.iter().filter(|a| {
            reference.matches(&a.reference)
                && a.position <= end
                && a.position + reference_span(&a.cigar) - 1 >= start
        }) {
            visit(alignment.clone())?;
        }
        Ok(())
    }

    fn reference_alignments(&self, reference: &str, visit: &mut Visit<'_>) -> Result<()> {
        let reference = self.resolve(reference)?;
        for alignment in self.alignments.iter().filter(|a| reference.matches(&a.reference)) {
            visit(alignment.clone())?;
        }
        Ok(())
    }

    fn unaligned_count(&self) -> Result<u64> {
        Ok(self.unaligned)
    }

    fn partition(&self) -> Partition {
        self.partition
    }
}

/// Number of reference bases a CIGAR string covers, deletions and skips included.
pub fn reference_span(cigar: &str) -> i64 {
    cigar_ops(cigar)
        .filter(|(op, _)| matches!(op, 'M' | '=' | 'X' | 'D' | 'N'))
        .fold(0i64, |span, (_, len)| span.saturating_add(len))
}

/// Index reference names for quick resolution by either name.
pub(crate) fn name_lookup(references: &[ReferenceName]) -> HashMap<String, usize> {
    let mut names: HashMap<String, usize> = HashMap::default();
    for (idx, reference) in references.iter().enumerate() {
        names.entry(reference.canonical.clone()).or_insert(idx);
        names.entry(reference.common.clone()).or_insert(idx);
    }
    names
}
