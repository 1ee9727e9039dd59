use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fxhash::FxHashMap as HashMap;
use log::debug;
use noodles::bam;
use noodles::bgzf;
use noodles::core::Region;
use noodles::sam::alignment::record::cigar::op::Kind;

use crate::errors::{CountingError, Result};
use crate::source::{
    Alignment, AlignmentIter, AlignmentSource, Partition, ReferenceName, Visit, name_lookup,
};

/// Mapping quality reported when a record carries none (255 in the file).
const MISSING_MAPQ: u8 = u8::MAX;

///
/// An [`AlignmentSource`] over a BAM file.
///
/// Every call opens its own reader, so any number of workers can share one source. Row
/// ranges are served by a sequential scan, since BGZF offers no row addressing. Region slices
/// and per-reference reads need a `.bai` index next to the file; with one the source asks to
/// be split by reference, without one it is read in a single pass. Both names of a
/// [`ReferenceName`] are the header name.
#[derive(Debug, Clone)]
pub struct BamSource {
    path: PathBuf,
    references: Vec<ReferenceName>,
    names: Arc<Vec<String>>,
    lookup: HashMap<String, usize>,
    indexed: bool,
}

impl BamSource {
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = bam::io::reader::Builder::default().build_from_path(path)?;
        let header = reader.read_header()?;

        let names: Vec<String> = header
            .reference_sequences()
            .keys()
            .map(|name| name.to_string())
            .collect();
        let references: Vec<ReferenceName> =
            names.iter().map(|name| ReferenceName::simple(name)).collect();
        let indexed = index_path(path).exists();
        debug!(
            "{:?}: {} references, indexed: {}",
            path,
            references.len(),
            indexed
        );

        Ok(BamSource {
            path: path.to_path_buf(),
            lookup: name_lookup(&references),
            references,
            names: Arc::new(names),
            indexed,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    fn reference_idx(&self, reference: &str) -> Result<usize> {
        self.lookup
            .get(reference)
            .copied()
            .ok_or_else(|| CountingError::UnknownReference(reference.to_string()))
    }

    /// Stream the mapped records of `region` through `visit`, numbering them from 1.
    fn query(&self, region: &Region, visit: &mut Visit<'_>) -> Result<()> {
        let mut reader = bam::io::indexed_reader::Builder::default().build_from_path(&self.path)?;
        let header = reader.read_header()?;

        let mut n = 0;
        for record in reader.query(&header, region)? {
            let record = record?;
            if record.flags().is_unmapped() {
                continue;
            }
            n += 1;
            visit(to_alignment(&record, n, &self.names)?)?;
        }
        Ok(())
    }

    fn records(&self) -> Result<BamRecords> {
        let file = File::open(&self.path)?;
        let mut reader = bam::io::reader::Builder::default().build_from_reader(file);
        reader.read_header()?;
        Ok(BamRecords {
            reader,
            record: bam::Record::default(),
        })
    }

    fn scan<F>(&self, mut keep: F) -> Result<u64>
    where
        F: FnMut(&bam::Record) -> bool,
    {
        let mut records = self.records()?;
        let mut count = 0;
        while let Some(record) = records.next_record()? {
            if keep(record) {
                count += 1;
            }
        }
        Ok(count)
    }
}

impl AlignmentSource for BamSource {
    fn references(&self) -> Result<Vec<ReferenceName>> {
        Ok(self.references.clone())
    }

    fn alignment_count(&self) -> Result<u64> {
        self.scan(|record| !record.flags().is_unmapped())
    }

    fn alignment_rows(&self, first: u64, count: u64) -> Result<AlignmentIter<'_>> {
        Ok(Box::new(BamRows {
            records: self.records()?,
            names: Arc::clone(&self.names),
            row: 0,
            first: first.max(1),
            last: first.max(1).saturating_add(count),
        }))
    }

    fn alignment_slice(
        &self,
        reference: &str,
        start: i64,
        len: i64,
        visit: &mut Visit<'_>,
    ) -> Result<()> {
        let idx = self.reference_idx(reference)?;

        let end = start + len - 1;
        let region = format!("{}:{}-{}", self.names[idx], start.max(1), end.max(1));
        let region: Region = region
            .parse()
            .map_err(|e| CountingError::InvalidRegion(format!("{}: {}", region, e)))?;

        self.query(&region, visit)
    }

    fn reference_alignments(&self, reference: &str, visit: &mut Visit<'_>) -> Result<()> {
        let idx = self.reference_idx(reference)?;
        let region = Region::new(self.names[idx].as_str(), ..);
        self.query(&region, visit)
    }

    fn unaligned_count(&self) -> Result<u64> {
        self.scan(|record| record.flags().is_unmapped())
    }

    fn partition(&self) -> Partition {
        match self.indexed {
            true => Partition::References,
            false => Partition::Sequential,
        }
    }
}

/// Where the indexed reader looks for the index: `<file>.bai`.
fn index_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bai");
    PathBuf::from(name)
}

/// Sequential record reader reusing one record buffer.
struct BamRecords {
    reader: bam::io::Reader<bgzf::Reader<File>>,
    record: bam::Record,
}

impl BamRecords {
    fn next_record(&mut self) -> Result<Option<&bam::Record>> {
        match self.reader.read_record(&mut self.record)? {
            0 => Ok(None),
            _ => Ok(Some(&self.record)),
        }
    }
}

/// Aligned records `first..last` by row id.
struct BamRows {
    records: BamRecords,
    names: Arc<Vec<String>>,
    row: u64,
    first: u64,
    last: u64,
}

impl Iterator for BamRows {
    type Item = Result<Alignment>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.row + 1 < self.last {
            let record = match self.records.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            };
            if record.flags().is_unmapped() {
                continue;
            }

            self.row += 1;
            if self.row >= self.first {
                return Some(to_alignment(record, self.row, &self.names));
            }
        }
        None
    }
}

fn to_alignment(record: &bam::Record, id: u64, names: &[String]) -> Result<Alignment> {
    let reference = match record.reference_sequence_id() {
        Some(idx) => {
            let idx = idx?;
            names.get(idx).cloned().ok_or_else(|| {
                CountingError::InvalidRecord(format!("row {}: reference #{} not in header", id, idx))
            })?
        }
        None => {
            return Err(CountingError::InvalidRecord(format!(
                "row {}: no reference",
                id
            )));
        }
    };

    let position = match record.alignment_start() {
        Some(start) => start?.get() as i64,
        None => {
            return Err(CountingError::InvalidRecord(format!(
                "row {}: no alignment start",
                id
            )));
        }
    };

    let mut cigar = String::new();
    for op in record.cigar().iter() {
        let op = op?;
        cigar.push_str(&op.len().to_string());
        cigar.push(kind_char(op.kind()));
    }

    Ok(Alignment {
        id,
        reference,
        position,
        cigar,
        mapping_quality: record
            .mapping_quality()
            .map(|mapq| mapq.get())
            .unwrap_or(MISSING_MAPQ),
        reverse: record.flags().is_reverse_complemented(),
    })
}

fn kind_char(kind: Kind) -> char {
    match kind {
        Kind::Match => 'M',
        Kind::Insertion => 'I',
        Kind::Deletion => 'D',
        Kind::Skip => 'N',
        Kind::SoftClip => 'S',
        Kind::HardClip => 'H',
        Kind::Pad => 'P',
        Kind::SequenceMatch => '=',
        Kind::SequenceMismatch => 'X',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    #[rstest]
    fn test_kind_chars_match_cigar_letters() {
        let cigar: String = [
            Kind::SoftClip,
            Kind::Match,
            Kind::Insertion,
            Kind::Deletion,
            Kind::Skip,
            Kind::SequenceMatch,
            Kind::SequenceMismatch,
            Kind::HardClip,
        ]
        .into_iter()
        .map(kind_char)
        .collect();
        assert_eq!(cigar, "SMIDN=XH");
    }

    #[rstest]
    fn test_index_sits_next_to_the_file() {
        assert_eq!(
            index_path(Path::new("/data/sample.bam")),
            PathBuf::from("/data/sample.bam.bai")
        );
    }

    #[rstest]
    fn test_open_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BamSource::open(&dir.path().join("missing.bam")).is_err());
    }
}
