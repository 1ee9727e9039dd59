use std::fs::File;
use std::io::{BufRead, BufWriter, Lines, Write};
use std::path::Path;

use genecount_core::models::{Feature, IntervalList, Range, is_reverse_strand};

use crate::consts::{CACHE_COLUMNS, CACHE_HEADER};
use crate::error::{FeatureFileError, Result};

///
/// Render a feature as a cache line: `id<TAB>strand<TAB>chromosome<TAB>A100.25;N125.50`.
pub fn format_cache_line(feature: &Feature) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        feature.id,
        feature.strand(),
        feature.chromosome,
        feature.ranges
    )
}

///
/// Parse a cache line. Sections that do not parse are skipped; a line with fewer than four
/// columns or without a single valid section yields `None`.
pub fn parse_cache_line(line: &str) -> Option<Feature> {
    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() < CACHE_COLUMNS {
        return None;
    }

    let ranges: IntervalList = cols[3]
        .split(';')
        .filter_map(|section| section.parse::<Range>().ok())
        .filter(|range| range.len > 0)
        .collect();
    if ranges.is_empty() {
        return None;
    }

    Some(Feature::new(
        cols[0].trim().to_string(),
        cols[2].trim().to_string(),
        is_reverse_strand(cols[1]),
        ranges,
    ))
}

/// Streams features out of a preprocessed cache.
pub struct CacheReader<R> {
    lines: Lines<R>,
    invalid: usize,
}

impl<R: BufRead> CacheReader<R> {
    pub fn new(reader: R) -> Self {
        CacheReader {
            lines: reader.lines(),
            invalid: 0,
        }
    }

    pub fn invalid_lines(&self) -> usize {
        self.invalid
    }
}

impl<R: BufRead> Iterator for CacheReader<R> {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            match parse_cache_line(&line) {
                Some(feature) => return Some(Ok(feature)),
                None => self.invalid += 1,
            }
        }
    }
}

///
/// Writes features in the cache format.
///
/// With `ids_only` set, only the feature ids are written, one per line and without the
/// header.
pub struct CacheWriter<W: Write> {
    writer: W,
    ids_only: bool,
    written: usize,
    max_ranges: usize,
}

impl<W: Write> CacheWriter<W> {
    pub fn new(mut writer: W, ids_only: bool) -> Result<Self> {
        if !ids_only {
            writeln!(writer, "{}", CACHE_HEADER)?;
        }
        Ok(CacheWriter {
            writer,
            ids_only,
            written: 0,
            max_ranges: 0,
        })
    }

    pub fn write_feature(&mut self, feature: &Feature) -> Result<()> {
        match self.ids_only {
            true => writeln!(self.writer, "{}", feature.id)?,
            false => writeln!(self.writer, "{}", format_cache_line(feature))?,
        }
        self.written += 1;
        self.max_ranges = self.max_ranges.max(feature.ranges.len());
        Ok(())
    }

    /// Number of features written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Largest number of ranges in any feature written so far.
    pub fn max_ranges(&self) -> usize {
        self.max_ranges
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

///
/// Create a cache file (and its parent directories) ready for writing.
///
/// # Arguments
/// - path: the path to the file to dump to
/// - ids_only: write ids instead of full cache lines
pub fn create_cache_file<P: AsRef<Path>>(
    path: P,
    ids_only: bool,
) -> Result<CacheWriter<BufWriter<File>>> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|_| FeatureFileError::ParentDirectoryCreation(format!("{:?}", path)))?;
    }

    let file = File::create(path)?;
    CacheWriter::new(BufWriter::new(file), ids_only)
}
