use std::io::{BufRead, Lines};

use log::debug;

use genecount_core::models::is_reverse_strand;

use crate::consts::{DEFAULT_FEATURE_ID, DEFAULT_FEATURE_TYPE, GTF_COLUMNS};
use crate::error::Result;
use crate::translate::Translator;

/// Which GTF lines become segments and where the id comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GtfSettings {
    /// Value of column 3 a line must carry, e.g. `exon`.
    pub feature_type: String,
    /// Attribute key holding the feature id, e.g. `gene_id`.
    pub id_attribute: String,
}

impl Default for GtfSettings {
    fn default() -> Self {
        GtfSettings {
            feature_type: DEFAULT_FEATURE_TYPE.to_string(),
            id_attribute: DEFAULT_FEATURE_ID.to_string(),
        }
    }
}

/// One usable GTF line: a single segment of a feature. `end` is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GtfSegment {
    pub chromosome: String,
    pub start: i64,
    pub end: i64,
    pub reverse: bool,
    pub id: String,
}

impl GtfSegment {
    pub fn len(&self) -> i64 {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }
}

/// The pieces of a GTF line a segment is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GtfField {
    Chromosome,
    Start,
    End,
    Strand,
    Id,
}

type Extractor = fn(&[&str], &GtfSettings, &mut GtfSegment) -> Option<()>;

/// Field extractors, applied in order to every line that passed the type filter.
const EXTRACTORS: [(GtfField, Extractor); 5] = [
    (GtfField::Chromosome, extract_chromosome),
    (GtfField::Start, extract_start),
    (GtfField::End, extract_end),
    (GtfField::Strand, extract_strand),
    (GtfField::Id, extract_id),
];

fn extract_chromosome(cols: &[&str], _: &GtfSettings, seg: &mut GtfSegment) -> Option<()> {
    let chromosome = cols.first()?.trim();
    if chromosome.is_empty() {
        return None;
    }
    seg.chromosome = chromosome.to_string();
    Some(())
}

fn extract_start(cols: &[&str], _: &GtfSettings, seg: &mut GtfSegment) -> Option<()> {
    seg.start = cols.get(3)?.trim().parse().ok()?;
    Some(())
}

fn extract_end(cols: &[&str], _: &GtfSettings, seg: &mut GtfSegment) -> Option<()> {
    seg.end = cols.get(4)?.trim().parse().ok()?;
    Some(())
}

fn extract_strand(cols: &[&str], _: &GtfSettings, seg: &mut GtfSegment) -> Option<()> {
    seg.reverse = is_reverse_strand(cols.get(6)?);
    Some(())
}

fn extract_id(cols: &[&str], settings: &GtfSettings, seg: &mut GtfSegment) -> Option<()> {
    let id = attribute_value(cols.get(8)?, &settings.id_attribute)?;
    seg.id = id.to_string();
    Some(())
}

///
/// Find the value of `key` in a GTF attribute column (`gene_id "g1"; gene_name "abc";`).
/// Quotes are stripped; an empty value counts as missing.
pub fn attribute_value<'a>(attributes: &'a str, key: &str) -> Option<&'a str> {
    attributes.split(';').find_map(|attribute| {
        let (k, v) = attribute
            .trim()
            .split_once(|c: char| c.is_whitespace() || c == '=')?;
        let v = v.trim().trim_matches('"');
        (k == key && !v.is_empty()).then_some(v)
    })
}

///
/// Streams [`GtfSegment`]s out of a GTF file.
///
/// Comment lines are skipped. Lines with fewer than 9 columns, or whose coordinates or id
/// cannot be extracted, are skipped and counted in [`GtfReader::invalid_lines`]. Lines of
/// another feature type are filtered out silently.
pub struct GtfReader<R> {
    lines: Lines<R>,
    settings: GtfSettings,
    translator: Option<Translator>,
    line_no: usize,
    invalid: usize,
}

impl<R: BufRead> GtfReader<R> {
    pub fn new(reader: R, settings: GtfSettings) -> Self {
        GtfReader {
            lines: reader.lines(),
            settings,
            translator: None,
            line_no: 0,
            invalid: 0,
        }
    }

    /// Rename chromosomes on the fly.
    pub fn with_translator(mut self, translator: Option<Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn invalid_lines(&self) -> usize {
        self.invalid
    }

    fn parse_line(&mut self, line: &str) -> Option<GtfSegment> {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < GTF_COLUMNS {
            debug!("line {}: only {} columns", self.line_no, cols.len());
            self.invalid += 1;
            return None;
        }

        if cols[2].trim() != self.settings.feature_type {
            return None;
        }

        let mut segment = GtfSegment::default();
        for (field, extract) in EXTRACTORS.iter() {
            if extract(&cols, &self.settings, &mut segment).is_none() {
                debug!("line {}: cannot extract {:?}", self.line_no, field);
                self.invalid += 1;
                return None;
            }
        }

        if let Some(translator) = &self.translator {
            let translated = translator.translate(&segment.chromosome);
            if translated != segment.chromosome {
                segment.chromosome = translated.to_string();
            }
        }

        Some(segment)
    }
}

impl<R: BufRead> Iterator for GtfReader<R> {
    type Item = Result<GtfSegment>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            if let Some(segment) = self.parse_line(&line) {
                return Some(Ok(segment));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use rstest::*;

    const GTF: &str = "\
#!genome-build test
chr1\tsrc\tgene\t100\t500\t.\t+\t.\tgene_id \"g1\";
chr1\tsrc\texon\t100\t199\t.\t+\t.\tgene_id \"g1\"; transcript_id \"t1\";
chr1\tsrc\texon\t300\t399\t.\t-\t.\ttranscript_id \"t2\"; gene_id \"g2\";
chr1\tsrc\texon\tabc\t399\t.\t-\t.\tgene_id \"g3\";
chr1\tsrc\texon\t100
chr2\tsrc\texon\t10\t20\t.\t+\t.\tgene_name \"x\";
";

    #[rstest]
    fn test_read_segments() {
        let mut reader = GtfReader::new(Cursor::new(GTF), GtfSettings::default());
        let segments: Vec<GtfSegment> = reader.by_ref().map(|s| s.unwrap()).collect();

        assert_eq!(
            segments,
            vec![
                GtfSegment {
                    chromosome: "chr1".to_string(),
                    start: 100,
                    end: 199,
                    reverse: false,
                    id: "g1".to_string(),
                },
                GtfSegment {
                    chromosome: "chr1".to_string(),
                    start: 300,
                    end: 399,
                    reverse: true,
                    id: "g2".to_string(),
                },
            ]
        );
        // bad start, short line, missing id
        assert_eq!(reader.invalid_lines(), 3);
    }

    #[rstest]
    fn test_feature_type_and_id_settings() {
        let settings = GtfSettings {
            feature_type: "gene".to_string(),
            id_attribute: "gene_id".to_string(),
        };
        let segments: Vec<GtfSegment> = GtfReader::new(Cursor::new(GTF), settings)
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 401);
    }

    #[rstest]
    fn test_translated_chromosomes() {
        let translator = Translator::from_reader(Cursor::new("chr1=1\n")).unwrap();
        let segments: Vec<GtfSegment> = GtfReader::new(Cursor::new(GTF), GtfSettings::default())
            .with_translator(Some(translator))
            .map(|s| s.unwrap())
            .collect();
        assert!(segments.iter().all(|s| s.chromosome == "1"));
    }

    #[rstest]
    #[case("gene_id \"g1\"; transcript_id \"t1\";", "gene_id", Some("g1"))]
    #[case("transcript_id \"t1\"; gene_id \"g1\"", "gene_id", Some("g1"))]
    #[case("gene_id=g1;gene_name=abc", "gene_name", Some("abc"))]
    #[case("gene_id \"\";", "gene_id", None)]
    #[case("gene_ids \"g1\";", "gene_id", None)]
    fn test_attribute_value(
        #[case] attributes: &str,
        #[case] key: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(attribute_value(attributes, key), expected);
    }
}
