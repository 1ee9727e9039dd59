use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::{info, warn};
use serde::Serialize;

use genecount_core::models::Feature;
use genecount_counting::{
    AlignmentSource, BamSource, CountRun, FeatureCounts, RefComparison, count_alignments,
    count_by_feature,
};
use genecount_io::{load_features, write_count_table};
use genecount_overlaprs::FeatureIndex;

use crate::config::CountConfig;

pub fn run_count(matches: &ArgMatches) -> Result<()> {
    let config = CountConfig::from_matches(matches)?;
    run_count_with_source(&config, &BamSource::open(config.alignments_path()?)?)
}

///
/// Run a full count: load the features, index them for the references the source knows,
/// count, and write the table (plus the JSON summary when asked for).
pub fn run_count_with_source<S>(config: &CountConfig, source: &S) -> Result<()>
where
    S: AlignmentSource,
{
    let start = Instant::now();
    let settings = config.count_settings()?;
    let options = config.run_options();

    let features = load(config)?;
    let ids: Vec<String> = features.iter().map(|f| f.id.clone()).collect();

    let refs = RefComparison::compare(
        features.iter().map(|f| f.chromosome.as_str()),
        &source.references()?,
    );
    if refs.in_both.is_empty() {
        warn!("no reference is shared by the features and the alignments");
    }
    if !refs.only_in_features.is_empty() {
        info!(
            "{} feature references are not in the alignments",
            refs.only_in_features.len()
        );
    }

    let index = FeatureIndex::build_for_references(features, config.bin_size, &refs.index_references());
    info!(
        "{} features indexed, bin size {}",
        index.len(),
        index.bin_size()
    );
    if config.progress {
        for report in index.report() {
            info!("{}", report);
        }
    }

    info!("counting with mode {}", settings.mode);
    match config.by_feature {
        true => {
            let run = count_by_feature(source, &index, &refs, settings, &options)?;
            write_results(config, &ids, run)?;
        }
        false => {
            let mut run = count_alignments(source, &index, settings, &options)?;
            if config.count_unaligned {
                run.counters.unaligned = source.unaligned_count()?;
            }
            write_results(config, &ids, run)?;
        }
    }

    if config.measure_time {
        info!("done in {:.2?}", start.elapsed());
    }

    Ok(())
}

fn load(config: &CountConfig) -> Result<Vec<Feature>> {
    let translator = config.translator()?;
    load_features(
        config.features_path()?,
        &config.gtf_settings(),
        translator.as_ref(),
        config.prescan,
    )
}

fn write_results<C>(config: &CountConfig, ids: &[String], run: CountRun<C>) -> Result<()>
where
    C: Display + Serialize,
{
    let mut table = FeatureCounts::with_ids(ids.iter().map(String::as_str));
    table.merge(run.counts);

    let output = config.output_path();
    write_count_table(&output, table.iter(), &run.counters)
        .with_context(|| format!("Failed to write counts to {:?}", output))?;
    info!("counts written to {:?}", output);
    if config.progress {
        info!("\n{}", run.counters);
    }

    if let Some(path) = &config.json_summary {
        write_json_summary(path, &run.counters)?;
    }

    Ok(())
}

fn write_json_summary<C: Serialize>(path: &Path, counters: &C) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create summary {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, counters)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use genecount_counting::{InMemorySource, ReferenceName};
    use pretty_assertions::assert_eq;
    use rstest::*;

    const GTF: &str = "\
chr1\tt\texon\t100\t199\t.\t+\t.\tgene_id \"a\";
chr1\tt\texon\t150\t249\t.\t+\t.\tgene_id \"b\";
chr1\tt\texon\t1000\t1099\t.\t+\t.\tgene_id \"c\";
chrM\tt\texon\t1\t100\t.\t+\t.\tgene_id \"m\";
";

    #[fixture]
    fn source() -> InMemorySource {
        let mut source = InMemorySource::new(vec![ReferenceName::new("NC_1", "chr1")]).with_unaligned(7);
        source.add("NC_1", 100, "20M", 60, false);
        source.add("NC_1", 160, "20M", 60, false);
        source.add("NC_1", 1010, "20M", 60, false);
        source.add("NC_1", 1020, "20M", 60, false);
        source
    }

    fn config(dir: &tempfile::TempDir) -> CountConfig {
        let features = dir.path().join("genes.gtf");
        fs::write(&features, GTF).unwrap();
        CountConfig {
            features: Some(features),
            output: Some(dir.path().join("out").join("counts.txt")),
            ..CountConfig::default()
        }
    }

    #[rstest]
    fn test_count_writes_table_and_summary(source: InMemorySource) {
        let dir = tempfile::tempdir().unwrap();
        let config = CountConfig {
            count_unaligned: true,
            json_summary: Some(dir.path().join("summary.json")),
            ..config(&dir)
        };

        run_count_with_source(&config, &source).unwrap();

        let table = fs::read_to_string(config.output_path()).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(&lines[..4], &["a\t1", "b\t0", "c\t2", "m\t0"]);
        assert!(lines.contains(&"alignment ambiguous = 1"));
        assert!(lines.contains(&"unaligned reads = 7"));

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("summary.json")).unwrap())
                .unwrap();
        assert_eq!(summary["counted"], 3);
        assert_eq!(summary["unaligned"], 7);
    }

    #[rstest]
    fn test_count_by_feature(source: InMemorySource) {
        let dir = tempfile::tempdir().unwrap();
        let config = CountConfig {
            by_feature: true,
            threads: 2,
            ..config(&dir)
        };

        run_count_with_source(&config, &source).unwrap();

        let table = fs::read_to_string(config.output_path()).unwrap();
        assert!(table.starts_with("a\t1\nb\t0\nc\t2\nm\t0\n"));
        assert!(table.contains("ambiguous = 2"));
    }
}
