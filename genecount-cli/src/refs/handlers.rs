use anyhow::Result;
use clap::ArgMatches;

use genecount_counting::{AlignmentSource, BamSource, RefComparison};
use genecount_io::process_feature_file;

use crate::config::CountConfig;

pub fn run_refs(matches: &ArgMatches) -> Result<()> {
    let config = CountConfig::from_matches(matches)?;
    let refs = compare_references(&config)?;

    println!("{}", refs);

    Ok(())
}

/// Read the feature chromosomes and match them against the alignment file's references.
pub fn compare_references(config: &CountConfig) -> Result<RefComparison> {
    let translator = config.translator()?;

    let mut chromosomes: Vec<String> = Vec::new();
    process_feature_file(
        config.features_path()?,
        &config.gtf_settings(),
        translator.as_ref(),
        config.prescan,
        |feature| {
            if chromosomes.last() != Some(&feature.chromosome) {
                chromosomes.push(feature.chromosome.clone());
            }
            Ok(())
        },
    )?;

    let source = BamSource::open(config.alignments_path()?)?;
    Ok(RefComparison::compare(
        chromosomes.iter().map(String::as_str),
        &source.references()?,
    ))
}
