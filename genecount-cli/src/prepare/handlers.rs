use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use genecount_io::{create_cache_file, process_feature_file};

use crate::config::CountConfig;

pub fn run_prepare(matches: &ArgMatches) -> Result<()> {
    let config = CountConfig::from_matches(matches)?;
    let features = config.features_path()?;
    let output = matches
        .get_one::<String>("output")
        .context("A path to the output file is required.")?;
    let ids_only = matches.get_flag("ids-only");
    let reference = matches.get_one::<String>("reference");

    let translator = config.translator()?;
    let mut writer = create_cache_file(Path::new(output), ids_only)?;

    let read = process_feature_file(
        features,
        &config.gtf_settings(),
        translator.as_ref(),
        config.prescan,
        |feature| {
            if reference.is_some_and(|r| *r != feature.chromosome) {
                return Ok(());
            }
            writer.write_feature(feature)
        },
    )?;

    info!(
        "{} of {} features written to {}, at most {} ranges per feature",
        writer.written(),
        read,
        output,
        writer.max_ranges()
    );
    writer.finish()?;

    Ok(())
}
