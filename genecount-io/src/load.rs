use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use log::{info, warn};

use genecount_core::models::Feature;
use genecount_core::utils::{first_line_of, get_dynamic_reader};

use crate::ambiguity::mark_ambiguous;
use crate::assemble::{FeatureAssembler, prescan};
use crate::cache::CacheReader;
use crate::consts::CACHE_HEADER;
use crate::error::FeatureFileError;
use crate::gtf::{GtfReader, GtfSettings};
use crate::translate::Translator;

/// A preprocessed cache starts with the `#preprocessed` line; anything else is read as GTF.
pub fn is_cache_file(path: &Path) -> Result<bool> {
    Ok(first_line_of(path)? == CACHE_HEADER)
}

///
/// Read a GTF file once and report, per chromosome, whether its features arrive sorted.
pub fn prescan_file(
    path: &Path,
    settings: &GtfSettings,
    translator: Option<&Translator>,
) -> Result<BTreeMap<String, bool>> {
    let reader = GtfReader::new(get_dynamic_reader(path)?, settings.clone())
        .with_translator(translator.cloned());
    let sorted = prescan(FeatureAssembler::new(reader))?;

    let unsorted = sorted.values().filter(|s| !**s).count();
    info!(
        "prescan: {} chromosomes, {} need sorting",
        sorted.len(),
        unsorted
    );

    Ok(sorted)
}

///
/// Stream every feature of a feature file to `emit`, ambiguous segments marked.
///
/// Preprocessed caches are passed through as they are. GTF files are assembled and run
/// through the ambiguity window; with `use_prescan` the file is read twice so that sorted
/// chromosomes can be streamed instead of buffered.
///
/// # Arguments
/// - path: GTF (optionally gzip'd) or preprocessed cache
/// - settings: feature type and id attribute to use for GTF input
/// - translator: optional chromosome renaming applied to GTF input
/// - use_prescan: scan the GTF for sort order first
/// - emit: receives every finished feature
pub fn process_feature_file<F>(
    path: &Path,
    settings: &GtfSettings,
    translator: Option<&Translator>,
    use_prescan: bool,
    mut emit: F,
) -> Result<usize>
where
    F: FnMut(&Feature) -> crate::error::Result<()>,
{
    if is_cache_file(path)? {
        info!("reading a preprocessed feature file: {:?}", path);
        let mut reader = CacheReader::new(get_dynamic_reader(path)?);
        let mut count = 0;
        for feature in reader.by_ref() {
            emit(&feature?)?;
            count += 1;
        }
        if reader.invalid_lines() > 0 {
            warn!("skipped {} invalid lines in {:?}", reader.invalid_lines(), path);
        }
        return Ok(count);
    }

    info!("reading a raw gtf file: {:?}", path);
    let sorted = match use_prescan {
        true => Some(prescan_file(path, settings, translator)?),
        false => None,
    };

    let mut reader = GtfReader::new(get_dynamic_reader(path)?, settings.clone())
        .with_translator(translator.cloned());
    let count = mark_ambiguous(
        FeatureAssembler::new(reader.by_ref()),
        sorted.as_ref(),
        &mut emit,
    )?;
    if reader.invalid_lines() > 0 {
        warn!("skipped {} invalid lines in {:?}", reader.invalid_lines(), path);
    }

    Ok(count)
}

///
/// Load all features of a feature file into memory, ambiguous segments marked.
///
/// See [`process_feature_file`] for `use_prescan`. An empty file is an error.
pub fn load_features(
    path: &Path,
    settings: &GtfSettings,
    translator: Option<&Translator>,
    use_prescan: bool,
) -> Result<Vec<Feature>> {
    let mut features: Vec<Feature> = Vec::new();
    process_feature_file(path, settings, translator, use_prescan, |feature| {
        features.push(feature.clone());
        Ok(())
    })?;

    if features.is_empty() {
        return Err(FeatureFileError::NoFeatures(format!("{:?}", path)).into());
    }

    info!("{} features read from {:?}", features.len(), path);
    Ok(features)
}
