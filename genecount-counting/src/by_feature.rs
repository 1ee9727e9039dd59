use indicatif::ProgressBar;
use log::{info, warn};
use rayon::prelude::*;

use genecount_core::models::{Feature, IntervalList};
use genecount_overlaprs::{Classification, FeatureIndex, OverlapClassifier};

use crate::checker::CountSettings;
use crate::counters::TotalCounts;
use crate::errors::Result;
use crate::feature_counts::FeatureCounts;
use crate::lookup::{CountRun, RunOptions};
use crate::refs::RefComparison;
use crate::source::{Alignment, AlignmentSource};

/// Features of one reference and the name to query the source with.
struct ReferenceJob<'a> {
    source_name: &'a str,
    features: Vec<&'a Feature>,
}

///
/// Count feature by feature: for every feature, fetch the alignments overlapping its span and
/// classify each against that feature alone.
///
/// Work is split per reference shared by features and source (see [`RefComparison`]);
/// features on other references keep a count of zero. An alignment overlapping two features
/// is seen, and possibly counted, once for each.
pub fn count_by_feature<S>(
    source: &S,
    index: &FeatureIndex,
    refs: &RefComparison,
    settings: CountSettings,
    options: &RunOptions,
) -> Result<CountRun<TotalCounts>>
where
    S: AlignmentSource + ?Sized,
{
    let jobs: Vec<ReferenceJob> = refs
        .in_both
        .iter()
        .map(|(feature_ref, reference)| ReferenceJob {
            source_name: reference.canonical.as_str(),
            features: index
                .features()
                .iter()
                .filter(|f| &f.chromosome == feature_ref)
                .collect(),
        })
        .filter(|job| !job.features.is_empty())
        .collect();
    let total_features: usize = jobs.iter().map(|job| job.features.len()).sum();
    info!("{} features on {} references", total_features, jobs.len());

    let bar = options.progress_bar(total_features as u64);
    let run_job = |job: &ReferenceJob| count_reference(source, job, settings, &bar);

    let partial = match options.threads > 1 {
        true => {
            let pool = options.pool()?;
            pool.install(|| {
                jobs.par_iter()
                    .map(run_job)
                    .reduce(CountRun::default, CountRun::merge)
            })
        }
        false => jobs
            .iter()
            .map(run_job)
            .fold(CountRun::default(), CountRun::merge),
    };
    bar.finish_and_clear();

    let run = CountRun {
        counters: TotalCounts::default(),
        counts: FeatureCounts::with_ids(index.features().iter().map(|f| f.id.as_str())),
    };
    Ok(run.merge(partial))
}

fn count_reference<S>(
    source: &S,
    job: &ReferenceJob,
    settings: CountSettings,
    bar: &ProgressBar,
) -> CountRun<TotalCounts>
where
    S: AlignmentSource + ?Sized,
{
    let mut run = CountRun::<TotalCounts>::default();
    let mut classifier = OverlapClassifier::new();
    let mut ranges = IntervalList::new();

    for feature in &job.features {
        bar.inc(1);

        let mut visit = |alignment: Alignment| -> Result<()> {
            let counters = &mut run.counters;
            counters.total += 1;
            if !settings.strand_matches(feature.reverse, alignment.reverse) {
                counters.other_strand += 1;
                return Ok(());
            }
            if !settings.passes_mapq(alignment.mapping_quality) {
                counters.low_mapq += 1;
                return Ok(());
            }

            ranges.fill_from_cigar(alignment.position, &alignment.cigar);
            match classifier.classify(&feature.ranges, &ranges, settings.mode) {
                Classification::Feature => {
                    counters.features += 1;
                    run.counts.increment(&feature.id);
                }
                Classification::Ambiguous => counters.ambiguous += 1,
                Classification::NoFeature => counters.no_features += 1,
            }
            Ok(())
        };

        if let Err(e) = source.alignment_slice(
            job.source_name,
            feature.start(),
            feature.span_len(),
            &mut visit,
        ) {
            warn!("stopping feature {}: {}", feature.id, e);
        }
    }
    run
}
