use indicatif::ProgressBar;
use log::{info, warn};
use rayon::prelude::*;

use genecount_overlaprs::FeatureIndex;

use crate::checker::{AlignmentChecker, CountSettings, Outcome};
use crate::counters::LookupCounters;
use crate::errors::{CountingError, Result};
use crate::feature_counts::FeatureCounts;
use crate::jobs::{Job, divide_jobs};
use crate::source::{Alignment, AlignmentSource, Partition};

/// How a run is spread over threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub threads: usize,
    /// Jobs per thread; more jobs balance uneven work better.
    pub slices: usize,
    pub progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            threads: 1,
            slices: 8,
            progress: false,
        }
    }
}

impl RunOptions {
    pub(crate) fn progress_bar(&self, len: u64) -> ProgressBar {
        match self.progress {
            true => ProgressBar::new(len),
            false => ProgressBar::hidden(),
        }
    }

    pub(crate) fn pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads.max(1))
            .build()
            .map_err(|e| CountingError::ThreadPool(e.to_string()))
    }
}

/// Result of a counting run: per-feature counts plus the run's tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountRun<C> {
    pub counters: C,
    pub counts: FeatureCounts,
}

impl<C: std::ops::AddAssign> CountRun<C> {
    pub(crate) fn merge(mut self, other: CountRun<C>) -> Self {
        self.counters += other.counters;
        self.counts.merge(other.counts);
        self
    }
}

/// One unit of work of the alignment-centric engine.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CountJob {
    Rows(Job),
    Reference(String),
}

impl std::fmt::Display for CountJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountJob::Rows(job) => write!(f, "rows {}..+{}", job.first, job.count),
            CountJob::Reference(name) => write!(f, "reference {}", name),
        }
    }
}

///
/// Count every aligned read of `source` against `index`, alignment by alignment.
///
/// With more than one thread the work is split the way the source asks for (see
/// [`Partition`]): contiguous row jobs (see [`divide_jobs`]), one job per reference, or a
/// single job. Each job runs with its own [`AlignmentChecker`] and partial results; partials
/// are summed once all jobs are done. A job whose reads cannot be read is logged and skipped.
/// The returned counts list every feature of the index, in index order, with zeros included.
pub fn count_alignments<S>(
    source: &S,
    index: &FeatureIndex,
    settings: CountSettings,
    options: &RunOptions,
) -> Result<CountRun<LookupCounters>>
where
    S: AlignmentSource + ?Sized,
{
    let jobs = plan_jobs(source, options)?;
    info!("{} jobs ({:?})", jobs.len(), source.partition());

    let bar = options.progress_bar(jobs.len() as u64);
    let run_job = |job: &CountJob| {
        let partial = count_job(source, index, settings, job);
        bar.inc(1);
        partial
    };

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

    let mut run = CountRun {
        counters: LookupCounters::default(),
        counts: FeatureCounts::with_ids(index.features().iter().map(|f| f.id.as_str())),
    };
    run = run.merge(partial);
    Ok(run)
}

fn plan_jobs<S>(source: &S, options: &RunOptions) -> Result<Vec<CountJob>>
where
    S: AlignmentSource + ?Sized,
{
    let partition = match options.threads > 1 {
        true => source.partition(),
        false => Partition::Sequential,
    };

    if partition == Partition::References {
        return Ok(source
            .references()?
            .into_iter()
            .map(|reference| CountJob::Reference(reference.canonical))
            .collect());
    }

    let total = source.alignment_count()?;
    let sections = match partition {
        Partition::Rows => (options.threads * options.slices.max(1)) as u64,
        _ => 1,
    };
    info!("{} alignments", total);
    Ok(divide_jobs(total, sections)
        .into_iter()
        .map(CountJob::Rows)
        .collect())
}

fn count_job<S>(
    source: &S,
    index: &FeatureIndex,
    settings: CountSettings,
    job: &CountJob,
) -> CountRun<LookupCounters>
where
    S: AlignmentSource + ?Sized,
{
    let mut run = CountRun::<LookupCounters>::default();
    let mut checker = AlignmentChecker::new(index, settings);
    let mut visit = |alignment: Alignment| -> Result<()> {
        let outcome = checker.check(&alignment);
        if let Outcome::Counted(idx) = outcome {
            run.counts.increment(&index.features()[idx].id);
        }
        run.counters.record(&outcome);
        Ok(())
    };

    let read: Result<()> = match job {
        CountJob::Rows(rows) => source
            .alignment_rows(rows.first, rows.count)
            .and_then(|alignments| alignments.map(|a| a.and_then(&mut visit)).collect()),
        CountJob::Reference(name) => source.reference_alignments(name, &mut visit),
    };
    if let Err(e) = read {
        warn!("stopping {}: {}", job, e);
    }
    run
}
