use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, arg, value_parser};
use serde::{Deserialize, Serialize};

use genecount_counting::{CountSettings, RunOptions};
use genecount_io::{DEFAULT_FEATURE_ID, DEFAULT_FEATURE_TYPE, GtfSettings, Translator};
use genecount_overlaprs::CountMode;
use genecount_overlaprs::consts::DEFAULT_BIN_SIZE;

use crate::consts::{DEFAULT_OUTPUT, DEFAULT_SLICES, OUTPUT_SUFFIX};

///
/// Every option of a counting run.
///
/// Built from defaults, then an optional TOML file, then the command line; later sources
/// win. Fields missing from the file keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountConfig {
    pub alignments: Option<PathBuf>,
    pub features: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub translation: Option<PathBuf>,
    pub json_summary: Option<PathBuf>,
    pub feature_type: String,
    pub feature_id: String,
    pub mode: String,
    pub min_mapq: u32,
    pub bin_size: i64,
    pub threads: usize,
    pub slices: usize,
    pub ignore_orientation: bool,
    pub prescan: bool,
    pub by_feature: bool,
    pub count_unaligned: bool,
    pub progress: bool,
    pub measure_time: bool,
}

impl Default for CountConfig {
    fn default() -> Self {
        CountConfig {
            alignments: None,
            features: None,
            output: None,
            translation: None,
            json_summary: None,
            feature_type: DEFAULT_FEATURE_TYPE.to_string(),
            feature_id: DEFAULT_FEATURE_ID.to_string(),
            mode: CountMode::default().to_string(),
            min_mapq: 0,
            bin_size: DEFAULT_BIN_SIZE,
            threads: 1,
            slices: DEFAULT_SLICES,
            ignore_orientation: false,
            prescan: false,
            by_feature: false,
            count_unaligned: false,
            progress: false,
            measure_time: false,
        }
    }
}

impl CountConfig {
    ///
    /// Read a config file from disk.
    ///
    /// # Arguments
    /// - path: Path to the config file (a .toml) file.
    pub fn try_from(path: &Path) -> Result<CountConfig> {
        let toml_str =
            read_to_string(path).with_context(|| format!("Failed to read config {:?}", path))?;
        let config: CountConfig = toml::from_str(&toml_str)
            .with_context(|| format!("Failed to parse config {:?}", path))?;

        Ok(config)
    }

    ///
    /// Resolve the config for a subcommand: the `--config` file (or the defaults), overridden
    /// by whatever was given on the command line.
    pub fn from_matches(matches: &ArgMatches) -> Result<CountConfig> {
        let mut config = match matches.try_get_one::<String>("config").ok().flatten() {
            Some(path) => CountConfig::try_from(Path::new(path))?,
            None => CountConfig::default(),
        };
        config.apply_matches(matches);
        Ok(config)
    }

    fn apply_matches(&mut self, matches: &ArgMatches) {
        let path = |id: &str| string_arg(matches, id).map(PathBuf::from);

        if let Some(p) = path("alignments") {
            self.alignments = Some(p);
        }
        if let Some(p) = path("features") {
            self.features = Some(p);
        }
        if let Some(p) = path("output") {
            self.output = Some(p);
        }
        if let Some(p) = path("translation") {
            self.translation = Some(p);
        }
        if let Some(p) = path("json-summary") {
            self.json_summary = Some(p);
        }
        if let Some(v) = string_arg(matches, "feature-type") {
            self.feature_type = v.to_string();
        }
        if let Some(v) = string_arg(matches, "feature-id") {
            self.feature_id = v.to_string();
        }
        if let Some(v) = string_arg(matches, "mode") {
            self.mode = v.to_string();
        }
        if let Some(v) = typed_arg::<u32>(matches, "min-mapq") {
            self.min_mapq = v;
        }
        if let Some(v) = typed_arg::<i64>(matches, "bin-size") {
            self.bin_size = v;
        }
        if let Some(v) = typed_arg::<usize>(matches, "threads") {
            self.threads = v;
        }
        if let Some(v) = typed_arg::<usize>(matches, "slices") {
            self.slices = v;
        }

        let flag = |id: &str| matches.try_get_one::<bool>(id).ok().flatten().copied() == Some(true);
        self.ignore_orientation |= flag("ignore-orientation");
        self.prescan |= flag("prescan");
        self.by_feature |= flag("by-feature");
        self.count_unaligned |= flag("count-unaligned");
        self.progress |= flag("progress");
        self.measure_time |= flag("measure-time");
    }

    pub fn features_path(&self) -> Result<&Path> {
        self.features
            .as_deref()
            .context("A path to a feature file (GTF or preprocessed) is required.")
    }

    pub fn alignments_path(&self) -> Result<&Path> {
        self.alignments
            .as_deref()
            .context("A path to an alignment file (BAM) is required.")
    }

    /// The count table path: `--output`, else `<alignments>.counts.txt`, else `counts.txt`.
    pub fn output_path(&self) -> PathBuf {
        match (&self.output, &self.alignments) {
            (Some(output), _) => output.clone(),
            (None, Some(alignments)) => {
                let mut name = alignments.clone().into_os_string();
                name.push(OUTPUT_SUFFIX);
                PathBuf::from(name)
            }
            (None, None) => PathBuf::from(DEFAULT_OUTPUT),
        }
    }

    pub fn gtf_settings(&self) -> GtfSettings {
        GtfSettings {
            feature_type: self.feature_type.clone(),
            id_attribute: self.feature_id.clone(),
        }
    }

    pub fn translator(&self) -> Result<Option<Translator>> {
        self.translation
            .as_deref()
            .map(Translator::from_path)
            .transpose()
    }

    pub fn count_settings(&self) -> Result<CountSettings> {
        Ok(CountSettings {
            mode: CountMode::from_str(&self.mode)?,
            min_mapq: self.min_mapq,
            ignore_orientation: self.ignore_orientation,
        })
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            threads: self.threads.max(1),
            slices: self.slices.max(1),
            progress: self.progress,
        }
    }
}

fn string_arg<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a str> {
    matches
        .try_get_one::<String>(id)
        .ok()
        .flatten()
        .map(String::as_str)
}

fn typed_arg<T>(matches: &ArgMatches, id: &str) -> Option<T>
where
    T: Clone + Send + Sync + 'static,
{
    matches.try_get_one::<T>(id).ok().flatten().cloned()
}

/// Arguments selecting and reading the feature file, shared by all subcommands.
pub fn feature_args() -> Vec<Arg> {
    vec![
        arg!(-f --features <features> "GTF file (optionally gzip'd) or preprocessed feature file"),
        arg!(-t --translation <translation> "File of name=synonym lines renaming GTF chromosomes"),
        arg!(--"feature-type" <type> "GTF feature type (column 3) to use, default: exon"),
        arg!(--"feature-id" <attribute> "GTF attribute holding the feature id, default: gene_id"),
        arg!(--prescan "Check GTF sort order first, streaming sorted chromosomes"),
    ]
}

/// Arguments of a counting run.
pub fn count_args() -> Vec<Arg> {
    vec![
        arg!(-c --config <config> "TOML file with count options; flags override it"),
        arg!(-a --alignments <alignments> "BAM file with the alignments"),
        arg!(-o --output <output> "Count table path, default: <alignments>.counts.txt"),
        arg!(--"json-summary" <path> "Also write the run's counters as JSON"),
        arg!(-m --mode <mode> "Counting mode: SIMPLE, UNION, STRICT or NONEMPTY (default: UNION)"),
        arg!(-q --"min-mapq" <mapq> "Minimal mapping quality, values below 1 disable the filter")
            .value_parser(value_parser!(u32)),
        arg!(--"bin-size" <size> "Width of a feature index bin")
            .value_parser(value_parser!(i64)),
        arg!(-p --threads <threads> "Number of threads, 1 runs sequentially")
            .value_parser(value_parser!(usize)),
        arg!(--slices <slices> "Jobs per thread when counting by alignment")
            .value_parser(value_parser!(usize)),
        arg!(--"ignore-orientation" "Count reads on either strand of a feature"),
        arg!(--"by-feature" "Count feature by feature instead of alignment by alignment"),
        arg!(--"count-unaligned" "Also report the number of unaligned reads"),
        arg!(--progress "Show progress bars and index statistics"),
        arg!(--"measure-time" "Log the elapsed time"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Command;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn command() -> Command {
        Command::new("count").args(feature_args()).args(count_args())
    }

    #[rstest]
    fn test_defaults() {
        let config = CountConfig::default();
        assert_eq!(config.mode, "UNION");
        assert_eq!(config.bin_size, 500_000);
        assert_eq!(config.output_path(), PathBuf::from("counts.txt"));
        assert_eq!(config.count_settings().unwrap(), CountSettings::default());
    }

    #[rstest]
    fn test_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "alignments = \"reads.bam\"\nmode = \"strict\"\nthreads = 4\nmin_mapq = 10\n",
        )
        .unwrap();

        let matches = command()
            .try_get_matches_from([
                "count",
                "--config",
                path.to_str().unwrap(),
                "--threads",
                "2",
                "--by-feature",
            ])
            .unwrap();
        let config = CountConfig::from_matches(&matches).unwrap();

        assert_eq!(config.threads, 2);
        assert_eq!(config.min_mapq, 10);
        assert!(config.by_feature);
        assert_eq!(config.count_settings().unwrap().mode, CountMode::Strict);
        assert_eq!(config.output_path(), PathBuf::from("reads.bam.counts.txt"));
        assert_eq!(config.feature_type, "exon");
    }

    #[rstest]
    fn test_invalid_mode_is_an_error() {
        let config = CountConfig {
            mode: "MOSTLY".to_string(),
            ..CountConfig::default()
        };
        assert!(config.count_settings().is_err());
    }

    #[rstest]
    fn test_missing_paths() {
        let config = CountConfig::default();
        assert!(config.features_path().is_err());
        assert!(config.alignments_path().is_err());
    }
}
