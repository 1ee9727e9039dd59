use clap::{Command, arg};

use crate::config::feature_args;

pub const REFS_CMD: &str = "refs";

pub fn create_refs_cli() -> Command {
    Command::new(REFS_CMD)
        .about("Compare the chromosomes of a feature file with the references of an alignment file.")
        .arg_required_else_help(true)
        .args(feature_args())
        .arg(arg!(-a --alignments <alignments> "BAM file with the alignments").required(true))
}
