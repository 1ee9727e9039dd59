use clap::{Command, arg};

use crate::config::feature_args;

pub const PREPARE_CMD: &str = "prepare";

pub fn create_prepare_cli() -> Command {
    Command::new(PREPARE_CMD)
        .about("Assemble GTF features, mark overlapping segments ambiguous and write a preprocessed feature file.")
        .arg_required_else_help(true)
        .args(feature_args())
        .arg(arg!(-o --output <output> "Preprocessed feature file to write").required(true))
        .arg(arg!(--"ids-only" "Write only the feature ids, one per line"))
        .arg(arg!(-r --reference <reference> "Only keep features on this chromosome"))
}
