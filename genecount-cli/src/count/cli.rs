use clap::Command;

use crate::config::{count_args, feature_args};

pub const COUNT_CMD: &str = "count";

pub fn create_count_cli() -> Command {
    Command::new(COUNT_CMD)
        .about("Count the aligned reads of a BAM file per feature and write a count table.")
        .arg_required_else_help(true)
        .args(feature_args())
        .args(count_args())
}
