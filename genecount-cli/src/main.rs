mod config;
mod count;
mod prepare;
mod refs;

use anyhow::Result;
use clap::{Command, arg};
use log::Level;
use simple_logger::init_with_level;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "genecount";
    pub const BIN_NAME: &str = "genecount";

    pub const DEFAULT_OUTPUT: &str = "counts.txt";
    pub const OUTPUT_SUFFIX: &str = ".counts.txt";
    pub const DEFAULT_SLICES: usize = 8;
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Count aligned reads per annotated feature (gene, exon, ...) in the style of htseq-count.")
        .subcommand_required(true)
        .arg(arg!(-v --verbose "Log debug messages").global(true))
        .subcommand(prepare::cli::create_prepare_cli())
        .subcommand(refs::cli::create_refs_cli())
        .subcommand(count::cli::create_count_cli())
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();

    let level = match matches.get_flag("verbose") {
        true => Level::Debug,
        false => Level::Info,
    };
    init_with_level(level)?;

    match matches.subcommand() {
        //
        // PREPARE
        //
        Some((prepare::cli::PREPARE_CMD, matches)) => {
            prepare::handlers::run_prepare(matches)?;
        }

        //
        // REFS
        //
        Some((refs::cli::REFS_CMD, matches)) => {
            refs::handlers::run_refs(matches)?;
        }

        //
        // COUNT
        //
        Some((count::cli::COUNT_CMD, matches)) => {
            count::handlers::run_count(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_is_valid() {
        build_parser().debug_assert();
    }
}
