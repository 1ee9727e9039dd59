use std::ffi::OsStr;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let is_gzipped = path.extension() == Some(OsStr::new("gz"));
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    let reader = BufReader::new(file);

    Ok(reader)
}

///
/// Read the first line of a (possibly gzip'd) text file, without the line terminator.
/// An empty file yields an empty string.
///
pub fn first_line_of(path: &Path) -> Result<String> {
    let mut reader = get_dynamic_reader(path)?;
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .with_context(|| format!("Failed to read first line of: {:?}", path))?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
