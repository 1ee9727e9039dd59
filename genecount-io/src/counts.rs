use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

///
/// Write a count table: one `feature_id<TAB>count` line per row, then the summary block.
///
/// The file is gzip'd when the path ends in `.gz`. Parent directories are created.
///
/// # Arguments
/// - path: the path to the file to dump to
/// - rows: `(feature_id, count)` pairs in output order
/// - summary: rendered after the rows, e.g. the run's counters
pub fn write_count_table<'a, P, I, S>(path: P, rows: I, summary: &S) -> std::io::Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = (&'a str, u64)>,
    S: Display + ?Sized,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let is_gzipped = path.extension().is_some_and(|ext| ext == "gz");
    if is_gzipped {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_count_rows(&mut encoder, rows, summary)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        write_count_rows(&mut writer, rows, summary)?;
        writer.flush()?;
    }
    Ok(())
}

/// Same as [`write_count_table`], into any writer.
pub fn write_count_rows<'a, W, I, S>(writer: &mut W, rows: I, summary: &S) -> std::io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = (&'a str, u64)>,
    S: Display + ?Sized,
{
    for (id, count) in rows {
        writeln!(writer, "{}\t{}", id, count)?;
    }
    writeln!(writer, "{}", summary)?;
    Ok(())
}
