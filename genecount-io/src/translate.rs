use std::io::BufRead;
use std::path::Path;

use anyhow::Result;
use fxhash::FxHashMap as HashMap;

use genecount_core::utils::get_dynamic_reader;

///
/// Reference name translation read from `name=synonym` lines.
///
/// Blank lines and lines starting with `#` are ignored, as are lines without `=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translator {
    map: HashMap<String, String>,
}

impl Translator {
    ///
    /// Read a translation table from disk.
    ///
    /// # Arguments
    /// - path: path to the (optionally gzip'd) `name=synonym` file
    pub fn from_path(path: &Path) -> Result<Translator> {
        let reader = get_dynamic_reader(path)?;
        Translator::from_reader(reader)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Translator> {
        let mut map: HashMap<String, String> = HashMap::default();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                map.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        Ok(Translator { map })
    }

    /// The mapped name, or `name` itself when there is no entry.
    pub fn translate<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
