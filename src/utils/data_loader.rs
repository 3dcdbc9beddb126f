//! Delimited-text loading and saving for evidence and entity tables

use crate::error::{EvidentiaError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// CSV loader for the two collaborator-read boundaries
pub struct DataLoader {
    /// Rows sampled for schema inference, `None` scans the whole file
    infer_schema_length: Option<usize>,
    /// Field separator
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: None,
            separator: b',',
        }
    }

    /// Limit type inference to the first `n` rows
    pub fn with_infer_schema_length(mut self, n: usize) -> Self {
        self.infer_schema_length = Some(n.max(1));
        self
    }

    /// Set the field separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    /// Load a CSV file with a header row.
    ///
    /// A path that does not exist is reported as [`EvidentiaError::MissingInput`].
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        if !path.is_file() {
            return Err(EvidentiaError::MissingInput { path: path.to_path_buf() });
        }

        let parse_opts = CsvParseOptions::default().with_separator(self.separator);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded table");
        Ok(df)
    }
}

/// Writes finished tables
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV, header included
    pub fn save_csv(df: &DataFrame, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df.clone())?;

        debug!(path = %path.display(), rows = df.height(), "Saved table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_missing_input() {
        let err = DataLoader::new()
            .load_csv(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, EvidentiaError::MissingInput { .. }));
    }

    #[test]
    fn test_late_text_cell_in_numeric_column_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evidence.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "event_type,severity").unwrap();
        for i in 0..1100 {
            let severity = if i == 1050 { "x".to_string() } else { (i % 5).to_string() };
            writeln!(file, "login,{}", severity).unwrap();
        }
        drop(file);

        let df = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(df.height(), 1100);
        assert_eq!(df.column("severity").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_round_trip_preserves_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evidence.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "event_type,bytes,description").unwrap();
        writeln!(file, "login,10,ok").unwrap();
        writeln!(file, "logout,,suspicious exit").unwrap();
        drop(file);

        let df = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("bytes").unwrap().null_count(), 1);

        let out = dir.path().join("nested").join("copy.csv");
        DataSaver::save_csv(&df, &out).unwrap();
        let reloaded = DataLoader::new().load_csv(&out).unwrap();
        assert_eq!(reloaded.shape(), df.shape());
    }
}
