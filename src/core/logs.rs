/// Tail access to the backup tool's own log file
///
/// The tool appends operational detail to a single log file; dashboards and
/// the CLI surface the last N lines of it for troubleshooting. The file is
/// read on demand, no watching or streaming.

use std::path::{Path, PathBuf};

use super::error::Result;

pub struct LogReader {
    path: PathBuf,
}

impl LogReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last `lines` lines of the log file, oldest first.
    /// A file shorter than `lines` is returned whole.
    pub fn tail(&self, lines: usize) -> Result<Vec<String>> {
        let contents = std::fs::read_to_string(&self.path)?;
        let all: Vec<&str> = contents.lines().collect();
        let start = all.len().saturating_sub(lines);

        Ok(all[start..].iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use std::io::Write;

    fn log_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_tail_returns_last_lines_in_order() {
        let file = log_file(&["one", "two", "three", "four"]);
        let reader = LogReader::new(file.path());

        assert_eq!(reader.tail(2).unwrap(), vec!["three", "four"]);
    }

    #[test]
    fn test_tail_of_short_file_returns_everything() {
        let file = log_file(&["only line"]);
        let reader = LogReader::new(file.path());

        assert_eq!(reader.tail(100).unwrap(), vec!["only line"]);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let reader = LogReader::new("/nonexistent/pgbackrest.log");
        let err = reader.tail(10).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
