use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Appends rendered reports to a log file, one framed block per cycle.
#[derive(Debug, Clone)]
pub struct ReportFile {
    path: PathBuf,
}

impl ReportFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, rendered: &str) -> io::Result<()> {
        let rule = "=".repeat(50);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file)?;
        writeln!(file, "{rule}")?;
        writeln!(file, "Report: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "{rule}")?;
        writeln!(file, "{rendered}")?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_framed_blocks() {
        let dir = tempdir().unwrap();
        let sink = ReportFile::new(dir.path().join("reports.log"));
        sink.append("Added files (1):\n  + /a").unwrap();
        sink.append("Deleted files (1):\n  - /a").unwrap();
        let text = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(text.matches("Report: ").count(), 2);
        assert!(text.contains("  + /a"));
        assert!(text.ends_with("  - /a\n"));
    }
}
