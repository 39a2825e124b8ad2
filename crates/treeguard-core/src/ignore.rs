use glob::Pattern;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Name of the per-tree ignore file, looked up at the monitored root.
pub const IGNORE_FILE_NAME: &str = ".treeguardignore";

/// Decides whether a path is invisible to the scanner.
pub trait IgnorePredicate: Send + Sync {
    fn should_ignore(&self, path: &Path) -> bool;
}

impl<F> IgnorePredicate for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn should_ignore(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Glob rules from a `.treeguardignore` file.
///
/// A rule matches when it matches either the full path or the file name.
/// `*` also matches `/`.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<Pattern>,
}

impl IgnoreRules {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `<root>/.treeguardignore`. A missing or unreadable file yields no rules.
    pub fn load(root: &Path) -> Self {
        let path = root.join(IGNORE_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::empty(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read ignore file; ignoring nothing");
                Self::empty()
            }
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut patterns = Vec::new();
        for line in text.lines() {
            if line.starts_with('#') {
                continue;
            }
            let rule = line.trim();
            if rule.is_empty() {
                continue;
            }
            match Pattern::new(rule) {
                Ok(p) => patterns.push(p),
                Err(e) => warn!(pattern = rule, error = %e, "skipping invalid ignore pattern"),
            }
        }
        debug!(count = patterns.len(), "ignore rules loaded");
        Self { patterns }
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl IgnorePredicate for IgnoreRules {
    fn should_ignore(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let full = path.to_string_lossy();
        let name = path.file_name().map(|n| n.to_string_lossy());
        self.patterns.iter().any(|p| {
            p.matches(&full) || name.as_deref().is_some_and(|n| p.matches(n))
        })
    }
}
