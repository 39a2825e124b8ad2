use std::path::PathBuf;

/// Problems with the invocation itself. These are fatal: nothing is
/// persisted once one of them has been raised.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown hash algorithm '{0}' (expected blake3, sha256 or sha512)")]
    UnknownAlgorithm(String),
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot access '{}': {source}", path.display())]
    RootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file '{}': {source}", path.display())]
    InvalidConfigFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot read config file '{}': {source}", path.display())]
    UnreadableConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot determine data directory")]
    NoDataDir,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot store io at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("cannot replace snapshot '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
