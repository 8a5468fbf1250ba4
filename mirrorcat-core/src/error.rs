use crate::report::SkipKind;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("corrupt archive {}: {reason}", path.display())]
    CorruptArchive { path: PathBuf, reason: String },

    #[error("unsupported archive format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("undecodable content: {path}")]
    UndecodableContent { path: String },

    #[error("unreadable member {path}: {reason}")]
    UnreadableMember { path: String, reason: String },

    #[error("archive {} exceeded its time budget of {limit:?}", path.display())]
    ArchiveTimeout { path: PathBuf, limit: Duration },

    #[error("{context}: {source}")]
    FatalIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CorpusError {
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CorpusError::CorruptArchive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn fatal_io(context: impl Into<String>, source: std::io::Error) -> Self {
        CorpusError::FatalIo {
            context: context.into(),
            source,
        }
    }

    /// Fatal errors abort the run; everything else is recorded and skipped.
    pub fn is_fatal(&self) -> bool {
        self.skip_kind().is_none()
    }

    pub fn skip_kind(&self) -> Option<SkipKind> {
        match self {
            CorpusError::CorruptArchive { .. } => Some(SkipKind::CorruptArchive),
            CorpusError::UnsupportedFormat { .. } => Some(SkipKind::UnsupportedFormat),
            CorpusError::UndecodableContent { .. } => Some(SkipKind::UndecodableContent),
            CorpusError::UnreadableMember { .. } => Some(SkipKind::UnreadableMember),
            CorpusError::ArchiveTimeout { .. } => Some(SkipKind::ArchiveTimeout),
            CorpusError::FatalIo { .. } | CorpusError::Config(_) | CorpusError::Io(_) => None,
        }
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, CorpusError>;
