#![forbid(unsafe_code)]

pub mod cancel;
pub mod config;
pub mod domain;
pub mod error;
pub mod path;
pub mod read;
pub mod report;
pub mod text;

pub mod corpus {
    pub mod sink;
    pub mod spool;
    pub mod writer;
}

pub mod pipeline {
    pub mod collate;
    pub mod driver;
    pub mod scan;
    pub mod worker;
}

// Re-exports: stable API surface
pub use cancel::CancelToken;
pub use config::{CollisionPolicy, LineCount, LineEnding, PipelineConfig};
pub use corpus::sink::OutputSink;
pub use error::{CorpusError, Result};
pub use pipeline::driver::{DriverState, PipelineDriver};
pub use pipeline::scan::scan_archives;
pub use read::ArchiveReader;
pub use report::{RunReport, SkipKind};
pub use text::{Acceptance, TextExtractor};
