// mirrorcat_core/src/domain.rs
use serde::Serialize;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    Zip,
    TarGz,
    /// An already unpacked dist, e.g. `<project>/<name>-1.0.tar.gz/` holding
    /// the archive's members as plain files.
    Dir,
}

impl ArchiveFormat {
    pub fn label(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Dir => "dir",
        }
    }
}

/// One distribution artifact found at scan time.
#[derive(Clone, Debug)]
pub struct ArchiveHandle {
    pub path: PathBuf,
    pub format: ArchiveFormat,
    /// Stable ordinal assigned by the directory scan.
    pub index: usize,
    /// Archive path relative to the scan root, extension stripped, `/`-separated.
    pub stem: String,
}

/// One member of an archive as read from its directory table or tar header.
#[derive(Clone, Debug)]
pub struct MemberEntry {
    pub path: String,
    /// Empty unless the extractor admitted the member's header.
    pub content: Vec<u8>,
    pub is_dir: bool,
    /// Position in the archive's own member order.
    pub index: usize,
    /// Declared uncompressed size.
    pub size: u64,
    /// Set when the member was admitted but its bytes could not be read.
    pub unreadable: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf8WithReplacement,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf8WithReplacement => "utf-8-with-replacement",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberId {
    pub path: String,
    pub index: usize,
}

#[derive(Clone, Debug)]
pub struct ExtractedFile {
    pub text: String,
    pub encoding: Encoding,
    pub source: MemberId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusRecord {
    pub path: String,
    pub body: String,
}
