use crate::domain::ArchiveFormat;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    CorruptArchive,
    UnsupportedFormat,
    UndecodableContent,
    UnreadableMember,
    ArchiveTimeout,
    DuplicatePath,
}

#[derive(Clone, Debug, Serialize)]
pub struct SkippedArchive {
    pub path: String,
    /// `None` when the file was never recognised as an archive.
    pub format: Option<ArchiveFormat>,
    pub kind: SkipKind,
    pub reason: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SkippedMember {
    pub archive: String,
    pub path: String,
    pub kind: SkipKind,
    pub reason: String,
}

/// Outcome of one pipeline run. The corpus holds only successful records;
/// everything that was dropped along the way is listed here.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    pub archives_discovered: u64,
    pub archives_processed: u64,
    pub archives_cancelled: u64,
    pub records_written: u64,
    /// Members rejected by the acceptance rule (directories, extensions, size).
    pub members_filtered: u64,
    pub duplicate_paths: u64,
    /// The N written in the `[<N> lines]` header.
    pub header_lines: u64,
    pub cancelled: bool,
    pub skipped_archives: Vec<SkippedArchive>,
    pub skipped_members: Vec<SkippedMember>,
}

impl RunReport {
    pub fn count_skipped(&self, kind: SkipKind) -> usize {
        self.skipped_archives
            .iter()
            .filter(|s| s.kind == kind)
            .count()
            + self
                .skipped_members
                .iter()
                .filter(|s| s.kind == kind)
                .count()
    }

    pub fn has_skips(&self) -> bool {
        !self.skipped_archives.is_empty() || !self.skipped_members.is_empty()
    }
}
