//! Acceptance rule and UTF-8 decoding for archive members.
//!
//! Binary detection is an extension allow-list, not content sniffing: a
//! member is text if its basename is an allowed special name or its
//! extension is on the list. Rejection is a normal filtering outcome and is
//! never reported as an error.

use crate::config::PipelineConfig;
use crate::domain::{Encoding, ExtractedFile, MemberEntry, MemberId};
use crate::error::{CorpusError, Result};
use crate::read::MemberHeader;
use std::collections::BTreeSet;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Acceptance {
    Accept,
    Directory,
    ExcludedDir,
    Extension,
    TooLarge { size: u64, limit: u64 },
}

impl Acceptance {
    pub fn is_accept(&self) -> bool {
        matches!(self, Acceptance::Accept)
    }

    pub fn describe(&self) -> String {
        match self {
            Acceptance::Accept => "accepted".to_string(),
            Acceptance::Directory => "directory".to_string(),
            Acceptance::ExcludedDir => "excluded directory".to_string(),
            Acceptance::Extension => "extension not allowed".to_string(),
            Acceptance::TooLarge { size, limit } => format!("{size} bytes > limit {limit}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TextExtractor {
    allowed_extensions: BTreeSet<String>,
    allowed_filenames: BTreeSet<String>,
    excluded_dirs: BTreeSet<String>,
    max_member_size: u64,
    max_replacement_ratio: f32,
}

impl TextExtractor {
    pub fn new(cfg: &PipelineConfig) -> Self {
        Self {
            allowed_extensions: cfg
                .allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            allowed_filenames: cfg
                .allowed_filenames
                .iter()
                .map(|n| n.to_ascii_lowercase())
                .collect(),
            excluded_dirs: cfg.excluded_dirs.clone(),
            max_member_size: cfg.max_member_size_bytes,
            max_replacement_ratio: cfg.max_replacement_ratio,
        }
    }

    pub fn max_member_size(&self) -> u64 {
        self.max_member_size
    }

    pub fn classify(&self, path: &str, size: u64, is_dir: bool) -> Acceptance {
        if is_dir {
            return Acceptance::Directory;
        }
        let normalized = path.replace('\\', "/");
        let mut parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
        let Some(basename) = parts.pop() else {
            return Acceptance::Directory;
        };
        if parts.iter().any(|d| self.excluded_dirs.contains(*d)) {
            return Acceptance::ExcludedDir;
        }
        if !self.name_allowed(basename) {
            return Acceptance::Extension;
        }
        if size > self.max_member_size {
            return Acceptance::TooLarge {
                size,
                limit: self.max_member_size,
            };
        }
        Acceptance::Accept
    }

    pub fn classify_header(&self, header: &MemberHeader<'_>) -> Acceptance {
        self.classify(header.path, header.size, header.is_dir)
    }

    fn name_allowed(&self, basename: &str) -> bool {
        let lower = basename.to_ascii_lowercase();
        if self.allowed_filenames.contains(&lower) {
            return true;
        }
        // ".bashrc" style names have no extension
        match lower.rfind('.') {
            Some(dot) if dot > 0 => self.allowed_extensions.contains(&lower[dot + 1..]),
            _ => false,
        }
    }

    /// `Ok(None)` when the acceptance rule rejects the member. The size check
    /// uses the bytes actually read, so a header that understates the size
    /// still gets rejected. An accepted member whose bytes could not be read
    /// fails on its own without taking the archive down.
    pub fn extract(&self, entry: MemberEntry) -> Result<Option<ExtractedFile>> {
        let size = entry.size.max(entry.content.len() as u64);
        let decision = self.classify(&entry.path, size, entry.is_dir);
        if !decision.is_accept() {
            debug!(member = %entry.path, reason = %decision.describe(), "Member filtered");
            return Ok(None);
        }
        if let Some(reason) = entry.unreadable {
            return Err(CorpusError::UnreadableMember {
                path: entry.path,
                reason,
            });
        }
        let source = MemberId {
            path: entry.path,
            index: entry.index,
        };
        let (text, encoding) = decode(entry.content, self.max_replacement_ratio)
            .ok_or_else(|| CorpusError::UndecodableContent {
                path: source.path.clone(),
            })?;
        Ok(Some(ExtractedFile {
            text,
            encoding,
            source,
        }))
    }
}

/// Strict UTF-8 first, then a lossy pass. `None` when the lossy text is
/// dominated by replacement characters.
pub fn decode(bytes: Vec<u8>, max_replacement_ratio: f32) -> Option<(String, Encoding)> {
    match String::from_utf8(bytes) {
        Ok(s) => Some((s, Encoding::Utf8)),
        Err(e) => {
            let lossy = String::from_utf8_lossy(e.as_bytes()).into_owned();
            let total = lossy.chars().count();
            let replaced = lossy.chars().filter(|&c| c == char::REPLACEMENT_CHARACTER).count();
            if total > 0 && replaced as f64 / total as f64 > max_replacement_ratio as f64 {
                return None;
            }
            Some((lossy, Encoding::Utf8WithReplacement))
        }
    }
}
