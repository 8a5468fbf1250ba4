use crate::cancel::CancelToken;
use crate::domain::{ArchiveFormat, ArchiveHandle, CorpusRecord};
use crate::error::CorpusError;
use crate::path::PathNormalizer;
use crate::read::ArchiveReader;
use crate::report::{SkipKind, SkippedMember};
use crate::text::TextExtractor;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ArchiveOutput {
    pub records: Vec<CorpusRecord>,
    pub skipped_members: Vec<SkippedMember>,
    pub filtered: u64,
}

#[derive(Debug)]
pub enum ArchiveStatus {
    Done(ArchiveOutput),
    Failed(CorpusError),
    Cancelled,
}

/// Everything one archive produced; sent whole to the collator so that a
/// failed archive contributes nothing to the corpus.
#[derive(Debug)]
pub struct ArchiveOutcome {
    pub index: usize,
    pub archive: String,
    pub format: ArchiveFormat,
    pub status: ArchiveStatus,
}

/// Runs reader → extractor → normalizer for one archive. Holds no mutable
/// state, so one worker can serve every thread of a pool.
pub struct ArchiveWorker {
    extractor: TextExtractor,
    normalizer: PathNormalizer,
    cancel: CancelToken,
    timeout: Option<Duration>,
}

impl ArchiveWorker {
    pub fn new(
        extractor: TextExtractor,
        normalizer: PathNormalizer,
        cancel: CancelToken,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            extractor,
            normalizer,
            cancel,
            timeout,
        }
    }

    pub fn process(&self, handle: &ArchiveHandle) -> ArchiveOutcome {
        let archive = handle.path.display().to_string();
        if self.cancel.is_cancelled() {
            return ArchiveOutcome {
                index: handle.index,
                archive,
                format: handle.format,
                status: ArchiveStatus::Cancelled,
            };
        }

        let started = Instant::now();
        let mut out = ArchiveOutput::default();
        let mut cancelled = false;
        let reader = ArchiveReader::new(handle, self.extractor.max_member_size());

        let walked = reader.for_each_member(
            |hdr| self.extractor.classify_header(hdr).is_accept(),
            |member| {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    return Ok(ControlFlow::Break(()));
                }
                if let Some(limit) = self.timeout {
                    if started.elapsed() >= limit {
                        return Err(CorpusError::ArchiveTimeout {
                            path: handle.path.clone(),
                            limit,
                        });
                    }
                }
                let member_path = member.path.clone();
                match self.extractor.extract(member) {
                    Ok(Some(file)) => {
                        let path = self.normalizer.display_path(handle, &file.source.path);
                        debug!(record = %path, encoding = file.encoding.as_str(), "Extracted member");
                        out.records.push(CorpusRecord {
                            path,
                            body: file.text,
                        });
                    }
                    Ok(None) => out.filtered += 1,
                    Err(e) => {
                        warn!(archive = %archive, member = %member_path, error = %e, "Dropping member");
                        out.skipped_members.push(SkippedMember {
                            archive: archive.clone(),
                            path: member_path,
                            kind: e.skip_kind().unwrap_or(SkipKind::UndecodableContent),
                            reason: e.to_string(),
                        });
                    }
                }
                Ok(ControlFlow::Continue(()))
            },
        );

        let status = match walked {
            Ok(()) if cancelled => ArchiveStatus::Cancelled,
            Ok(()) => ArchiveStatus::Done(out),
            Err(e) => {
                warn!(archive = %archive, error = %e, "Skipping archive");
                ArchiveStatus::Failed(e)
            }
        };
        ArchiveOutcome {
            index: handle.index,
            archive,
            format: handle.format,
            status,
        }
    }
}
