use super::worker::{ArchiveOutcome, ArchiveStatus};
use crate::config::CollisionPolicy;
use crate::corpus::writer::CorpusWriter;
use crate::report::{RunReport, SkipKind, SkippedArchive, SkippedMember};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};
use tracing::{info, warn};

/// Single owner of the corpus writer. Accepts archive outcomes in any
/// order and emits them strictly by discovered index.
pub struct Collator<W: Write> {
    writer: CorpusWriter<W>,
    policy: CollisionPolicy,
    claimed: HashMap<String, u32>,
    pending: BTreeMap<usize, ArchiveOutcome>,
    next: usize,
    halted: bool,
    report: RunReport,
}

impl<W: Write> Collator<W> {
    pub fn new(writer: CorpusWriter<W>, policy: CollisionPolicy, report: RunReport) -> Self {
        Self {
            writer,
            policy,
            claimed: HashMap::new(),
            pending: BTreeMap::new(),
            next: 0,
            halted: false,
            report,
        }
    }

    /// Index of the next archive the collator is waiting for.
    pub fn next_index(&self) -> usize {
        self.next
    }

    pub fn accept(&mut self, outcome: ArchiveOutcome) -> io::Result<()> {
        self.pending.insert(outcome.index, outcome);
        while let Some(o) = self.pending.remove(&self.next) {
            self.emit(o)?;
            self.next += 1;
        }
        Ok(())
    }

    fn emit(&mut self, o: ArchiveOutcome) -> io::Result<()> {
        // Once an archive is cancelled, nothing after it is written, so a
        // cancelled run is still a prefix of the full corpus.
        if self.halted {
            self.report.archives_cancelled += 1;
            return Ok(());
        }
        match o.status {
            ArchiveStatus::Cancelled => {
                self.halted = true;
                self.report.cancelled = true;
                self.report.archives_cancelled += 1;
            }
            ArchiveStatus::Failed(e) => {
                self.report.skipped_archives.push(SkippedArchive {
                    path: o.archive,
                    format: Some(o.format),
                    kind: e.skip_kind().unwrap_or(SkipKind::CorruptArchive),
                    reason: e.to_string(),
                });
            }
            ArchiveStatus::Done(out) => {
                self.report.archives_processed += 1;
                self.report.members_filtered += out.filtered;
                self.report.skipped_members.extend(out.skipped_members);
                let before = self.writer.records();
                for mut rec in out.records {
                    match self.claim(&rec.path) {
                        Some(path) => {
                            rec.path = path;
                            self.writer.write_record(&rec)?;
                        }
                        None => {
                            warn!(record = %rec.path, archive = %o.archive, "Duplicate display path dropped");
                            self.report.duplicate_paths += 1;
                            self.report.skipped_members.push(SkippedMember {
                                archive: o.archive.clone(),
                                path: rec.path,
                                kind: SkipKind::DuplicatePath,
                                reason: "display path already emitted".to_string(),
                            });
                        }
                    }
                }
                info!(
                    archive = %o.archive,
                    index = o.index,
                    records = self.writer.records() - before,
                    "Archive processed"
                );
            }
        }
        Ok(())
    }

    /// The path to write under, or `None` if the record must be dropped.
    fn claim(&mut self, path: &str) -> Option<String> {
        if !self.claimed.contains_key(path) {
            self.claimed.insert(path.to_string(), 1);
            return Some(path.to_string());
        }
        match self.policy {
            CollisionPolicy::KeepFirst => None,
            CollisionPolicy::Suffix => {
                let mut n = self.claimed[path];
                loop {
                    n += 1;
                    let candidate = format!("{path}#{n}");
                    if !self.claimed.contains_key(&candidate) {
                        self.claimed.insert(path.to_string(), n);
                        self.claimed.insert(candidate.clone(), 1);
                        return Some(candidate);
                    }
                }
            }
        }
    }

    pub fn finish(mut self) -> (CorpusWriter<W>, RunReport) {
        // Outcomes stranded behind a gap can only exist if a worker vanished.
        self.report.archives_cancelled += self.pending.len() as u64;
        self.report.records_written = self.writer.records();
        (self.writer, self.report)
    }
}
