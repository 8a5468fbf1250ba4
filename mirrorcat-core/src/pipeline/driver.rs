use super::collate::Collator;
use super::scan::scan_archives;
use super::worker::{ArchiveOutcome, ArchiveWorker};
use crate::cancel::CancelToken;
use crate::config::PipelineConfig;
use crate::corpus::sink::OutputSink;
use crate::corpus::spool;
use crate::domain::ArchiveHandle;
use crate::error::{CorpusError, Result};
use crate::path::PathNormalizer;
use crate::report::RunReport;
use crate::text::TextExtractor;
use rayon::prelude::*;
use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    Ready,
    Scanning,
    /// Discovered index of the archive being emitted.
    ProcessingArchive(usize),
    Finalizing,
    Done,
}

pub struct PipelineDriver {
    config: PipelineConfig,
    cancel: CancelToken,
    state: DriverState,
}

impl PipelineDriver {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            config: config.normalized()?,
            cancel: CancelToken::new(),
            state: DriverState::Ready,
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    fn transition(&mut self, next: DriverState) {
        debug!(from = ?self.state, to = ?next, "Driver state change");
        self.state = next;
    }

    /// Runs the pipeline into a sink and commits it; an error leaves no
    /// partial output file behind.
    pub fn run_to_sink(&mut self, root: &Path, mut sink: OutputSink) -> Result<RunReport> {
        let report = self.run(root, &mut sink)?;
        sink.commit()?;
        Ok(report)
    }

    /// Writes `[<N> lines]` and every record to `out`. Per-archive and
    /// per-member failures land in the report; only an unreadable root or a
    /// failing output is returned as an error.
    pub fn run<W: Write>(&mut self, root: &Path, out: &mut W) -> Result<RunReport> {
        self.transition(DriverState::Scanning);
        let scan = scan_archives(root, &self.config)?;
        info!(
            root = %root.display(),
            archives = scan.archives.len(),
            unsupported = scan.unsupported.len(),
            "Scan complete"
        );

        let report = RunReport {
            archives_discovered: scan.archives.len() as u64,
            skipped_archives: scan.unsupported,
            ..Default::default()
        };
        let spool = spool::open(&self.config.comment_style, self.config.line_ending)
            .map_err(|e| CorpusError::fatal_io("create spool file", e))?;
        let mut collator = Collator::new(spool, self.config.collision_policy, report);

        let worker = ArchiveWorker::new(
            TextExtractor::new(&self.config),
            PathNormalizer::new(&self.config.path_prefix),
            self.cancel.clone(),
            self.config.archive_timeout(),
        );

        let archives = scan.archives;
        if self.config.parallelism > 1 && archives.len() > 1 {
            self.process_parallel(&archives, &worker, &mut collator)?;
        } else {
            self.process_sequential(&archives, &worker, &mut collator)?;
        }

        self.transition(DriverState::Finalizing);
        let (spool, mut report) = collator.finish();
        report.header_lines = spool::finish(spool, self.config.line_count, out)
            .map_err(|e| CorpusError::fatal_io("write corpus", e))?;

        self.transition(DriverState::Done);
        info!(
            records = report.records_written,
            lines = report.header_lines,
            skipped_archives = report.skipped_archives.len(),
            skipped_members = report.skipped_members.len(),
            cancelled = report.cancelled,
            "Pipeline finished"
        );
        Ok(report)
    }

    fn process_sequential<W: Write>(
        &mut self,
        archives: &[ArchiveHandle],
        worker: &ArchiveWorker,
        collator: &mut Collator<W>,
    ) -> Result<()> {
        for h in archives {
            self.transition(DriverState::ProcessingArchive(h.index));
            let outcome = worker.process(h);
            collator
                .accept(outcome)
                .map_err(|e| CorpusError::fatal_io("write spool", e))?;
        }
        Ok(())
    }

    /// Workers on a rayon pool, one collator on this thread. The channel is
    /// the only path from workers to the spool.
    fn process_parallel<W: Write>(
        &mut self,
        archives: &[ArchiveHandle],
        worker: &ArchiveWorker,
        collator: &mut Collator<W>,
    ) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.parallelism)
            .thread_name(|i| format!("mirrorcat-worker-{i}"))
            .build()
            .map_err(|e| CorpusError::Config(format!("build worker pool: {e}")))?;
        let (tx, rx) = mpsc::channel::<ArchiveOutcome>();
        let cancel = self.cancel.clone();

        let written: io::Result<()> = std::thread::scope(|s| {
            s.spawn(|| {
                pool.install(|| {
                    archives.par_iter().for_each_with(tx, |tx, h| {
                        // The receiver outlives every sender.
                        let _ = tx.send(worker.process(h));
                    });
                });
            });

            let mut written = Ok(());
            for outcome in rx {
                if written.is_err() {
                    continue;
                }
                written = collator.accept(outcome);
                match &written {
                    Ok(()) => {
                        let emitted = collator.next_index();
                        if emitted > 0 {
                            self.transition(DriverState::ProcessingArchive(emitted - 1));
                        }
                    }
                    // The run is lost; stop the workers and drain.
                    Err(_) => cancel.cancel(),
                }
            }
            written
        });
        written.map_err(|e| CorpusError::fatal_io("write spool", e))
    }
}
