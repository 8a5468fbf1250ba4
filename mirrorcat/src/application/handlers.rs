use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use mirrorcat_core::config::PipelineConfig;
use mirrorcat_core::domain::ArchiveHandle;
use mirrorcat_core::error::{CorpusError, Result};
use mirrorcat_core::read::detect::{archive_stem, detect_format};
use mirrorcat_core::{
    ArchiveReader, LineCount, LineEnding, OutputSink, PipelineDriver, RunReport, TextExtractor,
    scan_archives,
};
use tracing::info;

use crate::presentation::cli::{LineCountArg, LineEndingArg};

/// Flags that override the JSON config for one build.
pub struct BuildOverrides {
    pub config: Option<PathBuf>,
    pub parallelism: Option<usize>,
    pub max_member_size: Option<u64>,
    pub comment_style: Option<String>,
    pub line_ending: Option<LineEndingArg>,
    pub line_count: Option<LineCountArg>,
    pub prefix: Option<String>,
    pub depth: Option<usize>,
    pub sort: bool,
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::from_json_file(p),
        None => Ok(PipelineConfig::default()),
    }
}

impl BuildOverrides {
    fn apply(self) -> Result<PipelineConfig> {
        let mut cfg = load_config(self.config.as_deref())?;
        if let Some(n) = self.parallelism {
            cfg.parallelism = n;
        }
        if let Some(n) = self.max_member_size {
            cfg.max_member_size_bytes = n;
        }
        if let Some(s) = self.comment_style {
            cfg.comment_style = s;
        }
        if let Some(e) = self.line_ending {
            cfg.line_ending = match e {
                LineEndingArg::Lf => LineEnding::Lf,
                LineEndingArg::Crlf => LineEnding::Crlf,
            };
        }
        if let Some(c) = self.line_count {
            cfg.line_count = match c {
                LineCountArg::Output => LineCount::Output,
                LineCountArg::Body => LineCount::Body,
            };
        }
        if let Some(p) = self.prefix {
            cfg.path_prefix = p;
        }
        if let Some(d) = self.depth {
            cfg.scan_depth = d;
        }
        if self.sort {
            cfg.sort_archives = true;
        }
        Ok(cfg)
    }
}

pub fn handle_build(
    root: PathBuf,
    out: Option<PathBuf>,
    report_json: Option<PathBuf>,
    overrides: BuildOverrides,
) -> Result<()> {
    let cfg = overrides.apply()?;
    let mut driver = PipelineDriver::new(cfg)?;
    let sink = OutputSink::open(out.as_deref())?;
    let report = driver.run_to_sink(&root, sink)?;

    print_summary(&report);
    if let Some(path) = report_json {
        let json = serde_json::to_vec_pretty(&report)
            .map_err(|e| CorpusError::Config(format!("serialize report: {e}")))?;
        std::fs::write(&path, json)
            .map_err(|e| CorpusError::fatal_io(format!("write report {}", path.display()), e))?;
        info!(report = %path.display(), "Run report written");
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    eprintln!(
        "build: {} records, {} lines, {}/{} archives processed, {} members filtered",
        report.records_written,
        report.header_lines,
        report.archives_processed,
        report.archives_discovered,
        report.members_filtered,
    );
    for s in &report.skipped_archives {
        eprintln!("skip  {:<22} {}  ({})", format!("{:?}", s.kind), s.path, s.reason);
    }
    for s in &report.skipped_members {
        eprintln!(
            "skip  {:<22} {}!{}  ({})",
            format!("{:?}", s.kind),
            s.archive,
            s.path,
            s.reason
        );
    }
    if report.cancelled {
        eprintln!("build: cancelled after {} archives", report.archives_processed);
    }
}

pub fn handle_scan(root: PathBuf, depth: Option<usize>, sort: bool) -> Result<()> {
    let mut cfg = PipelineConfig::default();
    if let Some(d) = depth {
        cfg.scan_depth = d;
    }
    cfg.sort_archives = sort;
    let cfg = cfg.normalized()?;

    let scan = scan_archives(&root, &cfg)?;
    for h in &scan.archives {
        println!("{:>5}  {:<6}  {}", h.index, h.format.label(), h.stem);
    }
    for s in &scan.unsupported {
        println!("    -  {:<6}  {}", "skip", s.path);
    }
    Ok(())
}

pub fn handle_list(archive: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let cfg = load_config(config.as_deref())?.normalized()?;
    let format = detect_format(&archive).ok_or_else(|| CorpusError::UnsupportedFormat {
        path: archive.clone(),
    })?;
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let handle = ArchiveHandle {
        path: archive.clone(),
        format,
        index: 0,
        stem: archive_stem(&name),
    };

    let extractor = TextExtractor::new(&cfg);
    let reader = ArchiveReader::new(&handle, extractor.max_member_size());
    reader.for_each_member(
        |_| false,
        |m| {
            let decision = extractor.classify(&m.path, m.size, m.is_dir);
            let mark = if decision.is_accept() { '+' } else { '-' };
            println!("{mark} {:>10}  {}  [{}]", m.size, m.path, decision.describe());
            Ok(ControlFlow::Continue(()))
        },
    )
}
