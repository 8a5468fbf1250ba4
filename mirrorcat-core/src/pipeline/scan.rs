use crate::config::PipelineConfig;
use crate::domain::{ArchiveFormat, ArchiveHandle};
use crate::error::{CorpusError, Result};
use crate::read::detect::{archive_stem, detect_format, format_from_name};
use crate::report::{SkipKind, SkippedArchive};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Default)]
pub struct ScanResult {
    /// In discovered order; `archives[i].index == i`.
    pub archives: Vec<ArchiveHandle>,
    pub unsupported: Vec<SkippedArchive>,
}

fn is_hidden(e: &DirEntry) -> bool {
    e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.')
}

/// Enumerates archive files, and directories named like archives (unpacked
/// dists), under `root` down to `scan_depth`. Only an unreadable root is
/// fatal.
pub fn scan_archives(root: &Path, cfg: &PipelineConfig) -> Result<ScanResult> {
    std::fs::read_dir(root).map_err(|e| {
        CorpusError::fatal_io(format!("open root directory {}", root.display()), e)
    })?;

    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(cfg.scan_depth)
        .follow_links(false);
    if cfg.sort_archives {
        walker = walker.sort_by_file_name();
    }

    let mut out = ScanResult::default();
    let mut it = walker.into_iter().filter_entry(|e| !is_hidden(e));
    while let Some(e) = it.next() {
        let e = match e {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "Skipping unreadable directory entry");
                continue;
            }
        };
        let ft = e.file_type();
        if !ft.is_file() && !ft.is_dir() {
            continue;
        }
        let path = e.path();
        let rel = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let format = if ft.is_dir() {
            if format_from_name(&e.file_name().to_string_lossy()).is_none() {
                // Project folders above the scan floor are descended into;
                // anything at the floor is reported so an empty run is
                // explainable.
                if e.depth() == cfg.scan_depth {
                    warn!(dir = %rel, "Skipping directory that is not an unpacked dist");
                    out.unsupported.push(SkippedArchive {
                        path: rel,
                        format: None,
                        kind: SkipKind::UnsupportedFormat,
                        reason: format!(
                            "{}: directory name has no archive suffix",
                            CorpusError::UnsupportedFormat {
                                path: path.to_path_buf()
                            }
                        ),
                    });
                }
                continue;
            }
            it.skip_current_dir();
            Some(ArchiveFormat::Dir)
        } else {
            detect_format(path)
        };

        match format {
            Some(format) => {
                let index = out.archives.len();
                debug!(index, archive = %rel, format = format.label(), "Discovered archive");
                out.archives.push(ArchiveHandle {
                    path: path.to_path_buf(),
                    format,
                    index,
                    stem: archive_stem(&rel),
                });
            }
            None => {
                let err = CorpusError::UnsupportedFormat {
                    path: path.to_path_buf(),
                };
                warn!(file = %rel, "Skipping file with unsupported format");
                out.unsupported.push(SkippedArchive {
                    path: rel,
                    format: None,
                    kind: SkipKind::UnsupportedFormat,
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(out)
}
