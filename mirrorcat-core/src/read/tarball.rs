use super::{MemberHeader, read_bounded};
use crate::domain::MemberEntry;
use crate::error::{CorpusError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader};
use std::ops::ControlFlow;
use std::path::Path;
use tracing::debug;

pub(super) fn walk<A, F>(path: &Path, read_limit: u64, admit: &mut A, visit: &mut F) -> Result<()>
where
    A: FnMut(&MemberHeader<'_>) -> bool,
    F: FnMut(MemberEntry) -> Result<ControlFlow<()>>,
{
    let file = File::open(path).map_err(|e| CorpusError::corrupt(path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    let entries = archive
        .entries()
        .map_err(|e| CorpusError::corrupt(path, e))?;

    let mut stopped = false;
    for (index, entry) in entries.enumerate() {
        let mut entry = entry.map_err(|e| CorpusError::corrupt(path, e))?;
        let kind = entry.header().entry_type();
        let is_dir = kind.is_dir();
        let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
        if !is_dir && !kind.is_file() {
            debug!(archive = %path.display(), member = %name, ?kind, "Skipping non-regular tar entry");
            continue;
        }
        let size = entry.size();

        let header = MemberHeader {
            path: &name,
            size,
            is_dir,
        };
        let content = if !is_dir && admit(&header) {
            read_bounded(&mut entry, size, read_limit)
                .map_err(|e| CorpusError::corrupt(path, format!("{name}: {e}")))?
        } else {
            Vec::new()
        };

        let member = MemberEntry {
            path: name,
            content,
            is_dir,
            index,
            size,
            unreadable: None,
        };
        if visit(member)?.is_break() {
            stopped = true;
            break;
        }
    }

    if !stopped {
        // tar stops at the end-of-archive blocks; the gzip trailer (CRC and
        // length) is only checked once the decoder reaches EOF.
        let mut rest = archive.into_inner();
        io::copy(&mut rest, &mut io::sink()).map_err(|e| CorpusError::corrupt(path, e))?;
    }
    Ok(())
}
