use crate::error::{CorpusError, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Final destination of the corpus. A file destination is written to a
/// temp file beside it and only renamed into place by `commit`; dropping an
/// uncommitted sink removes the temp file.
pub enum OutputSink {
    Stdout(io::Stdout),
    File { tmp: NamedTempFile, dest: PathBuf },
}

impl OutputSink {
    /// `None` means stdout. Failing to open the destination is fatal.
    pub fn open(dest: Option<&Path>) -> Result<Self> {
        let Some(dest) = dest else {
            return Ok(OutputSink::Stdout(io::stdout()));
        };
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = NamedTempFile::new_in(&parent).map_err(|e| {
            CorpusError::fatal_io(format!("open output sink {}", dest.display()), e)
        })?;
        Ok(OutputSink::File {
            tmp,
            dest: dest.to_path_buf(),
        })
    }

    pub fn commit(self) -> Result<()> {
        match self {
            OutputSink::Stdout(mut out) => out
                .flush()
                .map_err(|e| CorpusError::fatal_io("flush stdout", e)),
            OutputSink::File { mut tmp, dest } => {
                tmp.flush()
                    .map_err(|e| CorpusError::fatal_io(format!("flush {}", dest.display()), e))?;
                tmp.persist(&dest).map_err(|e| {
                    CorpusError::fatal_io(format!("persist {}", dest.display()), e.error)
                })?;
                info!(output = %dest.display(), "Corpus written");
                Ok(())
            }
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Stdout(out) => out.write(buf),
            OutputSink::File { tmp, .. } => tmp.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Stdout(out) => out.flush(),
            OutputSink::File { tmp, .. } => tmp.flush(),
        }
    }
}
