//! Two-pass output: records go to an anonymous temp file first, so the
//! `[<N> lines]` header can be written before them once N is known.

use super::writer::{CorpusWriter, header_line};
use crate::config::{LineCount, LineEnding};
use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};

pub type SpoolWriter = CorpusWriter<BufWriter<File>>;

pub fn open(template: &str, eol: LineEnding) -> io::Result<SpoolWriter> {
    let file = tempfile::tempfile()?;
    Ok(CorpusWriter::new(BufWriter::new(file), template, eol))
}

/// Writes the header and the spooled records to `sink`; returns the N
/// written in the header.
pub fn finish<W: Write>(writer: SpoolWriter, count: LineCount, sink: &mut W) -> io::Result<u64> {
    let n = match count {
        LineCount::Output => writer.lines(),
        LineCount::Body => writer.body_lines(),
    };
    let eol = writer.line_ending();
    let mut file = writer.into_inner().into_inner().map_err(|e| e.into_error())?;
    file.seek(SeekFrom::Start(0))?;

    sink.write_all(header_line(n, eol).as_bytes())?;
    io::copy(&mut file, sink)?;
    sink.flush()?;
    Ok(n)
}
