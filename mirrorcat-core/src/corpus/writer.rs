use crate::config::{LineEnding, PATH_PLACEHOLDER};
use crate::domain::CorpusRecord;
use std::borrow::Cow;
use std::io::{self, Write};

/// Write adapter that counts line terminators passing through.
struct LineCountingWriter<W: Write> {
    inner: W,
    newlines: u64,
}

impl<W: Write> LineCountingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            newlines: 0,
        }
    }
}

impl<W: Write> Write for LineCountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let k = self.inner.write(buf)?;
        self.newlines += buf[..k].iter().filter(|&&b| b == b'\n').count() as u64;
        Ok(k)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Serializes records as `<delimiter>\n<body>\n` followed by a blank line.
pub struct CorpusWriter<W: Write> {
    out: LineCountingWriter<W>,
    template: String,
    eol: LineEnding,
    records: u64,
    body_lines: u64,
}

impl<W: Write> CorpusWriter<W> {
    pub fn new(inner: W, template: &str, eol: LineEnding) -> Self {
        Self {
            out: LineCountingWriter::new(inner),
            template: template.to_string(),
            eol,
            records: 0,
            body_lines: 0,
        }
    }

    pub fn write_record(&mut self, rec: &CorpusRecord) -> io::Result<()> {
        let eol = self.eol.as_str();
        let body = normalize_line_endings(&rec.body, self.eol);

        self.out.write_all(delimiter_line(&self.template, &rec.path).as_bytes())?;
        self.out.write_all(eol.as_bytes())?;
        self.out.write_all(body.as_bytes())?;
        if !body.is_empty() && !body.ends_with('\n') {
            self.out.write_all(eol.as_bytes())?;
        }
        self.out.write_all(eol.as_bytes())?;

        self.records += 1;
        self.body_lines += count_lines(&body);
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Line terminators written so far, delimiters and separators included.
    pub fn lines(&self) -> u64 {
        self.out.newlines
    }

    pub fn body_lines(&self) -> u64 {
        self.body_lines
    }

    pub fn line_ending(&self) -> LineEnding {
        self.eol
    }

    pub fn into_inner(self) -> W {
        self.out.inner
    }
}

pub fn delimiter_line(template: &str, path: &str) -> String {
    template.replace(PATH_PLACEHOLDER, path)
}

pub fn header_line(lines: u64, eol: LineEnding) -> String {
    format!("[{lines} lines]{}", eol.as_str())
}

pub fn normalize_line_endings(body: &str, eol: LineEnding) -> Cow<'_, str> {
    match eol {
        LineEnding::Lf if body.contains("\r\n") => Cow::Owned(body.replace("\r\n", "\n")),
        LineEnding::Lf => Cow::Borrowed(body),
        LineEnding::Crlf => {
            let lf = body.replace("\r\n", "\n");
            Cow::Owned(lf.replace('\n', "\r\n"))
        }
    }
}

/// A trailing unterminated line counts as one line.
pub fn count_lines(text: &str) -> u64 {
    let terminated = text.bytes().filter(|&b| b == b'\n').count() as u64;
    if !text.is_empty() && !text.ends_with('\n') {
        terminated + 1
    } else {
        terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, body: &str) -> CorpusRecord {
        CorpusRecord {
            path: path.into(),
            body: body.into(),
        }
    }

    #[test]
    fn writes_delimiter_body_and_separator() {
        let mut w = CorpusWriter::new(Vec::new(), "# === {path} ===", LineEnding::Lf);
        w.write_record(&record("packages/a/setup.py", "import os\nprint(1)\n"))
            .unwrap();
        assert_eq!(w.records(), 1);
        assert_eq!(w.lines(), 4);
        assert_eq!(w.body_lines(), 2);
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert_eq!(out, "# === packages/a/setup.py ===\nimport os\nprint(1)\n\n");
    }

    #[test]
    fn unterminated_body_gets_a_terminator() {
        let mut w = CorpusWriter::new(Vec::new(), "// {path}", LineEnding::Lf);
        w.write_record(&record("p/x.json", "{}")).unwrap();
        assert_eq!(w.body_lines(), 1);
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), "// p/x.json\n{}\n\n");
    }

    #[test]
    fn empty_body_is_just_delimiter_and_separator() {
        let mut w = CorpusWriter::new(Vec::new(), "# === {path} ===", LineEnding::Lf);
        w.write_record(&record("p/__init__.py", "")).unwrap();
        assert_eq!(w.lines(), 2);
        assert_eq!(w.body_lines(), 0);
    }

    #[test]
    fn crlf_mode_rewrites_every_terminator() {
        let mut w = CorpusWriter::new(Vec::new(), "# {path}", LineEnding::Crlf);
        w.write_record(&record("p/a.txt", "one\r\ntwo\nthree")).unwrap();
        let out = String::from_utf8(w.into_inner()).unwrap();
        assert_eq!(out, "# p/a.txt\r\none\r\ntwo\r\nthree\r\n\r\n");
    }

    #[test]
    fn lf_mode_leaves_lone_carriage_returns() {
        assert_eq!(normalize_line_endings("a\r\nb\rc", LineEnding::Lf), "a\nb\rc");
        assert!(matches!(
            normalize_line_endings("plain\n", LineEnding::Lf),
            Cow::Borrowed(_)
        ));
    }

    #[test]
    fn header_format() {
        assert_eq!(header_line(21560, LineEnding::Lf), "[21560 lines]\n");
        assert_eq!(header_line(0, LineEnding::Crlf), "[0 lines]\r\n");
    }
}
