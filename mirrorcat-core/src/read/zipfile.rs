use super::{MemberHeader, read_bounded};
use crate::domain::MemberEntry;
use crate::error::{CorpusError, Result};
use std::fs::File;
use std::io::BufReader;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

pub(super) fn walk<A, F>(path: &Path, read_limit: u64, admit: &mut A, visit: &mut F) -> Result<()>
where
    A: FnMut(&MemberHeader<'_>) -> bool,
    F: FnMut(MemberEntry) -> Result<ControlFlow<()>>,
{
    let file = File::open(path).map_err(|e| CorpusError::corrupt(path, e))?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| CorpusError::corrupt(path, e))?;
    debug!(archive = %path.display(), members = archive.len(), "Opened zip central directory");

    for i in 0..archive.len() {
        // Raw access only parses the local header, so encrypted members and
        // unsupported compression methods can still be named and filtered.
        let (name, is_dir, size) = {
            let raw = archive
                .by_index_raw(i)
                .map_err(|e| CorpusError::corrupt(path, format!("member #{i}: {e}")))?;
            (raw.name().to_string(), raw.is_dir(), raw.size())
        };

        let header = MemberHeader {
            path: &name,
            size,
            is_dir,
        };
        let mut content = Vec::new();
        let mut unreadable = None;
        if !is_dir && admit(&header) {
            let loaded = archive
                .by_index(i)
                .map_err(|e| e.to_string())
                .and_then(|mut zf| read_bounded(&mut zf, size, read_limit).map_err(|e| e.to_string()));
            match loaded {
                Ok(bytes) => content = bytes,
                Err(reason) => {
                    debug!(archive = %path.display(), member = %name, %reason, "Member unreadable");
                    unreadable = Some(reason);
                }
            }
        }

        let entry = MemberEntry {
            path: name,
            content,
            is_dir,
            index: i,
            size,
            unreadable,
        };
        if visit(entry)?.is_break() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::domain::{ArchiveFormat, ArchiveHandle};
    use crate::error::CorpusError;
    use crate::read::ArchiveReader;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &std::path::Path, members: &[(&str, &[u8])]) {
        let f = std::fs::File::create(path).unwrap();
        let mut zw = zip::ZipWriter::new(f);
        let opts = SimpleFileOptions::default();
        for (name, body) in members {
            if name.ends_with('/') {
                zw.add_directory(name.trim_end_matches('/'), opts).unwrap();
            } else {
                zw.start_file(*name, opts).unwrap();
                zw.write_all(body).unwrap();
            }
        }
        zw.finish().unwrap();
    }

    fn handle(path: &std::path::Path) -> ArchiveHandle {
        ArchiveHandle {
            path: path.to_path_buf(),
            format: ArchiveFormat::Zip,
            index: 0,
            stem: "pkg".into(),
        }
    }

    #[test]
    fn yields_members_in_directory_order() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("pkg.whl");
        write_zip(
            &p,
            &[
                ("zeta.py", b"z = 1\n"),
                ("pkg/", b""),
                ("alpha.py", b"a = 1\n"),
            ],
        );
        let h = handle(&p);
        let members = ArchiveReader::new(&h, 1024).read_all().unwrap();
        let names: Vec<_> = members.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(names, vec!["zeta.py", "pkg/", "alpha.py"]);
        assert!(members[1].is_dir);
        assert_eq!(members[2].content, b"a = 1\n");
        assert_eq!(members[2].index, 2);
    }

    #[test]
    fn unadmitted_members_are_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("pkg.zip");
        write_zip(&p, &[("logo.png", b"\x89PNG...."), ("a.py", b"x\n")]);
        let h = handle(&p);
        let mut seen = Vec::new();
        ArchiveReader::new(&h, 1024)
            .for_each_member(
                |hdr| hdr.path.ends_with(".py"),
                |m| {
                    seen.push((m.path, m.content.len(), m.size));
                    Ok(std::ops::ControlFlow::Continue(()))
                },
            )
            .unwrap();
        assert_eq!(seen, vec![("logo.png".to_string(), 0, 8), ("a.py".to_string(), 2, 2)]);
    }

    /// Sets the "encrypted" general-purpose bit of one member in both its
    /// local header and its central directory record.
    fn flag_encrypted(path: &std::path::Path, member: &str) {
        let mut bytes = std::fs::read(path).unwrap();
        let name = member.as_bytes();
        for (sig, flags_at, name_len_at, name_at) in
            [(b"PK\x03\x04", 6, 26, 30), (b"PK\x01\x02", 8, 28, 46)]
        {
            for i in 0..bytes.len().saturating_sub(name_at) {
                if &bytes[i..i + 4] != sig {
                    continue;
                }
                let len = u16::from_le_bytes([bytes[i + name_len_at], bytes[i + name_len_at + 1]])
                    as usize;
                if bytes.get(i + name_at..i + name_at + len) == Some(name) {
                    bytes[i + flags_at] |= 1;
                }
            }
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn encrypted_member_is_skipped_not_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("demo-1.0-py3-none-any.whl");
        write_zip(
            &p,
            &[("demo/__init__.py", b"VERSION = 1\n"), ("demo/secret.png", b"\x89PNG....")],
        );
        flag_encrypted(&p, "demo/secret.png");
        let h = handle(&p);

        let mut seen = Vec::new();
        ArchiveReader::new(&h, 1024)
            .for_each_member(
                |hdr| hdr.path.ends_with(".py"),
                |m| {
                    seen.push((m.path, m.content, m.unreadable));
                    Ok(std::ops::ControlFlow::Continue(()))
                },
            )
            .unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, b"VERSION = 1\n");
        assert_eq!(seen[1].0, "demo/secret.png");
        assert!(seen[1].1.is_empty());
        assert!(seen[1].2.is_none());

        // Admitted, the encrypted member fails on its own.
        let members = ArchiveReader::new(&h, 1024).read_all().unwrap();
        assert!(members[0].unreadable.is_none());
        assert!(members[1].unreadable.is_some());
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("broken.whl");
        std::fs::write(&p, b"PK\x03\x04 definitely not a zip").unwrap();
        let h = handle(&p);
        let err = ArchiveReader::new(&h, 1024).read_all().unwrap_err();
        assert!(matches!(err, CorpusError::CorruptArchive { .. }));
    }
}
