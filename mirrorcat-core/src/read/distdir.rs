use super::{MemberHeader, read_bounded};
use crate::domain::MemberEntry;
use crate::error::{CorpusError, Result};
use std::fs::File;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

fn member_path(root: &Path, p: &Path) -> String {
    p.strip_prefix(root)
        .unwrap_or(p)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Walks an unpacked dist in file-name order. Members are the directories and
/// regular files below `root`; symlinks are neither followed nor yielded.
pub(super) fn walk<A, F>(root: &Path, read_limit: u64, admit: &mut A, visit: &mut F) -> Result<()>
where
    A: FnMut(&MemberHeader<'_>) -> bool,
    F: FnMut(MemberEntry) -> Result<ControlFlow<()>>,
{
    std::fs::read_dir(root).map_err(|e| CorpusError::corrupt(root, e))?;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    let mut index = 0;
    for e in walker {
        let e = match e {
            Ok(e) => e,
            Err(err) => {
                warn!(archive = %root.display(), error = %err, "Skipping unreadable dist entry");
                continue;
            }
        };
        let ft = e.file_type();
        let name = member_path(root, e.path());
        if !ft.is_dir() && !ft.is_file() {
            debug!(archive = %root.display(), member = %name, "Skipping non-regular dist entry");
            continue;
        }
        let is_dir = ft.is_dir();
        let (size, mut unreadable) = match e.metadata() {
            Ok(md) if !is_dir => (md.len(), None),
            Ok(_) => (0, None),
            Err(err) => (0, Some(err.to_string())),
        };

        let header = MemberHeader {
            path: &name,
            size,
            is_dir,
        };
        let mut content = Vec::new();
        if !is_dir && unreadable.is_none() && admit(&header) {
            let loaded = File::open(e.path()).and_then(|mut f| read_bounded(&mut f, size, read_limit));
            match loaded {
                Ok(bytes) => content = bytes,
                Err(err) => unreadable = Some(err.to_string()),
            }
        }

        let member = MemberEntry {
            path: name,
            content,
            is_dir,
            index,
            size,
            unreadable,
        };
        index += 1;
        if visit(member)?.is_break() {
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

    fn handle(path: &std::path::Path) -> ArchiveHandle {
        ArchiveHandle {
            path: path.to_path_buf(),
            format: ArchiveFormat::Dir,
            index: 0,
            stem: "vibrav/vibrav-0.1.2-py3-none-any".into(),
        }
    }

    #[test]
    fn yields_members_sorted_with_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("vibrav-0.1.2-py3-none-any.whl");
        std::fs::create_dir_all(dist.join("vibrav/core")).unwrap();
        std::fs::write(dist.join("vibrav/core/config.py"), b"DEBUG = False\n").unwrap();
        std::fs::write(dist.join("vibrav/__init__.py"), b"").unwrap();
        std::fs::write(dist.join("METADATA"), b"Name: vibrav\n").unwrap();

        let h = handle(&dist);
        let members = ArchiveReader::new(&h, 1024).read_all().unwrap();
        let names: Vec<_> = members.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "METADATA",
                "vibrav",
                "vibrav/__init__.py",
                "vibrav/core",
                "vibrav/core/config.py"
            ]
        );
        assert!(members[1].is_dir);
        assert_eq!(members[4].content, b"DEBUG = False\n");
        assert_eq!(members[4].size, 14);
        assert_eq!(members[4].index, 4);
    }

    #[test]
    fn unadmitted_files_are_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("x-1.0.tar.gz");
        std::fs::create_dir(&dist).unwrap();
        std::fs::write(dist.join("logo.png"), b"\x89PNG").unwrap();
        let h = handle(&dist);
        let mut seen = Vec::new();
        ArchiveReader::new(&h, 1024)
            .for_each_member(
                |_| false,
                |m| {
                    seen.push((m.path, m.content.len(), m.size));
                    Ok(std::ops::ControlFlow::Continue(()))
                },
            )
            .unwrap();
        assert_eq!(seen, vec![("logo.png".to_string(), 0, 4)]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_members() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("x-1.0.tar.gz");
        std::fs::create_dir(&dist).unwrap();
        std::fs::write(dist.join("real.py"), b"x = 1\n").unwrap();
        std::os::unix::fs::symlink(dist.join("real.py"), dist.join("alias.py")).unwrap();
        let h = handle(&dist);
        let members = ArchiveReader::new(&h, 1024).read_all().unwrap();
        let names: Vec<_> = members.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(names, vec!["real.py"]);
    }

    #[test]
    fn vanished_dist_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let h = handle(&dir.path().join("gone-1.0.tar.gz"));
        let err = ArchiveReader::new(&h, 1024).read_all().unwrap_err();
        assert!(matches!(err, CorpusError::CorruptArchive { .. }));
    }
}
