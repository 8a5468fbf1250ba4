use crate::domain::ArchiveHandle;

/// Builds `<prefix>/<archive-stem>/<intra-archive-path>` display paths.
#[derive(Clone, Debug)]
pub struct PathNormalizer {
    prefix: String,
}

impl PathNormalizer {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    pub fn display_path(&self, archive: &ArchiveHandle, member_path: &str) -> String {
        canonical_path(&self.prefix, &archive.stem, member_path)
    }
}

pub fn canonical_path(prefix: &str, archive_stem: &str, member_path: &str) -> String {
    let stem = normalize_member_path(archive_stem);
    let member = normalize_member_path(member_path);
    [prefix, stem.as_str(), member.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/")
}

/// Backslashes become `/`; leading `./` and `/` are stripped.
pub fn normalize_member_path(p: &str) -> String {
    let mut s = p.replace('\\', "/");
    loop {
        if let Some(rest) = s.strip_prefix("./") {
            s = rest.to_string();
        } else if let Some(rest) = s.strip_prefix('/') {
            s = rest.to_string();
        } else {
            break;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArchiveFormat;

    #[test]
    fn joins_prefix_stem_and_member() {
        let h = ArchiveHandle {
            path: "/mirror/AppZoo-2023.4.25.18.45.4-py3-none-any.whl".into(),
            format: ArchiveFormat::Zip,
            index: 0,
            stem: "AppZoo-2023.4.25.18.45.4-py3-none-any".into(),
        };
        let n = PathNormalizer::new("packages");
        assert_eq!(
            n.display_path(&h, "appzoo/__init__.py"),
            "packages/AppZoo-2023.4.25.18.45.4-py3-none-any/appzoo/__init__.py"
        );
    }

    #[test]
    fn strips_dot_slash_and_backslashes() {
        assert_eq!(canonical_path("packages", "x-1.0", "./src\\mod.py"), "packages/x-1.0/src/mod.py");
        assert_eq!(canonical_path("packages", "x-1.0", "././/setup.py"), "packages/x-1.0/setup.py");
        assert_eq!(normalize_member_path("a/./b.py"), "a/./b.py");
    }

    #[test]
    fn empty_prefix_is_dropped() {
        assert_eq!(PathNormalizer::new("/").display_path(
            &ArchiveHandle {
                path: "a.zip".into(),
                format: ArchiveFormat::Zip,
                index: 0,
                stem: "a".into(),
            },
            "setup.py"
        ), "a/setup.py");
    }
}
