use crate::domain::ArchiveFormat;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const ZIP_MAGIC: &[u8; 4] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8; 2] = b"\x1f\x8b";

const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::TarGz),
    (".tgz", ArchiveFormat::TarGz),
    (".whl", ArchiveFormat::Zip),
    (".zip", ArchiveFormat::Zip),
    (".egg", ArchiveFormat::Zip),
];

/// Format and suffix length for a file name, by extension only.
pub fn format_from_name(name: &str) -> Option<(ArchiveFormat, usize)> {
    let lower = name.to_ascii_lowercase();
    SUFFIXES
        .iter()
        .find(|(suffix, _)| lower.ends_with(suffix) && lower.len() > suffix.len())
        .map(|&(suffix, fmt)| (fmt, suffix.len()))
}

pub fn sniff_format(header: &[u8]) -> Option<ArchiveFormat> {
    if header.starts_with(ZIP_MAGIC) {
        Some(ArchiveFormat::Zip)
    } else if header.starts_with(GZIP_MAGIC) {
        Some(ArchiveFormat::TarGz)
    } else {
        None
    }
}

/// Extension first, magic bytes for files without a known extension. A
/// directory named like an archive is an unpacked dist.
pub fn detect_format(path: &Path) -> Option<ArchiveFormat> {
    let name = path.file_name()?.to_string_lossy();
    if path.is_dir() {
        return format_from_name(&name).map(|_| ArchiveFormat::Dir);
    }
    if let Some((fmt, _)) = format_from_name(&name) {
        return Some(fmt);
    }
    let mut f = File::open(path).ok()?;
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        match f.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return None,
        }
    }
    sniff_format(&header[..filled])
}

/// Strips the archive suffix from a `/`-separated relative path.
pub fn archive_stem(rel: &str) -> String {
    let base_start = rel.rfind('/').map(|i| i + 1).unwrap_or(0);
    match format_from_name(&rel[base_start..]) {
        Some((_, suffix_len)) => rel[..rel.len() - suffix_len].to_string(),
        None => rel.to_string(),
    }
}
