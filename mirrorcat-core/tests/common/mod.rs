#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

pub fn write_zip(dir: &Path, name: &str, members: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let f = std::fs::File::create(&path).unwrap();
    let mut zw = zip::ZipWriter::new(f);
    let opts = SimpleFileOptions::default();
    for (member, body) in members {
        zw.start_file(*member, opts).unwrap();
        zw.write_all(body).unwrap();
    }
    zw.finish().unwrap();
    path
}

pub fn targz_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let enc = GzEncoder::new(Vec::new(), Compression::default());
    let mut b = tar::Builder::new(enc);
    for (member, body) in members {
        let mut h = tar::Header::new_gnu();
        h.set_size(body.len() as u64);
        h.set_mode(0o644);
        b.append_data(&mut h, member, *body).unwrap();
    }
    b.into_inner().unwrap().finish().unwrap()
}

/// Regular files plus symlink entries `(path, target)` appended after them.
pub fn targz_with_links(members: &[(&str, &[u8])], links: &[(&str, &str)]) -> Vec<u8> {
    let enc = GzEncoder::new(Vec::new(), Compression::default());
    let mut b = tar::Builder::new(enc);
    for (member, body) in members {
        let mut h = tar::Header::new_gnu();
        h.set_size(body.len() as u64);
        h.set_mode(0o644);
        b.append_data(&mut h, member, *body).unwrap();
    }
    for (link, target) in links {
        let mut h = tar::Header::new_gnu();
        h.set_entry_type(tar::EntryType::Symlink);
        h.set_size(0);
        h.set_mode(0o777);
        b.append_link(&mut h, link, target).unwrap();
    }
    b.into_inner().unwrap().finish().unwrap()
}

/// Sets the "encrypted" general-purpose bit of one zip member in its local
/// header and central directory record.
pub fn flag_encrypted(zip_path: &Path, member: &str) {
    let mut bytes = std::fs::read(zip_path).unwrap();
    let name = member.as_bytes();
    for (sig, flags_at, name_len_at, name_at) in
        [(b"PK\x03\x04", 6, 26, 30), (b"PK\x01\x02", 8, 28, 46)]
    {
        for i in 0..bytes.len().saturating_sub(name_at) {
            if &bytes[i..i + 4] != sig {
                continue;
            }
            let len =
                u16::from_le_bytes([bytes[i + name_len_at], bytes[i + name_len_at + 1]]) as usize;
            if bytes.get(i + name_at..i + name_at + len) == Some(name) {
                bytes[i + flags_at] |= 1;
            }
        }
    }
    std::fs::write(zip_path, bytes).unwrap();
}

pub fn write_targz(dir: &Path, name: &str, members: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, targz_bytes(members)).unwrap();
    path
}

/// Delimiter lines of a corpus, in order.
pub fn record_paths(corpus: &str) -> Vec<String> {
    corpus
        .lines()
        .filter_map(|l| l.strip_prefix("# === ").and_then(|l| l.strip_suffix(" ===")))
        .map(str::to_string)
        .collect()
}

/// Splits `[<N> lines]\n<rest>` into N and the rest.
pub fn split_header(corpus: &str) -> (u64, &str) {
    let (first, rest) = corpus.split_once('\n').unwrap();
    let n = first
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(" lines]"))
        .unwrap()
        .parse()
        .unwrap();
    (n, rest)
}
