//! Streaming access to distribution archives.
//!
//! Members are handed to a visitor one at a time, in the archive's own
//! directory-table (ZIP) or header (TAR_GZ) order, or file-name order for an
//! unpacked dist directory. The pass is single and
//! forward-only; the file descriptor is released when the walk returns.

use crate::domain::{ArchiveFormat, ArchiveHandle, MemberEntry};
use crate::error::Result;
use std::io::Read;
use std::ops::ControlFlow;

pub mod detect;
pub mod distdir;
pub mod tarball;
pub mod zipfile;

/// What the reader knows about a member before touching its bytes.
#[derive(Debug)]
pub struct MemberHeader<'a> {
    pub path: &'a str,
    pub size: u64,
    pub is_dir: bool,
}

pub struct ArchiveReader<'a> {
    handle: &'a ArchiveHandle,
    read_limit: u64,
}

impl<'a> ArchiveReader<'a> {
    /// `read_limit` caps the bytes buffered per member; one extra byte is
    /// read so that members whose header understates their size are still
    /// caught by the size check downstream.
    pub fn new(handle: &'a ArchiveHandle, read_limit: u64) -> Self {
        Self { handle, read_limit }
    }

    /// Walks every member. `admit` decides from the header alone whether the
    /// member's bytes are loaded; `visit` receives every member (loaded or
    /// not) and may stop the walk early with `ControlFlow::Break`.
    pub fn for_each_member<A, F>(&self, mut admit: A, mut visit: F) -> Result<()>
    where
        A: FnMut(&MemberHeader<'_>) -> bool,
        F: FnMut(MemberEntry) -> Result<ControlFlow<()>>,
    {
        let path = self.handle.path.as_path();
        match self.handle.format {
            ArchiveFormat::Zip => zipfile::walk(path, self.read_limit, &mut admit, &mut visit),
            ArchiveFormat::TarGz => tarball::walk(path, self.read_limit, &mut admit, &mut visit),
            ArchiveFormat::Dir => distdir::walk(path, self.read_limit, &mut admit, &mut visit),
        }
    }

    /// Collects every member with its bytes loaded (subject to the limit).
    pub fn read_all(&self) -> Result<Vec<MemberEntry>> {
        let mut out = Vec::new();
        self.for_each_member(
            |_| true,
            |m| {
                out.push(m);
                Ok(ControlFlow::Continue(()))
            },
        )?;
        Ok(out)
    }
}

pub(crate) fn read_bounded<R: Read>(r: &mut R, size_hint: u64, limit: u64) -> std::io::Result<Vec<u8>> {
    let cap = size_hint.min(limit).min(1 << 20) as usize;
    let mut buf = Vec::with_capacity(cap);
    r.take(limit.saturating_add(1)).read_to_end(&mut buf)?;
    Ok(buf)
}
