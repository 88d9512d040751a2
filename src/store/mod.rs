mod durability;
mod file;
mod mapped;

use std::{fs, io};

use tracing::debug;

use crate::{error::Result, filenames::parse_segment_file_name, options::StoreOptions};

pub use file::FileStore;
pub use mapped::MappedStore;

/// A byte-addressed backing store made of fixed-size segment files.
///
/// Offsets are global: segment `i` holds bytes
/// `[i * segment_size, (i + 1) * segment_size)`. Writes may not cross a
/// segment boundary and never extend past the configured capacity. Reads
/// are limited to the high-water mark of written data.
pub trait Store {
    /// Allocates the first segment.
    fn create(&mut self) -> Result<()>;

    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize>;

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize>;

    /// `sync(0, 0)` is a full barrier over every segment; any other range
    /// flushes just the bytes it covers.
    fn sync(&self, offset: u64, len: u64) -> Result<()>;

    /// Flushes everything and releases all segment handles.
    fn close(&mut self) -> Result<()>;

    /// Furthest byte written so far.
    fn current(&self) -> u64;

    fn capacity(&self) -> u64;

    fn segment_count(&self) -> usize;
}

/// Removes every segment file of the store described by `options`.
pub fn destroy(options: &StoreOptions) -> Result<()> {
    let entries = match fs::read_dir(&options.dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if parse_segment_file_name(&options.prefix, name).is_some() {
            debug!(path = %entry.path().display(), "removing segment");
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Part of a global byte range that falls inside one segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Chunk {
    pub segment: usize,
    /// Offset inside the segment.
    pub offset: u64,
    /// Offset inside the caller's buffer.
    pub start: usize,
    pub len: usize,
}

/// Splits `[offset, offset + len)` at segment boundaries.
pub(crate) struct Chunks {
    segment_size: u64,
    offset: u64,
    end: u64,
    start: usize,
}

impl Chunks {
    pub(crate) fn new(segment_size: u64, offset: u64, len: u64) -> Self {
        Chunks {
            segment_size,
            offset,
            end: offset + len,
            start: 0,
        }
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.offset >= self.end {
            return None;
        }
        let segment = self.offset / self.segment_size;
        let in_segment = self.offset % self.segment_size;
        let len = (self.segment_size - in_segment).min(self.end - self.offset);
        let chunk = Chunk {
            segment: segment as usize,
            offset: in_segment,
            start: self.start,
            len: len as usize,
        };
        self.offset += len;
        self.start += len as usize;
        Some(chunk)
    }
}
