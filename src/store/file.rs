use std::{
    fs::{self, File, OpenOptions},
    path::PathBuf,
};

#[cfg(unix)]
use std::os::unix::fs::FileExt;

use tracing::{debug, info, warn};

use super::{
    durability::{full_sync, sync_range},
    Chunk, Chunks, Store,
};
use crate::{
    error::{Error, Result},
    filenames::{segment_file_name, SegmentNum},
    options::StoreOptions,
};

/// Segmented store doing positional I/O on plain files.
pub struct FileStore {
    options: StoreOptions,
    files: Vec<File>,
    current: u64,
    open: bool,
}

impl FileStore {
    pub fn new(options: StoreOptions) -> Result<Self> {
        options.validate()?;
        Ok(FileStore {
            options,
            files: Vec::new(),
            current: 0,
            open: false,
        })
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn segment_path(&self, index: SegmentNum) -> PathBuf {
        segment_file_name(&self.options.dir, &self.options.prefix, index)
    }

    pub(crate) fn files(&self) -> &[File] {
        &self.files
    }

    /// Validates a write of `len` bytes at `offset` and creates every segment
    /// up to the one it lands in.
    pub(crate) fn prepare_write(&mut self, offset: u64, len: usize) -> Result<Chunk> {
        self.check_open()?;
        if len == 0 {
            return Err(Error::ZeroLength);
        }

        let capacity = self.options.capacity();
        let end = match offset.checked_add(len as u64) {
            Some(end) if end <= capacity => end,
            _ => {
                warn!(offset, len, capacity, "write rejected, store is full");
                return Err(Error::CapacityExceeded {
                    offset,
                    len,
                    capacity,
                });
            }
        };

        let segment_size = self.options.segment_size;
        if offset / segment_size != (end - 1) / segment_size {
            return Err(Error::CrossSegment { offset, len });
        }

        let segment = (offset / segment_size) as usize;
        while self.files.len() <= segment {
            self.add_segment()?;
        }

        Ok(Chunk {
            segment,
            offset: offset % segment_size,
            start: 0,
            len,
        })
    }

    /// Moves the high-water mark past a completed write.
    pub(crate) fn advance(&mut self, offset: u64, len: usize) {
        self.current = self.current.max(offset + len as u64);
    }

    /// Splits a read of `len` bytes at `offset` into per-segment chunks, as
    /// long as the whole range has been written.
    pub(crate) fn read_chunks(&self, offset: u64, len: usize) -> Result<Chunks> {
        self.check_open()?;
        if len == 0 {
            return Err(Error::ZeroLength);
        }
        self.written_range(offset, len as u64)
    }

    pub(crate) fn sync_chunks(&self, offset: u64, len: u64) -> Result<Chunks> {
        self.check_open()?;
        self.written_range(offset, len)
    }

    pub(crate) fn check_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(Error::NotOpen)
        }
    }

    fn written_range(&self, offset: u64, len: u64) -> Result<Chunks> {
        match offset.checked_add(len) {
            Some(end) if end <= self.current => {
                Ok(Chunks::new(self.options.segment_size, offset, len))
            }
            _ => Err(Error::OutOfRange {
                offset,
                len: len as usize,
                current: self.current,
            }),
        }
    }

    fn add_segment(&mut self) -> Result<()> {
        let path = self.segment_path(self.files.len() as SegmentNum);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.set_len(self.options.segment_size)?;
        debug!(path = %path.display(), size = self.options.segment_size, "created segment");
        self.files.push(file);
        Ok(())
    }
}

impl Store for FileStore {
    fn create(&mut self) -> Result<()> {
        if self.open {
            return Err(Error::AlreadyExist);
        }
        fs::create_dir_all(&self.options.dir)?;
        self.current = 0;
        self.add_segment()?;
        self.open = true;
        info!(
            dir = %self.options.dir.display(),
            prefix = %self.options.prefix,
            capacity = self.options.capacity(),
            "created file store"
        );
        Ok(())
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        let chunk = self.prepare_write(offset, buf.len())?;
        self.files[chunk.segment].write_all_at(buf, chunk.offset)?;
        self.advance(offset, buf.len());
        Ok(buf.len())
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        for chunk in self.read_chunks(offset, buf.len())? {
            let dst = &mut buf[chunk.start..chunk.start + chunk.len];
            self.files[chunk.segment].read_exact_at(dst, chunk.offset)?;
        }
        Ok(buf.len())
    }

    fn sync(&self, offset: u64, len: u64) -> Result<()> {
        if offset == 0 && len == 0 {
            self.check_open()?;
            for file in &self.files {
                full_sync(file)?;
            }
            return Ok(());
        }
        for chunk in self.sync_chunks(offset, len)? {
            sync_range(&self.files[chunk.segment], chunk.offset, chunk.len as u64)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.check_open()?;
        for file in &self.files {
            full_sync(file)?;
        }
        self.files.clear();
        self.open = false;
        info!(dir = %self.options.dir.display(), current = self.current, "closed file store");
        Ok(())
    }

    fn current(&self) -> u64 {
        self.current
    }

    fn capacity(&self) -> u64 {
        self.options.capacity()
    }

    fn segment_count(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn create_store(dir: &TempDir, segment_size: u64) -> FileStore {
        let options = StoreOptions::new(dir.path())
            .with_segment_size(segment_size)
            .with_max_segments(15);
        let mut store = FileStore::new(options).unwrap();
        store.create().unwrap();
        store
    }

    #[test]
    fn test_create_close() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir, 4096);

        let name = dir.path().join("index.0");
        assert_eq!(store.segment_path(0), name);
        assert_eq!(fs::metadata(&name).unwrap().len(), 4096);
        assert_eq!(store.current(), 0);

        store.close().unwrap();
        assert!(name.exists());
    }

    #[test]
    fn test_write_read() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir, 4096);

        let data = b"this is a test";
        assert_eq!(store.write_at(data, 0).unwrap(), data.len());

        let mut out = vec![0u8; data.len()];
        assert_eq!(store.read_at(&mut out, 0).unwrap(), data.len());
        assert_eq!(&out, data);
        store.close().unwrap();
    }

    #[test]
    fn test_write_many() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir, 64 * 1024);

        let data = b"this is a test";
        let mut off = data.len() as u64;
        for _ in 0..1024 {
            assert_eq!(store.write_at(data, off).unwrap(), data.len());
            off += data.len() as u64;
        }

        let mut off = data.len() as u64;
        for _ in 0..1024 {
            let mut out = vec![0u8; data.len()];
            assert_eq!(store.read_at(&mut out, off).unwrap(), data.len());
            assert_eq!(&out, data);
            off += data.len() as u64;
        }

        assert_eq!(store.current(), 1025 * data.len() as u64);
        assert_eq!(store.segment_count(), 1);
        store.close().unwrap();
    }

    #[test]
    fn test_segments_are_presized() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir, 4096);

        store.write_at(b"far away", 3 * 4096 + 10).unwrap();
        assert_eq!(store.segment_count(), 4);
        for i in 0..4 {
            assert_eq!(fs::metadata(store.segment_path(i)).unwrap().len(), 4096);
        }
        assert_eq!(store.current(), 3 * 4096 + 18);
        store.close().unwrap();
    }

    #[test]
    fn test_data_reaches_file() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir, 4096);
        store.write_at(b"persisted", 100).unwrap();
        store.write_at(b"next", 4096 + 1).unwrap();
        store.sync(0, 0).unwrap();
        store.close().unwrap();

        let seg0 = fs::read(dir.path().join("index.0")).unwrap();
        assert_eq!(&seg0[100..109], b"persisted");
        let seg1 = fs::read(dir.path().join("index.1")).unwrap();
        assert_eq!(&seg1[1..5], b"next");
    }

    #[test]
    fn test_overwrite_keeps_current() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir, 4096);
        store.write_at(&[1u8; 64], 0).unwrap();
        store.write_at(b"abcd", 8).unwrap();
        assert_eq!(store.current(), 64);

        let mut out = [0u8; 6];
        store.read_at(&mut out, 7).unwrap();
        assert_eq!(&out, &[1, b'a', b'b', b'c', b'd', 1]);
        store.close().unwrap();
    }

    #[test]
    fn test_recreate_truncates() {
        let dir = TempDir::new().unwrap();
        let mut store = create_store(&dir, 4096);
        store.write_at(b"old", 0).unwrap();
        store.close().unwrap();

        store.create().unwrap();
        assert_eq!(store.current(), 0);
        assert!(matches!(
            store.read_at(&mut [0u8; 3], 0),
            Err(Error::OutOfRange { .. })
        ));
        let seg0 = fs::read(store.segment_path(0)).unwrap();
        assert!(seg0.iter().all(|b| *b == 0));
        store.close().unwrap();
    }

    #[test]
    fn test_invalid_options() {
        let options = StoreOptions::new("/tmp").with_max_segments(0);
        assert!(matches!(
            FileStore::new(options),
            Err(Error::InvalidArgument(_))
        ));
    }
}
