use memmap2::{MmapMut, MmapOptions};
use tracing::{debug, info};

use super::{file::FileStore, Store};
use crate::{error::Result, options::StoreOptions};

/// Segmented store that maps every segment read/write into memory.
///
/// Segment files and capacity are managed by an inner [`FileStore`]; reads
/// and writes are plain copies into the mapped regions.
pub struct MappedStore {
    store: FileStore,
    maps: Vec<MmapMut>,
}

impl MappedStore {
    pub fn new(options: StoreOptions) -> Result<Self> {
        Ok(MappedStore {
            store: FileStore::new(options)?,
            maps: Vec::new(),
        })
    }

    pub fn options(&self) -> &StoreOptions {
        self.store.options()
    }

    // Maps segments the file store created since the last call.
    fn map_new_segments(&mut self) -> Result<()> {
        let len = self.store.options().segment_size as usize;
        for index in self.maps.len()..self.store.files().len() {
            // SAFETY: the segment file is owned by this store and stays open,
            // at its full size, for as long as the mapping lives.
            let mmap = unsafe { MmapOptions::new().len(len).map_mut(&self.store.files()[index])? };
            debug!(segment = index, len, "mapped segment");
            self.maps.push(mmap);
        }
        Ok(())
    }
}

impl Store for MappedStore {
    fn create(&mut self) -> Result<()> {
        self.store.create()?;
        self.map_new_segments()
    }

    fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        let chunk = self.store.prepare_write(offset, buf.len())?;
        self.map_new_segments()?;

        let start = chunk.offset as usize;
        self.maps[chunk.segment][start..start + buf.len()].copy_from_slice(buf);
        self.store.advance(offset, buf.len());
        Ok(buf.len())
    }

    fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        for chunk in self.store.read_chunks(offset, buf.len())? {
            let src = chunk.offset as usize;
            buf[chunk.start..chunk.start + chunk.len]
                .copy_from_slice(&self.maps[chunk.segment][src..src + chunk.len]);
        }
        Ok(buf.len())
    }

    fn sync(&self, offset: u64, len: u64) -> Result<()> {
        if offset == 0 && len == 0 {
            self.store.check_open()?;
            for map in &self.maps {
                map.flush()?;
            }
            return Ok(());
        }
        for chunk in self.store.sync_chunks(offset, len)? {
            self.maps[chunk.segment].flush_range(chunk.offset as usize, chunk.len)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.store.check_open()?;
        for map in &self.maps {
            map.flush()?;
        }
        let unmapped = self.maps.len();
        self.maps.clear();
        debug!(segments = unmapped, "unmapped segments");
        self.store.close()?;
        info!("closed mapped store");
        Ok(())
    }

    fn current(&self) -> u64 {
        self.store.current()
    }

    fn capacity(&self) -> u64 {
        self.store.capacity()
    }

    fn segment_count(&self) -> usize {
        self.store.segment_count()
    }
}
