use std::{path::PathBuf, sync::Arc};

use crate::{
    cmp::{BitWiseComparator, Comparator},
    compress::{Codec, NoCompression, Snappy},
    error::{Error, Result},
};

/// Default size of one segment file, roughly 64GiB. Segment files are sparse
/// until written.
pub const SEGMENT_SIZE: u64 = 4096 * 4096 * 4096;

pub const DEFAULT_MAX_SEGMENTS: u32 = 15;

pub const DEFAULT_MAX_HEIGHT: usize = 32;

/// Nodes reserved per arena bucket. Each bucket is allocated up front at
/// full size, so an empty list already holds about 7MiB.
pub const NODES_PER_BUCKET: usize = 1024 * 128;

/// Largest accepted `Options::bucket_capacity`.
pub const MAX_BUCKET_CAPACITY: usize = 1 << 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compress {
    NO = 0x0,
    Snappy = 0x1,
}

impl Compress {
    pub fn as_byte(&self) -> u8 {
        *self as u8
    }

    pub fn codec(&self) -> Box<dyn Codec> {
        match self {
            Compress::NO => Box::new(NoCompression::new()),
            Compress::Snappy => Box::new(Snappy::new()),
        }
    }
}

impl TryFrom<u8> for Compress {
    type Error = Error;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0x0 => Ok(Self::NO),
            0x1 => Ok(Self::Snappy),
            _ => Err(Error::InvalidArgument(format!("unknown compress type {}", v))),
        }
    }
}

/// Skip list configuration.
#[derive(Clone)]
pub struct Options {
    pub comparator: Arc<dyn Comparator>,

    /// Number of levels a node may participate in; heights run `0..max_height`.
    pub max_height: usize,
    /// Chance that a node is promoted one more level.
    pub probability: f64,

    pub bucket_capacity: usize,
    pub seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            comparator: Arc::new(BitWiseComparator {}),
            max_height: DEFAULT_MAX_HEIGHT,
            probability: 0.5,
            bucket_capacity: NODES_PER_BUCKET,
            seed: 0xdeadbeef,
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<()> {
        if self.max_height == 0 {
            return Err(Error::InvalidArgument("max_height must be > 0".into()));
        }
        if !(self.probability > 0.0 && self.probability < 1.0) {
            return Err(Error::InvalidArgument(
                "probability must be in (0.0, 1.0)".into(),
            ));
        }
        if self.bucket_capacity == 0 || self.bucket_capacity > MAX_BUCKET_CAPACITY {
            return Err(Error::InvalidArgument(format!(
                "bucket_capacity must be in 1..={}",
                MAX_BUCKET_CAPACITY
            )));
        }
        Ok(())
    }
}

/// Segmented store configuration.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Directory holding the segment files.
    pub dir: PathBuf,
    /// Segment `i` is stored in `dir/{prefix}{i}`.
    pub prefix: String,
    pub segment_size: u64,
    pub max_segments: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            dir: PathBuf::from("."),
            prefix: "index.".to_string(),
            segment_size: SEGMENT_SIZE,
            max_segments: DEFAULT_MAX_SEGMENTS,
        }
    }
}

impl StoreOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        StoreOptions {
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_segment_size(mut self, segment_size: u64) -> Self {
        self.segment_size = segment_size;
        self
    }

    pub fn with_max_segments(mut self, max_segments: u32) -> Self {
        self.max_segments = max_segments;
        self
    }

    /// Total addressable bytes, `segment_size * max_segments`.
    pub fn capacity(&self) -> u64 {
        self.segment_size
            .checked_mul(self.max_segments as u64)
            .unwrap_or(u64::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(Error::InvalidArgument("prefix must not be empty".into()));
        }
        if self.segment_size == 0 {
            return Err(Error::InvalidArgument("segment_size must be > 0".into()));
        }
        if usize::try_from(self.segment_size).is_err() {
            return Err(Error::InvalidArgument(
                "segment_size does not fit the address space".into(),
            ));
        }
        if self.max_segments == 0 {
            return Err(Error::InvalidArgument("max_segments must be > 0".into()));
        }
        if self.segment_size.checked_mul(self.max_segments as u64).is_none() {
            return Err(Error::InvalidArgument("store capacity overflows u64".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(Options::default().validate().is_ok());
        assert!(StoreOptions::default().validate().is_ok());
        assert_eq!(
            StoreOptions::default().capacity(),
            SEGMENT_SIZE * DEFAULT_MAX_SEGMENTS as u64
        );
    }

    #[test]
    fn test_invalid_options() {
        let mut options = Options::default();
        options.probability = 1.0;
        assert!(matches!(options.validate(), Err(Error::InvalidArgument(_))));

        let mut options = Options::default();
        options.max_height = 0;
        assert!(options.validate().is_err());

        let options = StoreOptions::new("/tmp").with_segment_size(0);
        assert!(options.validate().is_err());

        let options = StoreOptions::new("/tmp").with_max_segments(0);
        assert!(options.validate().is_err());

        let options = StoreOptions::new("/tmp").with_prefix("");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_bucket_capacity_bounds() {
        let mut options = Options::default();
        options.bucket_capacity = 0;
        assert!(matches!(options.validate(), Err(Error::InvalidArgument(_))));

        options.bucket_capacity = usize::MAX / 2;
        assert!(matches!(options.validate(), Err(Error::InvalidArgument(_))));

        options.bucket_capacity = MAX_BUCKET_CAPACITY + 1;
        assert!(options.validate().is_err());

        options.bucket_capacity = MAX_BUCKET_CAPACITY;
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_compress_byte() {
        for c in [Compress::NO, Compress::Snappy] {
            assert_eq!(Compress::try_from(c.as_byte()).unwrap(), c);
        }
        assert!(Compress::try_from(0x7).is_err());
    }
}
