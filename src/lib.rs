mod cmp;
mod compress;
mod error;
mod filenames;
mod options;
mod skiplist;
mod store;

pub use cmp::{BitWiseComparator, Comparator};
pub use compress::{Codec, NoCompression, Snappy};
pub use error::{Error, Result};
pub use filenames::{parse_segment_file_name, segment_file_name, SegmentNum};
pub use options::{
    Compress, Options, StoreOptions, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_SEGMENTS, MAX_BUCKET_CAPACITY,
    NODES_PER_BUCKET, SEGMENT_SIZE,
};
pub use skiplist::{Arena, Node, NodeId, SkipList, SkipListIter};
pub use store::{destroy, FileStore, MappedStore, Store};
