use std::{io, result};

use thiserror::Error;

use crate::skiplist::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid node handle {0}")]
    InvalidHandle(NodeId),

    #[error("write of {len} bytes at offset {offset} exceeds store capacity of {capacity} bytes")]
    CapacityExceeded { offset: u64, len: usize, capacity: u64 },

    #[error("range of {len} bytes at offset {offset} is outside the written region ({current} bytes)")]
    OutOfRange { offset: u64, len: usize, current: u64 },

    #[error("byte slice size must be more than 0")]
    ZeroLength,

    #[error("write of {len} bytes at offset {offset} crosses a segment boundary")]
    CrossSegment { offset: u64, len: usize },

    #[error("store is not open")]
    NotOpen,

    #[error("store already created")]
    AlreadyExist,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {source}")]
    IOError {
        #[from]
        source: io::Error,
    },

    #[error("compression error: {0}")]
    Compression(String),
}

pub type Result<T> = result::Result<T, Error>;
