//! Value codecs.
//!
//! A codec turns a byte buffer into its encoded form and back. Record
//! stores with fixed slot sizes need codecs whose output length depends on
//! the input length only; that is a property of the chosen codec, not
//! something checked here.

use std::io::{Read, Write};

use snap::{read::FrameDecoder, write::FrameEncoder};

use crate::error::{Error, Result};

pub trait Codec {
    fn encode(&mut self, input: &[u8]) -> Result<Vec<u8>>;

    fn decode(&mut self, input: &[u8]) -> Result<Vec<u8>>;

    /// Releases codec state. Encoding or decoding afterwards fails.
    fn close(&mut self) -> Result<()>;
}

fn closed() -> Error {
    Error::Compression("codec is closed".into())
}

/// Copies bytes through unchanged.
#[derive(Default)]
pub struct NoCompression {
    closed: bool,
}

impl NoCompression {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for NoCompression {
    fn encode(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.closed {
            return Err(closed());
        }
        Ok(input.to_vec())
    }

    fn decode(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.closed {
            return Err(closed());
        }
        Ok(input.to_vec())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Snappy frame format codec.
#[derive(Default)]
pub struct Snappy {
    closed: bool,
}

impl Snappy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for Snappy {
    fn encode(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.closed {
            return Err(closed());
        }
        let mut out = Vec::with_capacity(input.len());
        let mut encoder = FrameEncoder::new(&mut out);
        encoder
            .write_all(input)
            .map_err(|e| Error::Compression(e.to_string()))?;
        encoder
            .flush()
            .map_err(|e| Error::Compression(e.to_string()))?;
        drop(encoder);
        Ok(out)
    }

    fn decode(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        if self.closed {
            return Err(closed());
        }
        let mut out = Vec::new();
        FrameDecoder::new(input)
            .read_to_end(&mut out)
            .map_err(|_| Error::Compression("corrupted snappy frame".into()))?;
        Ok(out)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
