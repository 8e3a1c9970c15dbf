use std::io::{self, Write};

use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};

use crate::compression::Compressor;

fn degrade(encoding: &'static str, result: io::Result<Vec<u8>>) -> Option<Vec<u8>> {
    match result {
        Ok(compressed) => Some(compressed),
        Err(e) => {
            tracing::warn!(error = %e, encoding, "Compression failed, sending identity");
            None
        }
    }
}

/// `gzip` content-coding backed by flate2.
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level),
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Compressor for GzipCompressor {
    fn encoding_name(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, payload: &[u8]) -> Option<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::with_capacity(payload.len() / 2), self.level);
        if let Err(e) = encoder.write_all(payload) {
            return degrade("gzip", Err(e));
        }
        degrade("gzip", encoder.finish())
    }
}

/// `deflate` content-coding. HTTP's "deflate" is the zlib-wrapped stream.
#[derive(Debug, Clone, Copy)]
pub struct DeflateCompressor {
    level: Compression,
}

impl Default for DeflateCompressor {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Compressor for DeflateCompressor {
    fn encoding_name(&self) -> &'static str {
        "deflate"
    }

    fn compress(&self, payload: &[u8]) -> Option<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(payload.len() / 2), self.level);
        if let Err(e) = encoder.write_all(payload) {
            return degrade("deflate", Err(e));
        }
        degrade("deflate", encoder.finish())
    }
}
