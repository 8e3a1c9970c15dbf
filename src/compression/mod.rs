//! Response content-coding.
//!
//! A [`CompressionRegistry`] is built once at startup, filled with
//! [`Compressor`]s in preference order, then shared read-only behind an
//! `Arc` by every connection. There is no global registry.
//!
//! Compression is best-effort. A compressor that fails reports "declined"
//! and the response goes out untouched, without a `Content-Encoding`
//! header.

pub mod gzip;

pub use gzip::{DeflateCompressor, GzipCompressor};

use crate::http::response::Response;

/// A named content-coding.
pub trait Compressor: Send + Sync {
    /// Canonical token used in `Accept-Encoding` / `Content-Encoding`.
    fn encoding_name(&self) -> &'static str;

    /// Compresses `payload`, or returns `None` to decline.
    ///
    /// Implementations must not return partially encoded data; any codec
    /// failure is reported as `None`.
    fn compress(&self, payload: &[u8]) -> Option<Vec<u8>>;
}

/// Looks up a built-in compressor by its encoding name.
pub fn builtin(name: &str) -> Option<Box<dyn Compressor>> {
    match name {
        "gzip" => Some(Box::new(GzipCompressor::default())),
        "deflate" => Some(Box::new(DeflateCompressor::default())),
        _ => None,
    }
}

#[derive(Default)]
pub struct CompressionRegistry {
    compressors: Vec<Box<dyn Compressor>>,
}

impl CompressionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a compressor. Earlier registrations win ties in [`select`].
    ///
    /// [`select`]: CompressionRegistry::select
    pub fn register(&mut self, compressor: impl Compressor + 'static) {
        self.compressors.push(Box::new(compressor));
    }

    pub fn register_boxed(&mut self, compressor: Box<dyn Compressor>) {
        self.compressors.push(compressor);
    }

    pub fn len(&self) -> usize {
        self.compressors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compressors.is_empty()
    }

    /// Names of the registered encodings, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.compressors.iter().map(|c| c.encoding_name())
    }

    /// Returns the first registered compressor whose name occurs anywhere
    /// in `accept_encoding`.
    pub fn select(&self, accept_encoding: &str) -> Option<&dyn Compressor> {
        if accept_encoding.is_empty() {
            return None;
        }

        self.compressors
            .iter()
            .find(|c| accept_encoding.contains(c.encoding_name()))
            .map(|c| c.as_ref())
    }

    /// Returns the compressor registered under exactly `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Compressor> {
        self.compressors
            .iter()
            .find(|c| c.encoding_name() == name)
            .map(|c| c.as_ref())
    }

    pub fn recognizes(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Picks the negotiated encoding for a raw `Accept-Encoding` value.
    ///
    /// Whitespace is stripped and the list is split on commas. The first
    /// token (in the client's order) naming a registered encoding wins.
    /// Parameters after `;` are ignored, except that `q=0` refuses the
    /// coding.
    pub fn negotiate(&self, accept_encoding: &str) -> Option<String> {
        let compact: String = accept_encoding
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        compact.split(',').find_map(|item| {
            let mut parts = item.split(';');
            let token = parts.next().unwrap_or_default();
            let refused = parts.any(is_zero_quality);
            (!refused && self.recognizes(token)).then(|| token.to_string())
        })
    }

    /// Compresses `response` with `encoding` when possible.
    ///
    /// On success the body is replaced and `Content-Encoding`,
    /// `Content-Length` and `Vary` are set. When there is nothing to do,
    /// or the compressor declines, the response is returned unchanged.
    pub fn encode(&self, encoding: Option<&str>, mut response: Response) -> Response {
        let Some(compressor) = encoding.and_then(|name| self.get(name)) else {
            return response;
        };

        if response.body.is_empty() || response.headers.contains_key("Content-Encoding") {
            return response;
        }

        match compressor.compress(&response.body) {
            Some(compressed) => {
                response.set_header("Content-Encoding", compressor.encoding_name());
                response.set_header("Content-Length", compressed.len().to_string());
                response.set_header("Vary", "Accept-Encoding");
                response.body = compressed;
                response
            }
            None => response,
        }
    }
}

fn is_zero_quality(param: &str) -> bool {
    param
        .strip_prefix("q=")
        .and_then(|q| q.parse::<f32>().ok())
        .is_some_and(|q| q == 0.0)
}

impl std::fmt::Debug for CompressionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
