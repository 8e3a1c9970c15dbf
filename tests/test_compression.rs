use std::io::Read;

use burrow::compression::{
    CompressionRegistry, Compressor, DeflateCompressor, GzipCompressor, builtin,
};
use burrow::http::response::Response;
use flate2::read::{GzDecoder, ZlibDecoder};

/// A codec that always fails.
struct Broken;

impl Compressor for Broken {
    fn encoding_name(&self) -> &'static str {
        "br"
    }

    fn compress(&self, _payload: &[u8]) -> Option<Vec<u8>> {
        None
    }
}

fn gunzip(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out).unwrap();
    out
}

fn registry(with_deflate: bool) -> CompressionRegistry {
    let mut registry = CompressionRegistry::new();
    registry.register(GzipCompressor::default());
    if with_deflate {
        registry.register(DeflateCompressor::default());
    }
    registry
}

#[test]
fn test_select_gzip_from_list() {
    let registry = registry(false);

    let selected = registry.select("gzip, deflate").unwrap();
    assert_eq!(selected.encoding_name(), "gzip");
}

#[test]
fn test_select_empty_or_unknown_is_none() {
    let registry = registry(true);

    assert!(registry.select("").is_none());
    assert!(registry.select("br, zstd").is_none());
}

#[test]
fn test_select_prefers_registration_order() {
    let registry = registry(true);

    // The client lists deflate first, but gzip was registered first.
    let selected = registry.select("deflate, gzip").unwrap();
    assert_eq!(selected.encoding_name(), "gzip");
}

#[test]
fn test_names_and_len() {
    let registry = registry(true);

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names().collect::<Vec<_>>(), ["gzip", "deflate"]);
    assert!(CompressionRegistry::new().is_empty());
}

#[test]
fn test_negotiate_requires_exact_token() {
    let registry = registry(false);

    assert_eq!(registry.negotiate("x-gzip").as_deref(), None);
    assert_eq!(registry.negotiate(" gzip ").as_deref(), Some("gzip"));
    assert_eq!(registry.negotiate("gzip;q=0.5").as_deref(), Some("gzip"));
    assert_eq!(registry.negotiate("gzip;q=0").as_deref(), None);
    assert_eq!(registry.negotiate("").as_deref(), None);
}

#[test]
fn test_gzip_round_trip() {
    let compressed = GzipCompressor::default().compress(b"hello").unwrap();

    assert_ne!(compressed, b"hello".to_vec());
    assert_eq!(gunzip(&compressed), b"hello".to_vec());
}

#[test]
fn test_gzip_level_is_configurable() {
    let payload = b"level level level level level level level level".repeat(16);

    let stored = GzipCompressor::new(0).compress(&payload).unwrap();
    let best = GzipCompressor::new(9).compress(&payload).unwrap();

    assert!(best.len() < stored.len());
    assert_eq!(gunzip(&stored), payload);
    assert_eq!(gunzip(&best), payload);
}

#[test]
fn test_deflate_is_zlib_stream() {
    let compressed = DeflateCompressor::default().compress(b"hello hello").unwrap();

    let mut out = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut out)
        .unwrap();
    assert_eq!(out, b"hello hello".to_vec());
}

#[test]
fn test_encode_sets_headers() {
    let registry = registry(false);
    let response = registry.encode(Some("gzip"), Response::text("hello"));

    assert_eq!(response.header("Content-Encoding"), Some("gzip"));
    assert_eq!(response.header("Vary"), Some("Accept-Encoding"));
    assert_eq!(
        response.header("Content-Length"),
        Some(response.body.len().to_string().as_str())
    );
    assert_eq!(gunzip(&response.body), b"hello".to_vec());
}

#[test]
fn test_encode_without_encoding_is_identity() {
    let registry = registry(false);

    let response = registry.encode(None, Response::text("hello"));
    assert_eq!(response.body, b"hello".to_vec());
    assert_eq!(response.header("Content-Encoding"), None);

    let response = registry.encode(Some("zstd"), Response::text("hello"));
    assert_eq!(response.body, b"hello".to_vec());
    assert_eq!(response.header("Content-Encoding"), None);
}

#[test]
fn test_encode_declined_sends_identity_without_header() {
    let mut registry = CompressionRegistry::new();
    registry.register(Broken);

    let response = registry.encode(Some("br"), Response::text("hello"));
    assert_eq!(response.body, b"hello".to_vec());
    assert_eq!(response.header("Content-Encoding"), None);
    assert_eq!(response.header("Content-Length"), None);
}

#[test]
fn test_encode_skips_empty_body() {
    let registry = registry(false);
    let response = registry.encode(Some("gzip"), Response::ok(Vec::new()));

    assert!(response.body.is_empty());
    assert_eq!(response.header("Content-Encoding"), None);
}

#[test]
fn test_builtin_lookup() {
    assert_eq!(builtin("gzip").unwrap().encoding_name(), "gzip");
    assert_eq!(builtin("deflate").unwrap().encoding_name(), "deflate");
    assert!(builtin("br").is_none());
}
