//! Burrow - minimal HTTP/1.1 server engine
//!
//! Request parsing, pattern routing, content negotiation and keep-alive
//! connection handling over tokio streams.

pub mod compression;
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod router;
pub mod routes;
pub mod server;
