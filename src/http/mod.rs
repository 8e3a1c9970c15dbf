//! HTTP/1.x protocol implementation.
//!
//! - **`connection`**: the per-connection keep-alive state machine
//! - **`parser`**: turns a buffered header block (plus body bytes) into a [`request::Request`]
//! - **`request`**: request representation and the keep-alive policy
//! - **`response`**: response representation, status codes and builder
//! - **`writer`**: serializes responses and writes them out over short writes
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitingRequest  │ ← Buffer until the header block is complete
//!        └──────┬───────────┘
//!               │ parse ok            parse error → 400, Connection: close → Closed
//!               ▼                     peer closed / read error → Closed
//!        ┌──────────────────┐
//!        │     Parsed       │ ← Decide keep-alive, dispatch to the router
//!        └──────┬───────────┘
//!               │ handler result (errors mapped to 403/404/500)
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatched     │ ← Write the serialized response
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │    Responded     │
//!        └──────┬───────────┘
//!               ├─ Keep-Alive → AwaitingRequest (same connection)
//!               └─ Close → Closed
//! ```
//!
//! HTTP/1.1 keeps the connection unless the client sends
//! `Connection: close`; HTTP/1.0 closes it unless the client sends
//! `Connection: keep-alive`. Either way the connection is closed once it
//! has served `max_requests` responses.

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
