//! Translation between the JSON/HTTP and protobuf/gRPC representations.
//!
//! # Components
//!
//! - `codec`: A tonic codec over reflected messages, so any method in the
//!   descriptor pool can be called without generated client stubs.
//! - `json`: Proto3 JSON mapping for request and response bodies, including
//!   streamed bodies made of consecutive JSON values.
//! - `metadata`: HTTP header <-> gRPC metadata forwarding and `Grpc-Timeout`.
//! - `status`: gRPC status -> HTTP status and JSON error envelope.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod codec;
pub mod json;
pub mod metadata;
pub mod status;

pub use codec::DynamicCodec;
pub use json::JsonStreamDecoder;
pub use status::{http_status_from_code, status_response, status_value};
