// HTTP headers <-> gRPC metadata
// Author: kelexine (https://github.com/kelexine)

use crate::error::{GatewayError, Result};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use std::net::SocketAddr;
use std::time::Duration;
use tonic::metadata::{Ascii, KeyAndValueRef, MetadataKey, MetadataMap, MetadataValue};

/// Prefix for headers forwarded verbatim as metadata, in both directions.
pub const METADATA_HEADER_PREFIX: &str = "grpc-metadata-";
/// Prefix given to well-known HTTP headers when forwarded as metadata.
pub const METADATA_PREFIX: &str = "grpcgateway-";
pub const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";
/// Set on every request by the server and forwarded to the backend as is.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const PERMANENT_HEADERS: &[&str] = &[
    "accept",
    "accept-charset",
    "accept-language",
    "accept-ranges",
    "authorization",
    "cache-control",
    "content-type",
    "cookie",
    "date",
    "expect",
    "from",
    "host",
    "if-match",
    "if-modified-since",
    "if-none-match",
    "if-schedule-tag-match",
    "if-unmodified-since",
    "max-forwards",
    "origin",
    "pragma",
    "referer",
    "user-agent",
    "via",
    "warning",
];

fn is_permanent_header(name: &str) -> bool {
    PERMANENT_HEADERS.contains(&name)
}

/// Metadata key an incoming header is forwarded under, if any.
fn incoming_key(name: &str) -> Option<String> {
    if let Some(key) = name.strip_prefix(METADATA_HEADER_PREFIX) {
        return Some(key.to_string());
    }
    if is_permanent_header(name) {
        return Some(format!("{}{}", METADATA_PREFIX, name));
    }
    None
}

fn append(metadata: &mut MetadataMap, key: &str, value: &str) {
    if key.ends_with("-bin") {
        tracing::debug!("Not forwarding binary header {}", key);
        return;
    }
    match (
        MetadataKey::<Ascii>::from_bytes(key.as_bytes()),
        MetadataValue::<Ascii>::try_from(value),
    ) {
        (Ok(key), Ok(value)) => {
            metadata.append(key, value);
        }
        _ => tracing::debug!("Not forwarding malformed header {}", key),
    }
}

/// Translate request headers into outgoing call metadata.
pub fn outgoing_metadata(headers: &HeaderMap, peer: Option<SocketAddr>) -> MetadataMap {
    let mut metadata = MetadataMap::new();

    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            tracing::debug!("Not forwarding non-ASCII header {}", name);
            continue;
        };
        let name = name.as_str();

        if name == "authorization" || name == REQUEST_ID_HEADER {
            append(&mut metadata, name, value);
        }
        if let Some(key) = incoming_key(name) {
            append(&mut metadata, &key, value);
        }
    }

    if let Some(host) = headers.get("x-forwarded-host").or_else(|| headers.get("host")) {
        if let Ok(host) = host.to_str() {
            append(&mut metadata, "x-forwarded-host", host);
        }
    }

    if let Some(peer) = peer {
        let ip = peer.ip().to_string();
        let forwarded_for = match headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{}, {}", existing, ip),
            None => ip,
        };
        append(&mut metadata, "x-forwarded-for", &forwarded_for);
    }

    metadata
}

/// Copy backend response metadata onto HTTP response headers.
pub fn forward_response_metadata(metadata: &MetadataMap, headers: &mut HeaderMap) {
    for entry in metadata.iter() {
        let KeyAndValueRef::Ascii(key, value) = entry else {
            continue;
        };
        let key = key.as_str();
        if key == "content-type" || key.starts_with("grpc-") {
            continue;
        }
        let name = format!("{}{}", METADATA_HEADER_PREFIX, key);
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_bytes(value.as_encoded_bytes()),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::debug!("Not forwarding malformed metadata {}", key),
        }
    }
}

/// Parse a `Grpc-Timeout` value: at most 8 digits followed by a unit
/// (`H`ours, `M`inutes, `S`econds, `m`illis, `u`micros, `n`anos).
pub fn parse_grpc_timeout(value: &str) -> Result<Duration> {
    let invalid = || GatewayError::InvalidRequest(format!("invalid grpc-timeout: {:?}", value));

    if !value.is_ascii() || value.len() < 2 || value.len() > 9 {
        return Err(invalid());
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let amount: u64 = digits.parse().map_err(|_| invalid())?;

    let duration = match unit {
        "H" => Duration::from_secs(amount * 60 * 60),
        "M" => Duration::from_secs(amount * 60),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return Err(invalid()),
    };
    Ok(duration)
}

/// Deadline for a call: the client's `Grpc-Timeout`, else the configured default.
pub fn call_timeout(headers: &HeaderMap, default: Option<Duration>) -> Result<Option<Duration>> {
    match headers.get(GRPC_TIMEOUT_HEADER) {
        Some(value) => {
            let value = value
                .to_str()
                .map_err(|_| GatewayError::InvalidRequest("invalid grpc-timeout".to_string()))?;
            parse_grpc_timeout(value).map(Some)
        }
        None => Ok(default),
    }
}
