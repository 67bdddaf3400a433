// JSON <-> protobuf translation
// Author: kelexine (https://github.com/kelexine)

use crate::error::{GatewayError, Result};
use bytes::{Buf, BytesMut};
use prost_reflect::{DeserializeOptions, DynamicMessage, MessageDescriptor, SerializeOptions};
use serde_json::Value;

fn serialize_options() -> SerializeOptions {
    // lowerCamelCase names, unpopulated fields included
    SerializeOptions::new().skip_default_fields(false)
}

fn deserialize_options() -> DeserializeOptions {
    DeserializeOptions::new().deny_unknown_fields(false)
}

/// Parse a request body into a message. An empty (or all-whitespace) body
/// yields the default message.
pub fn decode_body(desc: MessageDescriptor, body: &[u8]) -> Result<DynamicMessage> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(DynamicMessage::new(desc));
    }

    let mut de = serde_json::Deserializer::from_slice(body);
    let message = DynamicMessage::deserialize_with_options(desc, &mut de, &deserialize_options())
        .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
    de.end()
        .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
    Ok(message)
}

/// Convert an already parsed JSON value into a message.
pub fn decode_value(desc: MessageDescriptor, value: Value) -> Result<DynamicMessage> {
    DynamicMessage::deserialize_with_options(desc, value, &deserialize_options())
        .map_err(|e| GatewayError::InvalidRequest(e.to_string()))
}

// A backend reply that cannot be rendered is an internal error.
fn encode_error(e: serde_json::Error) -> GatewayError {
    GatewayError::Internal(format!("failed to encode response: {}", e))
}

pub fn to_value(message: &DynamicMessage) -> Result<Value> {
    message
        .serialize_with_options(serde_json::value::Serializer, &serialize_options())
        .map_err(encode_error)
}

pub fn to_vec(message: &DynamicMessage) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::new(&mut out);
    message
        .serialize_with_options(&mut ser, &serialize_options())
        .map_err(encode_error)?;
    Ok(out)
}

/// Incremental splitter for a body made of consecutive JSON values.
///
/// Values may be separated by newlines or any other whitespace. Bytes are
/// pushed as they arrive; complete values are popped off the front. Each
/// byte is scanned once for the end of the leading value, and the value is
/// only parsed once that end has been seen.
#[derive(Debug, Default)]
pub struct JsonStreamDecoder {
    buf: BytesMut,
    scanned: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
    in_number: bool,
}

impl JsonStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete value, `Ok(None)` if more input is needed.
    pub fn next_value(&mut self) -> Result<Option<Value>> {
        if !self.scan() {
            return Ok(None);
        }

        let (next, consumed) = {
            let mut values = serde_json::Deserializer::from_slice(&self.buf).into_iter::<Value>();
            let next = values.next();
            (next, values.byte_offset())
        };
        match next {
            Some(Ok(value)) => {
                self.buf.advance(consumed);
                self.reset();
                Ok(Some(value))
            }
            // a bare literal cut short, e.g. `tru`
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(e)) => Err(GatewayError::InvalidRequest(e.to_string())),
            None => {
                self.buf.clear();
                self.reset();
                Ok(None)
            }
        }
    }

    /// Called once the body has ended. Trailing garbage is an error.
    pub fn finish(&mut self) -> Result<()> {
        if self.buf.iter().all(u8::is_ascii_whitespace) {
            Ok(())
        } else {
            Err(GatewayError::InvalidRequest(
                "unexpected end of request stream".to_string(),
            ))
        }
    }

    fn reset(&mut self) {
        self.scanned = 0;
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
        self.in_number = false;
    }

    /// Scan newly pushed bytes. True once the leading value may be complete.
    fn scan(&mut self) -> bool {
        while self.scanned < self.buf.len() {
            let byte = self.buf[self.scanned];

            if self.in_number {
                if matches!(byte, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E') {
                    self.scanned += 1;
                    continue;
                }
                return true;
            }

            self.scanned += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return true;
                    }
                }
                continue;
            }

            match byte {
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    // an unbalanced closer is reported by the parser
                    if self.depth <= 1 {
                        return true;
                    }
                    self.depth -= 1;
                }
                b'"' => self.in_string = true,
                _ if self.depth > 0 || byte.is_ascii_whitespace() => {}
                b'0'..=b'9' | b'-' => self.in_number = true,
                // literals and garbage are short; let the parser decide
                _ => return true,
            }
        }
        false
    }
}
