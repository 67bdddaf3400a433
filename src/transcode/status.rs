// gRPC status -> HTTP error responses
// Author: kelexine (https://github.com/kelexine)

use super::json::to_value;
use super::metadata::forward_response_metadata;
use crate::error::{GatewayError, Result};
use crate::proto::{descriptor_pool, RPC_STATUS};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use prost_reflect::{DynamicMessage, Value as ProtoValue};
use serde_json::{json, Value};
use tonic::{Code, Status};

/// HTTP status corresponding to a gRPC status code.
///
/// See: https://github.com/googleapis/googleapis/blob/master/google/rpc/code.proto
pub fn http_status_from_code(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        // Client Closed Request has no constant
        Code::Cancelled => StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT),
        Code::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists => StatusCode::CONFLICT,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::ResourceExhausted => StatusCode::TOO_MANY_REQUESTS,
        Code::FailedPrecondition => StatusCode::BAD_REQUEST,
        Code::Aborted => StatusCode::CONFLICT,
        Code::OutOfRange => StatusCode::BAD_REQUEST,
        Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        Code::DataLoss => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render a status as a JSON `google.rpc.Status`.
///
/// Details the backend packed into `grpc-status-details-bin` are decoded and
/// emitted with their `@type`. If they cannot be resolved the envelope is
/// still produced with an empty `details` list.
pub fn status_value(status: &Status) -> Value {
    match rpc_status_message(status) {
        Ok(mut message) => match to_value(&message) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Dropping unrenderable error details: {}", e);
                message.clear_field_by_name("details");
                to_value(&message).unwrap_or_else(|_| fallback_value(status))
            }
        },
        Err(e) => {
            tracing::warn!("Rendering status without descriptors: {}", e);
            fallback_value(status)
        }
    }
}

/// Build the HTTP error response for a status.
pub fn status_response(http_status: StatusCode, status: &Status) -> Response {
    let mut response = (http_status, axum::Json(status_value(status))).into_response();
    forward_response_metadata(status.metadata(), response.headers_mut());
    response
}

fn rpc_status_message(status: &Status) -> Result<DynamicMessage> {
    let desc = descriptor_pool()?
        .get_message_by_name(RPC_STATUS)
        .ok_or_else(|| GatewayError::Internal(format!("{} missing from descriptor pool", RPC_STATUS)))?;

    let mut message = if status.details().is_empty() {
        DynamicMessage::new(desc)
    } else {
        DynamicMessage::decode(desc.clone(), status.details()).unwrap_or_else(|e| {
            tracing::debug!("Ignoring malformed status details: {}", e);
            DynamicMessage::new(desc)
        })
    };

    // The transport-level code and message are authoritative.
    message.set_field_by_name("code", ProtoValue::I32(i32::from(status.code())));
    message.set_field_by_name("message", ProtoValue::String(status.message().to_string()));
    Ok(message)
}

fn fallback_value(status: &Status) -> Value {
    json!({
        "code": i32::from(status.code()),
        "message": status.message(),
        "details": [],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::google::rpc::{bad_request::FieldViolation, BadRequest};
    use bytes::Bytes;
    use prost::Message;

    fn packed_bad_request(type_url: &str) -> Bytes {
        let bad_request = BadRequest {
            field_violations: vec![FieldViolation {
                field: "config.language_code".to_string(),
                description: "Field 'language_code' is required.".to_string(),
            }],
        };
        let status = crate::proto::google::rpc::Status {
            code: i32::from(Code::InvalidArgument),
            message: "Invalid request. See details".to_string(),
            details: vec![prost_types::Any {
                type_url: type_url.to_string(),
                value: bad_request.encode_to_vec(),
            }],
        };
        Bytes::from(status.encode_to_vec())
    }

    #[test]
    fn test_code_mapping() {
        assert_eq!(http_status_from_code(Code::InvalidArgument), StatusCode::BAD_REQUEST);
        assert_eq!(http_status_from_code(Code::Unavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(http_status_from_code(Code::DeadlineExceeded), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(http_status_from_code(Code::ResourceExhausted), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(http_status_from_code(Code::Cancelled).as_u16(), 499);
    }

    #[test]
    fn test_plain_status_envelope() {
        let value = status_value(&Status::not_found("no such model"));
        assert_eq!(value["code"], 5);
        assert_eq!(value["message"], "no such model");
        assert_eq!(value["details"], json!([]));
    }

    #[test]
    fn test_details_are_rendered() {
        let status = Status::with_details(
            Code::InvalidArgument,
            "Invalid request. See details",
            packed_bad_request("type.googleapis.com/google.rpc.BadRequest"),
        );
        let value = status_value(&status);
        assert_eq!(value["code"], 3);
        let detail = &value["details"][0];
        assert_eq!(detail["@type"], "type.googleapis.com/google.rpc.BadRequest");
        assert_eq!(detail["fieldViolations"][0]["field"], "config.language_code");
    }

    #[test]
    fn test_custom_type_url_prefix_resolves() {
        let status = Status::with_details(
            Code::InvalidArgument,
            "Invalid request. See details",
            packed_bad_request("types.talgreinir.is/google.rpc.BadRequest"),
        );
        let value = status_value(&status);
        assert_eq!(value["details"][0]["fieldViolations"][0]["field"], "config.language_code");
    }

    #[test]
    fn test_unknown_detail_type_degrades() {
        let status = Status::with_details(
            Code::Internal,
            "boom",
            packed_bad_request("type.googleapis.com/acme.Unknown"),
        );
        let value = status_value(&status);
        assert_eq!(value["code"], 13);
        assert_eq!(value["message"], "boom");
        assert_eq!(value["details"], json!([]));
    }
}
