// Error types for speech-gateway
// Author: kelexine (https://github.com/kelexine)

use crate::transcode::status::status_response;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tonic::Code;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("unsupported network type {0:?}")]
    UnsupportedNetwork(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] prost_reflect::DescriptorError),

    #[error("Backend error: {}", .0.message())]
    Rpc(#[from] tonic::Status),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Method Not Allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The gRPC status this error is reported as to HTTP clients.
    pub fn to_status(&self) -> tonic::Status {
        match self {
            GatewayError::Rpc(status) => status.clone(),
            GatewayError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg.clone()),
            GatewayError::PayloadTooLarge(msg) => tonic::Status::resource_exhausted(msg.clone()),
            GatewayError::NotFound(_) => tonic::Status::not_found("Not Found"),
            GatewayError::MethodNotAllowed(_) => tonic::Status::unimplemented("Method Not Allowed"),
            GatewayError::Transport(e) => tonic::Status::unavailable(e.to_string()),
            _ => tonic::Status::internal(self.to_string()),
        }
    }

    /// HTTP status for this error. Mirrors the gRPC code mapping except for
    /// routing and body size failures, which keep their HTTP meaning.
    pub fn http_status(&self) -> StatusCode {
        match self {
            GatewayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => crate::transcode::status::http_status_from_code(self.to_status().code()),
        }
    }
}

// Convert GatewayError to HTTP responses for Axum
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.to_status();
        if status.code() == Code::Internal {
            tracing::error!("Gateway error: {}", self);
        }
        status_response(self.http_status(), &status)
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
