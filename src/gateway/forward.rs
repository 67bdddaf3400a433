// Forwarding of HTTP requests as gRPC calls
// Author: kelexine (https://github.com/kelexine)

use super::mux::{Binding, RpcKind};
use super::Gateway;
use crate::error::{GatewayError, Result};
use crate::transcode::metadata::{call_timeout, forward_response_metadata, outgoing_metadata};
use crate::transcode::{json, status_value, DynamicCodec, JsonStreamDecoder};
use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};
use http_body_util::LengthLimitError;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tonic::client::Grpc;
use tonic::metadata::MetadataMap;
use tonic::{Code, Status, Streaming};
use tracing::{debug, warn};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Resolves when a streamed request body fails to read. The call is then torn
/// down instead of half-closed, so the backend never sees a truncated stream
/// as complete.
type BodyFailure = Pin<Box<dyn Future<Output = GatewayError> + Send>>;

fn body_failure(rx: oneshot::Receiver<GatewayError>) -> BodyFailure {
    Box::pin(async move {
        match rx.await {
            Ok(err) => err,
            // body read to the end
            Err(_) => std::future::pending().await,
        }
    })
}

fn never_fails() -> BodyFailure {
    Box::pin(std::future::pending())
}

impl Gateway {
    /// Translate one HTTP request into a call on the bound RPC method and
    /// translate the outcome back.
    pub async fn forward(&self, req: Request) -> Result<Response> {
        let (parts, body) = req.into_parts();
        let binding = self.mux.lookup(&parts.method, parts.uri.path())?;

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let metadata = outgoing_metadata(&parts.headers, peer);
        let timeout = call_timeout(&parts.headers, self.default_timeout)?;

        debug!(
            "Forwarding {} {} to {} ({:?})",
            parts.method,
            parts.uri.path(),
            binding.grpc_path,
            binding.kind()
        );

        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready().await?;

        let path = binding.grpc_path.clone();
        let codec = DynamicCodec::new(binding.rpc.output());
        let deadline = timeout.map(|t| Instant::now() + t);
        let expired = |status: Status| GatewayError::Rpc(deadline_status(status, deadline));

        match binding.kind() {
            RpcKind::Unary => {
                let message = read_message(binding, body).await?;
                let request = build_request(message, metadata, timeout);
                let response = grpc.unary(request, path, codec).await.map_err(expired)?;
                unary_response(response)
            }
            RpcKind::ServerStreaming => {
                let message = read_message(binding, body).await?;
                let request = build_request(message, metadata, timeout);
                let response = grpc
                    .server_streaming(request, path, codec)
                    .await
                    .map_err(expired)?;
                Ok(streaming_response(response, never_fails(), deadline))
            }
            RpcKind::ClientStreaming => {
                let (tx, rx) = oneshot::channel();
                let mut failed = body_failure(rx);
                let messages = request_stream(binding.rpc.input(), body, tx);
                let request = build_request(messages, metadata, timeout);
                let response = tokio::select! {
                    response = grpc.client_streaming(request, path, codec) => response.map_err(expired)?,
                    err = &mut failed => return Err(err),
                };
                unary_response(response)
            }
            RpcKind::BidiStreaming => {
                let (tx, rx) = oneshot::channel();
                let mut failed = body_failure(rx);
                let messages = request_stream(binding.rpc.input(), body, tx);
                let request = build_request(messages, metadata, timeout);
                let response = tokio::select! {
                    response = grpc.streaming(request, path, codec) => response.map_err(expired)?,
                    err = &mut failed => return Err(err),
                };
                Ok(streaming_response(response, failed, deadline))
            }
        }
    }
}

/// The client enforces deadlines by cancelling the call; report that the way
/// the backend would.
fn deadline_status(status: Status, deadline: Option<Instant>) -> Status {
    match deadline {
        Some(deadline) if status.code() == Code::Cancelled && Instant::now() >= deadline => {
            Status::deadline_exceeded(status.message().to_string())
        }
        _ => status,
    }
}

fn body_error(e: axum::Error) -> GatewayError {
    if is_length_limit(&e) {
        GatewayError::PayloadTooLarge("request body exceeds the configured limit".to_string())
    } else {
        GatewayError::InvalidRequest(format!("failed to read request body: {}", e))
    }
}

fn is_length_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<LengthLimitError>() {
            return true;
        }
        current = err.source();
    }
    false
}

fn build_request<T>(message: T, metadata: MetadataMap, timeout: Option<Duration>) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    *request.metadata_mut() = metadata;
    if let Some(timeout) = timeout {
        request.set_timeout(timeout);
    }
    request
}

async fn read_message(binding: &Binding, body: Body) -> Result<DynamicMessage> {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.map_err(body_error)?;
    json::decode_body(binding.rpc.input(), &bytes)
}

/// Messages decoded from a body of consecutive JSON values.
///
/// The stream ends at the end of the body, or early on the first value that
/// does not decode; the backend then sees a half-closed request stream. If
/// the body itself fails (too large, connection lost) the failure is sent on
/// `failed` and the stream never ends.
fn request_stream(
    desc: MessageDescriptor,
    body: Body,
    failed: oneshot::Sender<GatewayError>,
) -> impl Stream<Item = DynamicMessage> + Send + 'static {
    async_stream::stream! {
        let mut chunks = body.into_data_stream();
        let mut decoder = JsonStreamDecoder::new();

        'read: loop {
            match chunks.next().await {
                Some(Ok(chunk)) => decoder.push(&chunk),
                Some(Err(e)) => {
                    warn!("Failed to read request stream: {}", e);
                    let _ = failed.send(body_error(e));
                    std::future::pending::<()>().await;
                    break;
                }
                None => {
                    if let Err(e) = decoder.finish() {
                        warn!("Failed to decode request: {}", e);
                    }
                    break;
                }
            }

            loop {
                match decoder.next_value() {
                    Ok(Some(value)) => match json::decode_value(desc.clone(), value) {
                        Ok(message) => yield message,
                        Err(e) => {
                            warn!("Failed to decode request: {}", e);
                            break 'read;
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to decode request: {}", e);
                        break 'read;
                    }
                }
            }
        }
    }
}

fn unary_response(response: tonic::Response<DynamicMessage>) -> Result<Response> {
    let (metadata, message, _) = response.into_parts();
    let body = json::to_vec(&message)?;

    let mut response = ([(CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response();
    forward_response_metadata(&metadata, response.headers_mut());
    Ok(response)
}

/// Newline-delimited JSON: one `{"result": ...}` per message, and a final
/// `{"error": ...}` if the call or the request body fails midway.
fn streaming_response(
    response: tonic::Response<Streaming<DynamicMessage>>,
    mut failed: BodyFailure,
    deadline: Option<Instant>,
) -> Response {
    let (metadata, mut messages, _) = response.into_parts();

    let lines = async_stream::stream! {
        let mut count = 0usize;
        loop {
            let next = tokio::select! {
                next = messages.message() => next.map_err(|status| deadline_status(status, deadline)),
                err = &mut failed => Err(err.to_status()),
            };
            match next {
                Ok(Some(message)) => match json::to_value(&message) {
                    Ok(result) => {
                        count += 1;
                        yield Ok::<Bytes, Infallible>(ndjson_line(json!({ "result": result })));
                    }
                    Err(e) => {
                        yield Ok(ndjson_line(json!({ "error": status_value(&e.to_status()) })));
                        break;
                    }
                },
                Ok(None) => break,
                Err(status) => {
                    warn!("Stream error: {}", status.message());
                    yield Ok(ndjson_line(json!({ "error": status_value(&status) })));
                    break;
                }
            }
        }
        debug!("Response stream ended after {} messages", count);
    };

    let mut response = ([(CONTENT_TYPE, JSON_CONTENT_TYPE)], Body::from_stream(lines)).into_response();
    forward_response_metadata(&metadata, response.headers_mut());
    response
}

fn ndjson_line(value: Value) -> Bytes {
    let mut line = value.to_string().into_bytes();
    line.push(b'\n');
    Bytes::from(line)
}
