// HTTP route table for RPC methods
// Author: kelexine (https://github.com/kelexine)

use crate::error::{GatewayError, Result};
use axum::http::Method;
use prost_reflect::MethodDescriptor;
use tonic::codegen::http::uri::PathAndQuery;

/// Call shape of an RPC method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcKind {
    Unary,
    ServerStreaming,
    ClientStreaming,
    BidiStreaming,
}

impl RpcKind {
    pub fn of(method: &MethodDescriptor) -> Self {
        match (method.is_client_streaming(), method.is_server_streaming()) {
            (false, false) => RpcKind::Unary,
            (false, true) => RpcKind::ServerStreaming,
            (true, false) => RpcKind::ClientStreaming,
            (true, true) => RpcKind::BidiStreaming,
        }
    }
}

/// One HTTP route bound to an RPC method. The whole request body maps onto
/// the method's input message.
#[derive(Debug, Clone)]
pub struct Binding {
    pub http_method: Method,
    pub path: String,
    pub rpc: MethodDescriptor,
    pub grpc_path: PathAndQuery,
}

impl Binding {
    pub fn kind(&self) -> RpcKind {
        RpcKind::of(&self.rpc)
    }
}

/// Ordered table of HTTP routes -> RPC methods.
#[derive(Debug, Clone, Default)]
pub struct ServeMux {
    bindings: Vec<Binding>,
}

impl ServeMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `http_method path` to `rpc`. Binding the same route twice is an error.
    pub fn handle(&mut self, http_method: Method, path: &str, rpc: MethodDescriptor) -> Result<()> {
        if self
            .bindings
            .iter()
            .any(|b| b.http_method == http_method && b.path == path)
        {
            return Err(GatewayError::Config(format!(
                "duplicate route {} {}",
                http_method, path
            )));
        }

        let grpc_path = format!("/{}/{}", rpc.parent_service().full_name(), rpc.name());
        let grpc_path = PathAndQuery::try_from(grpc_path)
            .map_err(|e| GatewayError::Internal(format!("invalid method path: {}", e)))?;

        self.bindings.push(Binding {
            http_method,
            path: path.to_string(),
            rpc,
            grpc_path,
        });
        Ok(())
    }

    /// Find the binding for a request.
    ///
    /// A path bound only under other methods is `MethodNotAllowed`, an
    /// unbound path is `NotFound`.
    pub fn lookup(&self, http_method: &Method, path: &str) -> Result<&Binding> {
        let path = unescape_colons(path);
        let mut path_matched = false;

        for binding in &self.bindings {
            if binding.path != path {
                continue;
            }
            if binding.http_method == *http_method {
                return Ok(binding);
            }
            path_matched = true;
        }

        if path_matched {
            Err(GatewayError::MethodNotAllowed(format!("{} {}", http_method, path)))
        } else {
            Err(GatewayError::NotFound(path))
        }
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

// Custom verbs (`:recognize`) are often sent percent-encoded.
fn unescape_colons(path: &str) -> String {
    path.replace("%3A", ":").replace("%3a", ":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{descriptor_pool, SPEECH_SERVICE};

    fn method(name: &str) -> MethodDescriptor {
        descriptor_pool()
            .unwrap()
            .get_service_by_name(SPEECH_SERVICE)
            .unwrap()
            .methods()
            .find(|m| m.name() == name)
            .unwrap()
    }

    fn mux() -> ServeMux {
        let mut mux = ServeMux::new();
        mux.handle(Method::POST, "/v1alpha/speech:recognize", method("Recognize"))
            .unwrap();
        mux
    }

    #[test]
    fn test_rpc_kinds() {
        assert_eq!(RpcKind::of(&method("Recognize")), RpcKind::Unary);
        assert_eq!(RpcKind::of(&method("StreamingRecognize")), RpcKind::BidiStreaming);
    }

    #[test]
    fn test_lookup_match() {
        let mux = mux();
        let binding = mux.lookup(&Method::POST, "/v1alpha/speech:recognize").unwrap();
        assert_eq!(binding.grpc_path.as_str(), "/tiro.speech.v1alpha.Speech/Recognize");
        assert_eq!(binding.kind(), RpcKind::Unary);
    }

    #[test]
    fn test_lookup_percent_encoded_verb() {
        let mux = mux();
        assert!(mux.lookup(&Method::POST, "/v1alpha/speech%3Arecognize").is_ok());
    }

    #[test]
    fn test_lookup_wrong_method() {
        let mux = mux();
        let err = mux.lookup(&Method::GET, "/v1alpha/speech:recognize").unwrap_err();
        assert!(matches!(err, GatewayError::MethodNotAllowed(_)));
    }

    #[test]
    fn test_lookup_unknown_path() {
        let mux = mux();
        let err = mux.lookup(&Method::POST, "/v1alpha/speech").unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut mux = mux();
        assert!(mux
            .handle(Method::POST, "/v1alpha/speech:recognize", method("Recognize"))
            .is_err());
        assert_eq!(mux.bindings().len(), 1);
    }
}
