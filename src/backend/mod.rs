//! Client connection to the gRPC backend.
//!
//! The backend is reached over plaintext HTTP/2, either on a TCP address or
//! on a Unix domain socket. Connections are established lazily: dialing never
//! waits for the backend, and an unreachable backend shows up as
//! `UNAVAILABLE` on the individual calls.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::BackendConfig;
use crate::error::{GatewayError, Result};
use hyper_util::rt::TokioIo;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;
use tracing::info;

/// Transport used to reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Tcp,
    Unix,
}

impl FromStr for Network {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "unix" => Ok(Network::Unix),
            other => Err(GatewayError::UnsupportedNetwork(other.to_string())),
        }
    }
}

/// Open a client connection to the backend described by `config`.
pub fn dial(config: &BackendConfig) -> Result<Channel> {
    let network: Network = config.network.parse()?;
    let connect_timeout = Duration::from_secs(config.connect_timeout_seconds);

    info!("Dialing gRPC backend {} over {}", config.endpoint, config.network);
    match network {
        Network::Tcp => dial_tcp(&config.endpoint, connect_timeout),
        Network::Unix => dial_unix(&config.endpoint, connect_timeout),
    }
}

/// Creates a client connection via TCP.
/// `addr` must be a valid TCP address with a port number.
pub fn dial_tcp(addr: &str, connect_timeout: Duration) -> Result<Channel> {
    if addr.is_empty() {
        return Err(GatewayError::InvalidEndpoint("empty TCP address".to_string()));
    }
    let uri = if addr.starts_with("http://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    };

    let endpoint = Endpoint::from_shared(uri)
        .map_err(|e| GatewayError::InvalidEndpoint(format!("{}: {}", addr, e)))?;
    Ok(configure(endpoint, connect_timeout).connect_lazy())
}

/// Creates a client connection via a unix domain socket.
/// `addr` must be a valid path to the socket.
pub fn dial_unix(addr: &str, connect_timeout: Duration) -> Result<Channel> {
    let path = PathBuf::from(addr.strip_prefix("unix://").unwrap_or(addr));
    if path.as_os_str().is_empty() {
        return Err(GatewayError::InvalidEndpoint("empty socket path".to_string()));
    }

    // The URI is required by the endpoint but never resolved; every
    // connection attempt goes through the socket path.
    let endpoint = Endpoint::from_static("http://[::]:50051");
    let channel = configure(endpoint, connect_timeout).connect_with_connector_lazy(service_fn(
        move |_: Uri| {
            let path = path.clone();
            async move { Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(path).await?)) }
        },
    ));
    Ok(channel)
}

fn configure(endpoint: Endpoint, connect_timeout: Duration) -> Endpoint {
    if connect_timeout.is_zero() {
        endpoint
    } else {
        endpoint.connect_timeout(connect_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parsing() {
        assert_eq!("tcp".parse::<Network>().unwrap(), Network::Tcp);
        assert_eq!("unix".parse::<Network>().unwrap(), Network::Unix);
    }

    #[test]
    fn test_unsupported_network_message() {
        let err = "udp".parse::<Network>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported network type \"udp\"");
    }

    #[tokio::test]
    async fn test_dial_is_lazy() {
        // Nothing listens here; dialing must still succeed.
        let config = BackendConfig {
            endpoint: "127.0.0.1:1".to_string(),
            ..Default::default()
        };
        assert!(dial(&config).is_ok());
    }

    #[tokio::test]
    async fn test_dial_rejects_empty_socket_path() {
        let config = BackendConfig {
            network: "unix".to_string(),
            endpoint: "unix://".to_string(),
            ..Default::default()
        };
        assert!(matches!(dial(&config), Err(GatewayError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_dial_rejects_malformed_tcp_address() {
        assert!(matches!(
            dial_tcp("not a host:port", Duration::from_secs(1)),
            Err(GatewayError::InvalidEndpoint(_))
        ));
    }
}
