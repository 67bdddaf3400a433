//! Configuration data structures for speech-gateway.
//!
//! This module defines the schema for the application settings: the HTTP
//! listener, the gRPC backend to dial and the logging setup.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// The gRPC backend requests are forwarded to.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen at. A bare `:PORT` listens on all interfaces.
    /// Default: `:8080`
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Upper bound on request body size in bytes.
    /// Default: 50 MiB (base64 audio content is large)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Settings for the upstream gRPC connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// One of `tcp` or `unix`. Must be consistent with `endpoint`.
    /// Default: `tcp`
    #[serde(default = "default_network")]
    pub network: String,

    /// `host:port` for `tcp`, a socket path for `unix`.
    /// Default: `localhost:9090`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Timeout for establishing a connection, in seconds.
    /// Default: `10`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Deadline applied to calls that carry no `Grpc-Timeout` header.
    /// Default: `0` (no deadline)
    #[serde(default)]
    pub request_timeout_seconds: u64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl ServerConfig {
    /// The listen address in a form `TcpListener::bind` accepts.
    pub fn bind_addr(&self) -> String {
        if self.listen_addr.starts_with(':') {
            format!("0.0.0.0{}", self.listen_addr)
        } else {
            self.listen_addr.clone()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            endpoint: default_endpoint(),
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_listen_addr() -> String {
    ":8080".to_string()
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_network() -> String {
    "tcp".to_string()
}

fn default_endpoint() -> String {
    "localhost:9090".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_port_binds_all_interfaces() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_host_port_is_kept() {
        let server = ServerConfig {
            listen_addr: "127.0.0.1:3000".to_string(),
            ..Default::default()
        };
        assert_eq!(server.bind_addr(), "127.0.0.1:3000");
    }
}
