//! The HTTP -> gRPC gateway.
//!
//! A [`Gateway`] owns the backend channel and a [`ServeMux`] mapping HTTP
//! routes to RPC methods. Each request is decoded from JSON into the
//! method's input message, sent to the backend and the reply translated
//! back to JSON. Streaming methods use newline-delimited JSON on both sides.
//!
//! # Components
//!
//! - `mux`: Route table and lookup.
//! - `speech`: The speech service's route registrations.
//! - `forward`: Per-request translation for all four RPC shapes.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod forward;
mod mux;
mod speech;

pub use mux::{Binding, RpcKind, ServeMux};
pub use speech::{register_speech_handler, RECOGNIZE_PATH, STREAMING_RECOGNIZE_PATH};

use crate::error::Result;
use crate::proto::descriptor_pool;
use prost_reflect::DescriptorPool;
use std::time::Duration;
use tonic::transport::Channel;
use tracing::info;

/// Adds one service's routes to a mux.
pub type Registration = fn(&mut ServeMux, &DescriptorPool) -> Result<()>;

const REGISTRATIONS: &[Registration] = &[register_speech_handler];

#[derive(Debug, Clone)]
pub struct Gateway {
    mux: ServeMux,
    channel: Channel,
    default_timeout: Option<Duration>,
}

impl Gateway {
    pub fn new(mux: ServeMux, channel: Channel) -> Self {
        Self {
            mux,
            channel,
            default_timeout: None,
        }
    }

    /// Deadline for calls whose request carries no `Grpc-Timeout` header.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn mux(&self) -> &ServeMux {
        &self.mux
    }
}

/// Build a gateway translating HTTP into gRPC calls on `channel`.
pub fn new_gateway(channel: Channel) -> Result<Gateway> {
    let pool = descriptor_pool()?;
    let mut mux = ServeMux::new();

    for register in REGISTRATIONS {
        register(&mut mux, pool)?;
    }
    for binding in mux.bindings() {
        info!("Registered {} {} -> {}", binding.http_method, binding.path, binding.grpc_path);
    }

    Ok(Gateway::new(mux, channel))
}
