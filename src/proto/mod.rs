//! Protobuf definitions compiled by `build.rs`.
//!
//! The typed messages and server stubs mirror the backend's schema. The
//! gateway itself works off [`descriptor_pool`], which carries the same
//! schema as runtime reflection data for JSON translation.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::error::{GatewayError, Result};
use once_cell::sync::OnceCell;
use prost_reflect::DescriptorPool;

pub mod tiro {
    pub mod speech {
        pub mod v1alpha {
            tonic::include_proto!("tiro.speech.v1alpha");
        }
    }
}

pub mod google {
    pub mod rpc {
        tonic::include_proto!("google.rpc");
    }
}

/// Serialized `FileDescriptorSet` for every compiled proto and its imports.
pub const FILE_DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/speech_descriptor.bin"));

/// Fully qualified name of the speech service.
pub const SPEECH_SERVICE: &str = "tiro.speech.v1alpha.Speech";

/// Fully qualified name of the error envelope message.
pub const RPC_STATUS: &str = "google.rpc.Status";

static DESCRIPTOR_POOL: OnceCell<DescriptorPool> = OnceCell::new();

/// The descriptor pool decoded from [`FILE_DESCRIPTOR_SET`], built on first use.
pub fn descriptor_pool() -> Result<&'static DescriptorPool> {
    DESCRIPTOR_POOL
        .get_or_try_init(|| DescriptorPool::decode(FILE_DESCRIPTOR_SET).map_err(GatewayError::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_contains_speech_service() {
        let pool = descriptor_pool().unwrap();
        let service = pool.get_service_by_name(SPEECH_SERVICE).unwrap();
        let methods: Vec<_> = service.methods().map(|m| m.name().to_string()).collect();
        assert_eq!(methods, vec!["Recognize", "StreamingRecognize"]);
    }

    #[test]
    fn test_pool_contains_error_details() {
        let pool = descriptor_pool().unwrap();
        assert!(pool.get_message_by_name(RPC_STATUS).is_some());
        assert!(pool.get_message_by_name("google.rpc.BadRequest").is_some());
        assert!(pool.get_message_by_name("google.protobuf.Duration").is_some());
    }
}
