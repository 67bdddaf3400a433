// Speech service HTTP bindings
// Author: kelexine (https://github.com/kelexine)

use super::mux::ServeMux;
use crate::error::{GatewayError, Result};
use crate::proto::SPEECH_SERVICE;
use axum::http::Method;
use prost_reflect::DescriptorPool;

pub const RECOGNIZE_PATH: &str = "/v1alpha/speech:recognize";
pub const STREAMING_RECOGNIZE_PATH: &str = "/v1alpha/speech:streamingrecognize";

const ROUTES: &[(&str, &str)] = &[
    (RECOGNIZE_PATH, "Recognize"),
    (STREAMING_RECOGNIZE_PATH, "StreamingRecognize"),
];

/// Register the HTTP routes of `tiro.speech.v1alpha.Speech` on `mux`.
pub fn register_speech_handler(mux: &mut ServeMux, pool: &DescriptorPool) -> Result<()> {
    let service = pool
        .get_service_by_name(SPEECH_SERVICE)
        .ok_or_else(|| GatewayError::Internal(format!("service {} not in descriptor pool", SPEECH_SERVICE)))?;

    for (path, name) in ROUTES {
        let method = service
            .methods()
            .find(|m| m.name() == *name)
            .ok_or_else(|| GatewayError::Internal(format!("{}/{} not in descriptor pool", SPEECH_SERVICE, name)))?;
        mux.handle(Method::POST, path, method)?;
    }
    Ok(())
}
