// HTTP middleware
// Author: kelexine (https://github.com/kelexine)

use crate::transcode::metadata::REQUEST_ID_HEADER;
use axum::http::HeaderName;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Request id layers. The id is generated before routing so the gateway can
/// pass it on to the backend as call metadata.
pub fn request_id_layers() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);
    (
        SetRequestIdLayer::new(header.clone(), MakeRequestUuid),
        PropagateRequestIdLayer::new(header),
    )
}
