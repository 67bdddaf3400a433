//! Build script for speech-gateway.
//!
//! Compiles the speech service and `google.rpc` protobuf definitions with
//! tonic-build and writes a file descriptor set next to the generated code.
//! The descriptor set drives the JSON <-> protobuf translation at runtime;
//! the generated server stubs back the in-process test backend.

use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .file_descriptor_set_path(out_dir.join("speech_descriptor.bin"))
        .compile_protos(
            &[
                "proto/tiro/speech/v1alpha/speech.proto",
                "proto/google/rpc/status.proto",
                "proto/google/rpc/error_details.proto",
            ],
            &["proto"],
        )?;

    Ok(())
}
