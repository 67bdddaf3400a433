// speech-gateway - JSON/HTTP to gRPC gateway for the Tiro speech service
// Author: kelexine (https://github.com/kelexine)

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod proto;
pub mod server;
pub mod transcode;
pub mod utils;
