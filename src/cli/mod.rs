// CLI module for speech-gateway
// Author: kelexine (https://github.com/kelexine)

use clap::Parser;
use std::path::PathBuf;

/// speech-gateway - JSON/HTTP to gRPC gateway for the speech service
///
/// Flags left unset fall back to `SPEECH_GATEWAY__*` environment variables,
/// then to the config file, then to built-in defaults.
#[derive(Parser, Debug, Default)]
#[command(name = "speech-gateway", version, about, long_about = None)]
pub struct Args {
    /// Address to listen at [default: :8080]
    #[arg(long, visible_alias = "listenaddr")]
    pub listen_addr: Option<String>,

    /// One of "tcp" or "unix". Must be consistent to --endpoint [default: tcp]
    #[arg(long)]
    pub network: Option<String>,

    /// Endpoint of the gRPC service [default: localhost:9090]
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Path to a TOML config file [default: ~/.speech-gateway/config.toml]
    #[arg(long, env = "SPEECH_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_default_to_unset() {
        let args = Args::parse_from(["speech-gateway"]);
        assert!(args.listen_addr.is_none());
        assert!(args.network.is_none());
        assert!(args.endpoint.is_none());
    }

    #[test]
    fn test_listenaddr_alias() {
        let args = Args::parse_from([
            "speech-gateway",
            "--listenaddr",
            ":9000",
            "--network",
            "unix",
            "--endpoint",
            "/run/speech.sock",
        ]);
        assert_eq!(args.listen_addr.as_deref(), Some(":9000"));
        assert_eq!(args.network.as_deref(), Some("unix"));
        assert_eq!(args.endpoint.as_deref(), Some("/run/speech.sock"));
    }
}
