//! Command-line and environment configuration

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use meshprobe_mutation::annotations::DEFAULT_HELPER_IMAGE;
use meshprobe_mutation::RewriterConfig;

use crate::{Error, Result};

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Human-readable text
    Text,
}

/// Meshprobe - rewrites HTTP probes of mesh pods into curl exec probes
#[derive(Parser, Debug, Clone)]
#[command(name = "meshprobe-webhook", version, about, long_about = None)]
pub struct Config {
    /// Address the webhook listens on
    #[arg(long, env = "MESHPROBE_LISTEN_ADDR", default_value = "0.0.0.0:8443")]
    pub listen_addr: SocketAddr,

    /// Path to the PEM-encoded serving certificate
    #[arg(long, env = "MESHPROBE_TLS_CERT")]
    pub tls_cert: Option<PathBuf>,

    /// Path to the PEM-encoded private key
    #[arg(long, env = "MESHPROBE_TLS_KEY")]
    pub tls_key: Option<PathBuf>,

    /// Image for injected probe helper containers
    #[arg(long, env = "MESHPROBE_HELPER_IMAGE", default_value = DEFAULT_HELPER_IMAGE)]
    pub helper_image: String,

    /// Do not store replaced probes in pod annotations
    #[arg(long)]
    pub no_probe_backup: bool,

    /// Log output format
    #[arg(long, env = "MESHPROBE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

/// Certificate and key paths for serving TLS
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsPaths {
    /// Certificate chain (PEM)
    pub cert: PathBuf,
    /// Private key (PEM)
    pub key: PathBuf,
}

impl Config {
    /// TLS paths, if configured.
    ///
    /// Certificate and key must be given together.
    pub fn tls(&self) -> Result<Option<TlsPaths>> {
        match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => Ok(Some(TlsPaths {
                cert: cert.clone(),
                key: key.clone(),
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::Config(
                "--tls-cert requires --tls-key".to_string(),
            )),
            (None, Some(_)) => Err(Error::Config(
                "--tls-key requires --tls-cert".to_string(),
            )),
        }
    }

    /// Probe rewriter settings derived from the command line
    pub fn rewriter_config(&self) -> RewriterConfig {
        RewriterConfig {
            helper_image: self.helper_image.clone(),
            backup_probes: !self.no_probe_backup,
        }
    }
}
