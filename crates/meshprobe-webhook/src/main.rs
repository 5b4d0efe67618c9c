//! Meshprobe webhook - rewrites HTTP probes of mesh pods into curl exec probes

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use meshprobe_mutation::{MutatorPipeline, ProbeRewriter};
use meshprobe_webhook::config::Config;
use meshprobe_webhook::server::serve;
use meshprobe_webhook::telemetry::init_telemetry;
use meshprobe_webhook::webhook::WebhookState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install crypto provider before any TLS configuration is built
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("CRITICAL: Failed to install crypto provider: {:?}", e);
        std::process::exit(1);
    }

    let config = Config::parse();
    init_telemetry(config.log_format)?;

    let rewriter = ProbeRewriter::new(config.rewriter_config());
    info!(
        helper_image = %rewriter.config().helper_image,
        probe_backup = rewriter.config().backup_probes,
        "Probe rewriter configured"
    );

    let pipeline = MutatorPipeline::new().with(rewriter);
    info!(mutators = ?pipeline.names(), "Pod mutators registered");

    serve(&config, Arc::new(WebhookState::new(pipeline))).await?;
    Ok(())
}
