//! Webhook HTTP(S) server

use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use tracing::{info, warn};

use crate::config::Config;
use crate::webhook::{webhook_router, WebhookState};
use crate::{Error, Result};

/// Serve the webhook until the server fails.
///
/// The API server only calls webhooks over HTTPS; plain HTTP is for local
/// testing when no certificate is configured.
pub async fn serve(config: &Config, state: Arc<WebhookState>) -> Result<()> {
    let app = webhook_router(state);
    let addr = config.listen_addr;

    match config.tls()? {
        Some(tls) => {
            let tls_config = RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                .await
                .map_err(|e| {
                    Error::Tls(format!(
                        "failed to load {} / {}: {}",
                        tls.cert.display(),
                        tls.key.display(),
                        e
                    ))
                })?;

            info!(addr = %addr, "Starting admission webhook (TLS)");

            axum_server::bind_rustls(addr, tls_config)
                .serve(app.into_make_service())
                .await
                .map_err(|e| Error::Server(e.to_string()))?;
        }
        None => {
            warn!(addr = %addr, "No TLS certificate configured, serving plain HTTP");

            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await
                .map_err(|e| Error::Server(e.to_string()))?;
        }
    }

    Ok(())
}
