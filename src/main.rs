use std::sync::Arc;

use anyhow::Context;

use pricing_assist::config::AppConfig;
use pricing_assist::lookup::{PostalCodeResolver, ViaCepClient};
use pricing_assist::routes::{WizardRouteState, wizard_routes};
use pricing_assist::wizard::session::WizardSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env();

    eprintln!("📋 Pricing Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Wizard API: http://0.0.0.0:{}/api/wizard/status", config.port);
    eprintln!("   Postal codes: {}", config.viacep_base_url);
    eprintln!(
        "   Lookup timeout: {}s\n",
        config.lookup_timeout.as_secs()
    );

    let resolver: Arc<dyn PostalCodeResolver> = Arc::new(
        ViaCepClient::new(&config.viacep_base_url, config.lookup_timeout)
            .context("Failed to build postal-code client")?,
    );

    let session = Arc::new(WizardSession::new(resolver));
    let app = wizard_routes(WizardRouteState { session });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Wizard server started");
    axum::serve(listener, app).await?;

    Ok(())
}
