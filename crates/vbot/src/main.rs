use std::sync::Arc;

use vbot_core::{api::ApiClient, config::Config, ports::VerificationApi};

#[tokio::main]
async fn main() -> Result<(), vbot_core::Error> {
    vbot_core::logging::init("vbot")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        api = %cfg.api_url,
        delay_ms = cfg.migration_delay.as_millis() as u64,
        progress_every = cfg.progress_every,
        "configuration loaded"
    );

    let api: Arc<dyn VerificationApi> =
        Arc::new(ApiClient::new(cfg.api_url.clone(), cfg.api_timeout)?);

    vbot_discord::router::run(cfg, api)
        .await
        .map_err(|e| vbot_core::Error::External(format!("discord bot failed: {e}")))?;

    Ok(())
}
