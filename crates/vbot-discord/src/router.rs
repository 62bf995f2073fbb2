use std::sync::Arc;

use serenity::all::{Client, GatewayIntents};

use vbot_core::{config::Config, dispatch::CommandDispatcher, ports::VerificationApi};

use crate::handlers::Handler;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub dispatcher: Arc<CommandDispatcher>,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, api: Arc<dyn VerificationApi>) -> Self {
        let dispatcher = Arc::new(CommandDispatcher::new(api, cfg.clone()));
        Self { cfg, dispatcher }
    }
}

/// Connect to the gateway and serve events until the client shuts down.
pub async fn run(cfg: Arc<Config>, api: Arc<dyn VerificationApi>) -> anyhow::Result<()> {
    // GUILD_MEMBERS is privileged and must be enabled in the developer portal.
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS | GatewayIntents::GUILD_MESSAGES;

    let state = Arc::new(AppState::new(cfg.clone(), api));
    let mut client = Client::builder(&cfg.discord_bot_token, intents)
        .event_handler(Handler::new(state))
        .await?;

    tracing::info!("starting discord client");
    client.start().await?;
    Ok(())
}
