//! Gateway event handlers.
//!
//! Each handler converts serenity types into `vbot-core` values and hands off
//! to the core; nothing here decides command semantics.

use std::sync::Arc;

use serenity::all::{ActivityData, Command, Context, EventHandler, Guild, Interaction, Ready};
use serenity::async_trait;

use crate::router::AppState;

mod commands;
mod guild;

pub struct Handler {
    state: Arc<AppState>,
}

impl Handler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected to discord");

        ctx.set_activity(Some(ActivityData::watching("for /verify commands")));

        match Command::set_global_commands(&ctx.http, commands::registrations()).await {
            Ok(registered) => tracing::info!(count = registered.len(), "slash commands synced"),
            Err(e) => tracing::error!(error = %e, "failed to sync slash commands"),
        }
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: Option<bool>) {
        if is_new != Some(true) {
            return;
        }
        guild::handle_guild_join(&self.state, ctx, guild).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            commands::handle_command(&self.state, ctx, command).await;
        }
    }
}
