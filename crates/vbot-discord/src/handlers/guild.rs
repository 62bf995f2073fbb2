use serenity::all::{ChannelType, Context, Guild};

use vbot_core::{cards, domain::ChannelId, ports::GuildPort};

use crate::{router::AppState, DiscordGuilds};

/// Where the welcome card goes: the system channel, else the topmost text channel.
fn welcome_channel(guild: &Guild) -> Option<ChannelId> {
    if let Some(id) = guild.system_channel_id {
        return Some(ChannelId(id.get()));
    }
    guild
        .channels
        .values()
        .filter(|c| c.kind == ChannelType::Text)
        .min_by_key(|c| (c.position, c.id))
        .map(|c| ChannelId(c.id.get()))
}

pub async fn handle_guild_join(state: &AppState, ctx: Context, guild: Guild) {
    tracing::info!(guild = %guild.id, name = %guild.name, "joined guild");

    let Some(channel) = welcome_channel(&guild) else {
        tracing::warn!(guild = %guild.id, "no channel for welcome message");
        return;
    };

    let guilds = DiscordGuilds::new(ctx.http.clone(), ctx.cache.clone());
    let card = cards::welcome(&state.cfg.brand_name);
    if let Err(e) = guilds.send_card(channel, &card, None).await {
        tracing::error!(guild = %guild.id, error = %e, "failed to send welcome message");
    }
}
