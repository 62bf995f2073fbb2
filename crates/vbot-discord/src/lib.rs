//! Discord adapter (serenity).
//!
//! Implements the `vbot-core` guild and interaction ports over the Discord
//! HTTP API and gateway cache.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;

use serenity::all::{
    Cache, Colour, CommandInteraction, CreateActionRow, CreateButton, CreateEmbed,
    CreateEmbedFooter, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EditInteractionResponse, Guild, Http,
    HttpError, Member, Timestamp,
};

pub mod handlers;
pub mod router;

use vbot_core::{
    domain::{ChannelId, GuildId, GuildRef, RoleId, UserId},
    errors::Error,
    messaging::{
        port::InteractionPort,
        types::{Card, LinkButton, Reply},
    },
    ports::{GuildInfo, GuildPort, MemberInfo},
    Result,
};

/// Discord JSON error code for an interaction token that is gone.
const UNKNOWN_INTERACTION: isize = 10062;

fn map_err(e: serenity::Error) -> Error {
    match &e {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp))
            if resp.error.code == UNKNOWN_INTERACTION =>
        {
            Error::InteractionExpired
        }
        _ => Error::Platform(e.to_string()),
    }
}

fn is_not_found(e: &serenity::Error) -> bool {
    matches!(
        e,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp))
            if resp.status_code.as_u16() == 404
    )
}

fn dc_guild(id: GuildId) -> serenity::all::GuildId {
    serenity::all::GuildId::new(id.0)
}

fn dc_user(id: UserId) -> serenity::all::UserId {
    serenity::all::UserId::new(id.0)
}

fn dc_role(id: RoleId) -> serenity::all::RoleId {
    serenity::all::RoleId::new(id.0)
}

fn dc_channel(id: ChannelId) -> serenity::all::ChannelId {
    serenity::all::ChannelId::new(id.0)
}

pub fn guild_ref(guild: &Guild) -> GuildRef {
    GuildRef {
        id: GuildId(guild.id.get()),
        name: guild.name.clone(),
        icon_url: guild.icon_url(),
    }
}

pub fn embed(card: &Card) -> CreateEmbed {
    let mut e = CreateEmbed::new()
        .title(&card.title)
        .colour(Colour::new(card.tone.rgb()));
    if let Some(description) = &card.description {
        e = e.description(description);
    }
    for field in &card.fields {
        e = e.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &card.footer {
        e = e.footer(CreateEmbedFooter::new(footer));
    }
    if let Some(url) = &card.thumbnail_url {
        e = e.thumbnail(url);
    }
    if card.timestamp {
        e = e.timestamp(Timestamp::now());
    }
    e
}

fn link_row(link: &LinkButton) -> CreateActionRow {
    let mut button = CreateButton::new_link(&link.url).label(&link.label);
    if let Some(emoji) = link.emoji {
        button = button.emoji(emoji);
    }
    CreateActionRow::Buttons(vec![button])
}

/// Administrator in `guild`: owner, or any held role (including @everyone)
/// carrying ADMINISTRATOR.
fn is_admin(guild: &Guild, member: &Member) -> bool {
    if guild.owner_id == member.user.id {
        return true;
    }
    let everyone = serenity::all::RoleId::new(guild.id.get());
    member
        .roles
        .iter()
        .chain(std::iter::once(&everyone))
        .filter_map(|id| guild.roles.get(id))
        .any(|role| role.permissions.administrator())
}

#[derive(Clone)]
pub struct DiscordGuilds {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl DiscordGuilds {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    fn bot_id(&self) -> serenity::all::UserId {
        self.cache.current_user().id
    }

    async fn bot_member(&self, guild: serenity::all::GuildId) -> Result<Member> {
        let bot = self.bot_id();
        let cached = self
            .cache
            .guild(guild)
            .and_then(|g| g.members.get(&bot).cloned());
        match cached {
            Some(m) => Ok(m),
            None => self.http.get_member(guild, bot).await.map_err(map_err),
        }
    }
}

#[async_trait]
impl GuildPort for DiscordGuilds {
    async fn guild_info(&self, guild: GuildId) -> Result<Option<GuildInfo>> {
        let gid = dc_guild(guild);
        if self.cache.guild(gid).is_none() {
            return Ok(None);
        }
        let member = self.bot_member(gid).await?;
        let Some(g) = self.cache.guild(gid) else {
            return Ok(None);
        };
        Ok(Some(GuildInfo {
            guild: guild_ref(&g),
            bot_is_admin: is_admin(&g, &member),
        }))
    }

    async fn fetch_member(&self, guild: GuildId, user: UserId) -> Result<Option<MemberInfo>> {
        match self.http.get_member(dc_guild(guild), dc_user(user)).await {
            Ok(m) => Ok(Some(MemberInfo {
                user_id: user,
                roles: m.roles.iter().map(|r| RoleId(r.get())).collect(),
            })),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(map_err(e)),
        }
    }

    async fn add_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<()> {
        self.http
            .add_member_role(dc_guild(guild), dc_user(user), dc_role(role), Some(reason))
            .await
            .map_err(map_err)
    }

    async fn remove_member(&self, guild: GuildId, user: UserId, reason: &str) -> Result<()> {
        self.http
            .kick_member(dc_guild(guild), dc_user(user), Some(reason))
            .await
            .map_err(map_err)
    }

    async fn can_send(&self, guild: GuildId, channel: ChannelId) -> Result<bool> {
        let gid = dc_guild(guild);
        let member = self.bot_member(gid).await?;
        let Some(g) = self.cache.guild(gid) else {
            return Ok(false);
        };
        let Some(ch) = g.channels.get(&dc_channel(channel)) else {
            return Ok(false);
        };
        Ok(g.user_permissions_in(ch, &member).send_messages())
    }

    async fn send_card(
        &self,
        channel: ChannelId,
        card: &Card,
        link: Option<&LinkButton>,
    ) -> Result<()> {
        let mut message = CreateMessage::new().embed(embed(card));
        if let Some(link) = link {
            message = message.components(vec![link_row(link)]);
        }
        dc_channel(channel)
            .send_message(&self.http, message)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

/// Response channel of one slash command interaction.
pub struct DiscordInteraction {
    http: Arc<Http>,
    command: CommandInteraction,
    acknowledged: AtomicBool,
}

impl DiscordInteraction {
    pub fn new(http: Arc<Http>, command: CommandInteraction) -> Self {
        Self {
            http,
            command,
            acknowledged: AtomicBool::new(false),
        }
    }
}

fn response_message(reply: &Reply) -> CreateInteractionResponseMessage {
    match reply {
        Reply::Text(text) => CreateInteractionResponseMessage::new().content(text),
        Reply::Card(card) => CreateInteractionResponseMessage::new().embed(embed(card)),
    }
}

fn edit_message(reply: &Reply) -> EditInteractionResponse {
    match reply {
        Reply::Text(text) => EditInteractionResponse::new().content(text).embeds(vec![]),
        Reply::Card(card) => EditInteractionResponse::new().content("").embed(embed(card)),
    }
}

fn followup_message(reply: &Reply) -> CreateInteractionResponseFollowup {
    match reply {
        Reply::Text(text) => CreateInteractionResponseFollowup::new().content(text),
        Reply::Card(card) => CreateInteractionResponseFollowup::new().embed(embed(card)),
    }
}

#[async_trait]
impl InteractionPort for DiscordInteraction {
    fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::SeqCst)
    }

    async fn defer(&self, ephemeral: bool) -> Result<()> {
        let msg = CreateInteractionResponseMessage::new().ephemeral(ephemeral);
        self.command
            .create_response(&self.http, CreateInteractionResponse::Defer(msg))
            .await
            .map_err(map_err)?;
        self.acknowledged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn respond(&self, reply: &Reply, ephemeral: bool) -> Result<()> {
        let msg = response_message(reply).ephemeral(ephemeral);
        self.command
            .create_response(&self.http, CreateInteractionResponse::Message(msg))
            .await
            .map_err(map_err)?;
        self.acknowledged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn edit_original(&self, reply: &Reply) -> Result<()> {
        self.command
            .edit_response(&self.http, edit_message(reply))
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn followup(&self, reply: &Reply, ephemeral: bool) -> Result<()> {
        self.command
            .create_followup(&self.http, followup_message(reply).ephemeral(ephemeral))
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vbot_core::messaging::types::Tone;

    #[test]
    fn card_maps_to_embed_payload() {
        let card = Card::new("Title", Tone::Success)
            .description("body")
            .field("a", "1", true)
            .field("b", "2", false)
            .footer("foot");

        let json = serde_json::to_value(embed(&card)).unwrap();
        assert_eq!(json["title"], "Title");
        assert_eq!(json["description"], "body");
        assert_eq!(json["color"], Tone::Success.rgb());
        assert_eq!(json["fields"].as_array().unwrap().len(), 2);
        assert_eq!(json["fields"][0]["inline"], true);
        assert_eq!(json["footer"]["text"], "foot");
        assert!(json.get("timestamp").map_or(true, |v| v.is_null()));
    }
}
