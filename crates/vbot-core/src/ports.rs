use async_trait::async_trait;

use crate::{
    api::types::{ConfigUpdate, GuildStats, LogEntry, ManualVerification, MemberRecord, RestoreRequest},
    domain::{ChannelId, GuildId, GuildRef, RoleId, UserId},
    errors::ApiError,
    messaging::types::{Card, LinkButton},
    Result,
};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Port for the remote verification API (source of truth for verified users).
///
/// Implementations never retry; every failure is surfaced as an `ApiError`.
#[async_trait]
pub trait VerificationApi: Send + Sync {
    /// Verification link for a guild. Infallible: falls back to a constructed URL.
    async fn verification_url(&self, guild: GuildId) -> String;

    async fn source_members(&self, source: GuildId) -> ApiResult<Vec<MemberRecord>>;
    async fn verified_users(&self, guild: GuildId) -> ApiResult<Vec<MemberRecord>>;
    async fn mark_restored(&self, guild: GuildId, req: &RestoreRequest) -> ApiResult<()>;
    async fn verify_manual(&self, record: &ManualVerification) -> ApiResult<()>;
    async fn update_config(&self, guild: GuildId, update: &ConfigUpdate) -> ApiResult<()>;
    async fn stats(&self, guild: GuildId) -> ApiResult<GuildStats>;
    async fn logs(
        &self,
        guild: GuildId,
        limit: u32,
        log_type: Option<&str>,
    ) -> ApiResult<Vec<LogEntry>>;
}

/// A guild the bot can see, plus whether it holds administrator there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildInfo {
    pub guild: GuildRef,
    pub bot_is_admin: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    pub user_id: UserId,
    pub roles: Vec<RoleId>,
}

impl MemberInfo {
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

/// Port for guild-side lookups and side effects on the chat platform.
#[async_trait]
pub trait GuildPort: Send + Sync {
    /// `None` when the bot is not in (or cannot see) the guild.
    async fn guild_info(&self, guild: GuildId) -> Result<Option<GuildInfo>>;

    /// `None` when the user is not a member of the guild.
    async fn fetch_member(&self, guild: GuildId, user: UserId) -> Result<Option<MemberInfo>>;

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId, reason: &str)
        -> Result<()>;

    async fn remove_member(&self, guild: GuildId, user: UserId, reason: &str) -> Result<()>;

    /// Whether the bot may post messages in `channel`.
    async fn can_send(&self, guild: GuildId, channel: ChannelId) -> Result<bool>;

    async fn send_card(
        &self,
        channel: ChannelId,
        card: &Card,
        link: Option<&LinkButton>,
    ) -> Result<()>;
}
