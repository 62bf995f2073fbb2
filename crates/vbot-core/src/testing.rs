//! In-memory port fakes shared by the unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    api::types::{
        ConfigUpdate, GuildStats, LogEntry, ManualVerification, MemberRecord, RestoreRequest,
    },
    config::Config,
    domain::{
        ChannelId, ChannelRef, GuildId, GuildRef, Invocation, Invoker, RoleId, UserId, UserRef,
    },
    errors::{ApiError, Error},
    messaging::{
        port::InteractionPort,
        types::{Card, LinkButton, Reply},
    },
    ports::{ApiResult, GuildInfo, GuildPort, MemberInfo, VerificationApi},
    Result,
};

pub(crate) fn test_config() -> Config {
    Config {
        discord_bot_token: "token".to_string(),
        api_url: "https://api.test".to_string(),
        api_timeout: Duration::from_secs(1),
        dashboard_url: "https://dash.test".to_string(),
        migration_delay: Duration::ZERO,
        progress_every: 10,
        brand_name: "testbrand".to_string(),
    }
}

pub(crate) fn guild(id: u64, name: &str) -> GuildRef {
    GuildRef {
        id: GuildId(id),
        name: name.to_string(),
        icon_url: None,
    }
}

pub(crate) fn records(ids: impl IntoIterator<Item = u64>) -> Vec<MemberRecord> {
    ids.into_iter()
        .map(|i| MemberRecord::new(i.to_string(), format!("user{i}")))
        .collect()
}

pub(crate) fn invocation(guild_id: u64, admin: bool) -> Invocation {
    Invocation {
        guild: guild(guild_id, "Target"),
        channel: ChannelRef {
            id: ChannelId(900),
            name: Some("general".to_string()),
        },
        invoker: Invoker {
            user: UserRef {
                id: UserId(1),
                tag: "admin".to_string(),
                avatar_url: None,
            },
            is_admin: admin,
        },
        bot_avatar_url: None,
    }
}

pub(crate) struct FakeApi {
    pub candidates: ApiResult<Vec<MemberRecord>>,
    pub stats: ApiResult<GuildStats>,
    pub logs: ApiResult<Vec<LogEntry>>,
    pub fail_mark: bool,
    pub fail_manual: bool,
    pub fail_config: bool,

    pub fetches: Mutex<Vec<(&'static str, GuildId)>>,
    pub restores: Mutex<Vec<(GuildId, RestoreRequest)>>,
    pub manual: Mutex<Vec<ManualVerification>>,
    pub configs: Mutex<Vec<(GuildId, ConfigUpdate)>>,
    pub log_queries: Mutex<Vec<(u32, Option<String>)>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            candidates: Ok(Vec::new()),
            stats: Ok(GuildStats::default()),
            logs: Ok(Vec::new()),
            fail_mark: false,
            fail_manual: false,
            fail_config: false,
            fetches: Mutex::new(Vec::new()),
            restores: Mutex::new(Vec::new()),
            manual: Mutex::new(Vec::new()),
            configs: Mutex::new(Vec::new()),
            log_queries: Mutex::new(Vec::new()),
        }
    }
}

impl FakeApi {
    pub fn with_candidates(candidates: Vec<MemberRecord>) -> Self {
        Self {
            candidates: Ok(candidates),
            ..Default::default()
        }
    }

    pub fn failing_fetch(err: ApiError) -> Self {
        Self {
            candidates: Err(err),
            ..Default::default()
        }
    }

    pub fn restored_ids(&self) -> Vec<String> {
        self.restores
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, r)| r.member_ids.clone())
            .collect()
    }
}

fn failure() -> ApiError {
    ApiError::status(500, "boom")
}

#[async_trait]
impl VerificationApi for FakeApi {
    async fn verification_url(&self, guild: GuildId) -> String {
        format!("https://verify.test/{guild}")
    }

    async fn source_members(&self, source: GuildId) -> ApiResult<Vec<MemberRecord>> {
        self.fetches.lock().unwrap().push(("members", source));
        self.candidates.clone()
    }

    async fn verified_users(&self, guild: GuildId) -> ApiResult<Vec<MemberRecord>> {
        self.fetches.lock().unwrap().push(("verified", guild));
        self.candidates.clone()
    }

    async fn mark_restored(&self, guild: GuildId, req: &RestoreRequest) -> ApiResult<()> {
        self.restores.lock().unwrap().push((guild, req.clone()));
        if self.fail_mark {
            return Err(failure());
        }
        Ok(())
    }

    async fn verify_manual(&self, record: &ManualVerification) -> ApiResult<()> {
        self.manual.lock().unwrap().push(record.clone());
        if self.fail_manual {
            return Err(failure());
        }
        Ok(())
    }

    async fn update_config(&self, guild: GuildId, update: &ConfigUpdate) -> ApiResult<()> {
        self.configs.lock().unwrap().push((guild, update.clone()));
        if self.fail_config {
            return Err(failure());
        }
        Ok(())
    }

    async fn stats(&self, _guild: GuildId) -> ApiResult<GuildStats> {
        self.stats.clone()
    }

    async fn logs(
        &self,
        _guild: GuildId,
        limit: u32,
        log_type: Option<&str>,
    ) -> ApiResult<Vec<LogEntry>> {
        self.log_queries
            .lock()
            .unwrap()
            .push((limit, log_type.map(str::to_string)));
        self.logs.clone()
    }
}

#[derive(Default)]
pub(crate) struct FakeGuilds {
    pub guilds: HashMap<u64, GuildInfo>,
    /// guild -> user -> roles
    pub members: HashMap<u64, HashMap<u64, Vec<RoleId>>>,
    pub fail_lookup_for: HashSet<u64>,
    pub fail_role_for: HashSet<u64>,
    pub fail_remove: bool,
    pub deny_send: bool,

    pub lookups: Mutex<Vec<(GuildId, UserId)>>,
    pub role_adds: Mutex<Vec<(GuildId, UserId, RoleId, String)>>,
    pub removals: Mutex<Vec<(GuildId, UserId)>>,
    pub sent: Mutex<Vec<(ChannelId, Card, Option<LinkButton>)>>,
}

impl FakeGuilds {
    pub fn with_guild(mut self, guild: GuildRef, bot_is_admin: bool) -> Self {
        self.guilds.insert(
            guild.id.0,
            GuildInfo {
                guild,
                bot_is_admin,
            },
        );
        self
    }

    pub fn with_member(mut self, guild: u64, user: u64, roles: &[u64]) -> Self {
        self.members
            .entry(guild)
            .or_default()
            .insert(user, roles.iter().copied().map(RoleId).collect());
        self
    }

    pub fn lookup_ids(&self) -> Vec<u64> {
        self.lookups.lock().unwrap().iter().map(|(_, u)| u.0).collect()
    }

    /// Total number of per-member platform calls.
    pub fn member_calls(&self) -> usize {
        self.lookups.lock().unwrap().len()
            + self.role_adds.lock().unwrap().len()
            + self.removals.lock().unwrap().len()
    }
}

#[async_trait]
impl GuildPort for FakeGuilds {
    async fn guild_info(&self, guild: GuildId) -> Result<Option<GuildInfo>> {
        Ok(self.guilds.get(&guild.0).cloned())
    }

    async fn fetch_member(&self, guild: GuildId, user: UserId) -> Result<Option<MemberInfo>> {
        self.lookups.lock().unwrap().push((guild, user));
        if self.fail_lookup_for.contains(&user.0) {
            return Err(Error::Platform("lookup failed".to_string()));
        }
        Ok(self
            .members
            .get(&guild.0)
            .and_then(|m| m.get(&user.0))
            .map(|roles| MemberInfo {
                user_id: user,
                roles: roles.clone(),
            }))
    }

    async fn add_role(
        &self,
        guild: GuildId,
        user: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<()> {
        self.role_adds
            .lock()
            .unwrap()
            .push((guild, user, role, reason.to_string()));
        if self.fail_role_for.contains(&user.0) {
            return Err(Error::Platform("network down".to_string()));
        }
        Ok(())
    }

    async fn remove_member(&self, guild: GuildId, user: UserId, _reason: &str) -> Result<()> {
        self.removals.lock().unwrap().push((guild, user));
        if self.fail_remove {
            return Err(Error::Platform("unknown member".to_string()));
        }
        Ok(())
    }

    async fn can_send(&self, _guild: GuildId, _channel: ChannelId) -> Result<bool> {
        Ok(!self.deny_send)
    }

    async fn send_card(
        &self,
        channel: ChannelId,
        card: &Card,
        link: Option<&LinkButton>,
    ) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((channel, card.clone(), link.cloned()));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeInteraction {
    pub acknowledged: AtomicBool,
    pub fail_respond: bool,
    pub fail_edit: bool,
    pub fail_followup: bool,
    pub expire_defer: bool,

    pub defers: Mutex<Vec<bool>>,
    pub responses: Mutex<Vec<(Reply, bool)>>,
    pub edits: Mutex<Vec<Reply>>,
    pub followups: Mutex<Vec<(Reply, bool)>>,
}

impl FakeInteraction {
    pub fn edits(&self) -> Vec<Reply> {
        self.edits.lock().unwrap().clone()
    }

    pub fn followups(&self) -> Vec<(Reply, bool)> {
        self.followups.lock().unwrap().clone()
    }

    pub fn responses(&self) -> Vec<(Reply, bool)> {
        self.responses.lock().unwrap().clone()
    }

    pub fn edit_titles(&self) -> Vec<String> {
        self.edits()
            .iter()
            .filter_map(|r| r.as_card().map(|c| c.title.clone()))
            .collect()
    }

    /// Every text or card title delivered after the initial response.
    pub fn later_texts(&self) -> Vec<String> {
        self.followups()
            .into_iter()
            .map(|(r, _)| match r {
                Reply::Text(t) => t,
                Reply::Card(c) => c.title,
            })
            .collect()
    }
}

#[async_trait]
impl InteractionPort for FakeInteraction {
    fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::SeqCst)
    }

    async fn defer(&self, ephemeral: bool) -> Result<()> {
        if self.expire_defer {
            return Err(Error::InteractionExpired);
        }
        self.defers.lock().unwrap().push(ephemeral);
        self.acknowledged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn respond(&self, reply: &Reply, ephemeral: bool) -> Result<()> {
        if self.fail_respond {
            return Err(Error::Platform("unknown interaction".to_string()));
        }
        self.responses
            .lock()
            .unwrap()
            .push((reply.clone(), ephemeral));
        self.acknowledged.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn edit_original(&self, reply: &Reply) -> Result<()> {
        if self.fail_edit {
            return Err(Error::Platform("invalid webhook token".to_string()));
        }
        self.edits.lock().unwrap().push(reply.clone());
        Ok(())
    }

    async fn followup(&self, reply: &Reply, ephemeral: bool) -> Result<()> {
        if self.fail_followup {
            return Err(Error::Platform("invalid webhook token".to_string()));
        }
        self.followups
            .lock()
            .unwrap()
            .push((reply.clone(), ephemeral));
        Ok(())
    }
}
