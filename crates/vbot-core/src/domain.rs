use std::fmt;

/// Discord guild (server) id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GuildId(pub u64);

/// Discord user id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

/// Discord role id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RoleId(pub u64);

/// Discord channel id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserId {
    /// Parse a snowflake as the API returns it (decimal string).
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u64>().ok().filter(|id| *id != 0).map(Self)
    }
}

impl GuildId {
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u64>().ok().filter(|id| *id != 0).map(Self)
    }
}

/// A guild as seen by the invoking interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildRef {
    pub id: GuildId,
    pub name: String,
    pub icon_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleRef {
    pub id: RoleId,
    pub name: String,
}

impl RoleRef {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub name: Option<String>,
}

impl ChannelRef {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRef {
    pub id: UserId,
    /// `name` or legacy `name#1234`.
    pub tag: String,
    pub avatar_url: Option<String>,
}

impl UserRef {
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// The user who invoked a command, with their resolved guild permissions.
#[derive(Clone, Debug)]
pub struct Invoker {
    pub user: UserRef,
    pub is_admin: bool,
}

/// Everything the dispatcher needs to know about where a command came from.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub guild: GuildRef,
    pub channel: ChannelRef,
    pub invoker: Invoker,
    pub bot_avatar_url: Option<String>,
}
