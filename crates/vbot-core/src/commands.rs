//! Slash command schema and argument parsing.
//!
//! The schema is declared here once; the platform adapter turns it into
//! registration payloads and feeds resolved option values back as `Args`.

use std::collections::HashMap;

use crate::{
    api::types::ConfigUpdate,
    domain::{ChannelRef, GuildId, RoleRef, UserRef},
    errors::Error,
    migration::{JobKind, RESTORE_LIMIT_MAX, TRANSFER_LIMIT_MAX},
    Result,
};

pub const LOGS_LIMIT_DEFAULT: u32 = 10;
pub const LOGS_LIMIT_MAX: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer { min: u64, max: u64 },
    Boolean,
    Role,
    /// Text channels only.
    Channel,
    User,
}

#[derive(Clone, Debug)]
pub struct OptionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub required: bool,
}

#[derive(Clone, Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Gate behind the administrator permission.
    pub admin_only: bool,
    pub options: Vec<OptionSpec>,
}

fn opt(name: &'static str, description: &'static str, kind: OptionKind) -> OptionSpec {
    OptionSpec {
        name,
        description,
        kind,
        required: false,
    }
}

fn required(mut spec: OptionSpec) -> OptionSpec {
    spec.required = true;
    spec
}

/// Every command the bot exposes.
pub fn all() -> Vec<CommandSpec> {
    vec![
        CommandSpec {
            name: "help",
            description: "Show all available commands",
            admin_only: false,
            options: vec![],
        },
        CommandSpec {
            name: "send",
            description: "Send verification embed to a channel",
            admin_only: true,
            options: vec![opt(
                "channel",
                "Channel to send the embed to (default: current channel)",
                OptionKind::Channel,
            )],
        },
        CommandSpec {
            name: "transfer",
            description: "Transfer verified users from another server",
            admin_only: true,
            options: vec![
                required(opt(
                    "source_server_id",
                    "ID of the server to transfer users FROM",
                    OptionKind::String,
                )),
                opt(
                    "limit",
                    "Maximum number of users to transfer (0 for all)",
                    OptionKind::Integer {
                        min: 0,
                        max: TRANSFER_LIMIT_MAX as u64,
                    },
                ),
                opt(
                    "assign_role",
                    "Role to assign to transferred users",
                    OptionKind::Role,
                ),
                opt(
                    "delete_from_source",
                    "Remove users from source server after transfer",
                    OptionKind::Boolean,
                ),
            ],
        },
        CommandSpec {
            name: "restore",
            description: "Restore verified members to server",
            admin_only: true,
            options: vec![
                opt("role", "Role to assign to restored members", OptionKind::Role),
                opt(
                    "limit",
                    "Maximum number of users to restore (0 for all)",
                    OptionKind::Integer {
                        min: 0,
                        max: RESTORE_LIMIT_MAX as u64,
                    },
                ),
            ],
        },
        CommandSpec {
            name: "stats",
            description: "Show verification statistics",
            admin_only: false,
            options: vec![],
        },
        CommandSpec {
            name: "dashboard",
            description: "Get dashboard link",
            admin_only: false,
            options: vec![],
        },
        CommandSpec {
            name: "config",
            description: "Configure bot settings",
            admin_only: true,
            options: vec![
                opt(
                    "verification_channel",
                    "Channel to send verification messages",
                    OptionKind::Channel,
                ),
                opt(
                    "verification_role",
                    "Role to assign after verification",
                    OptionKind::Role,
                ),
                opt(
                    "enable_auto_verification",
                    "Enable automatic verification",
                    OptionKind::Boolean,
                ),
                opt(
                    "log_channel",
                    "Channel to send verification logs",
                    OptionKind::Channel,
                ),
            ],
        },
        CommandSpec {
            name: "logs",
            description: "Show recent verification logs",
            admin_only: true,
            options: vec![
                opt(
                    "limit",
                    "Number of logs to show (max 50)",
                    OptionKind::Integer {
                        min: 1,
                        max: LOGS_LIMIT_MAX as u64,
                    },
                ),
                opt("log_type", "Type of logs to show", OptionKind::String),
            ],
        },
        CommandSpec {
            name: "verify",
            description: "Manually verify a user",
            admin_only: true,
            options: vec![
                required(opt("user", "User to verify", OptionKind::User)),
                opt("role", "Role to assign after verification", OptionKind::Role),
            ],
        },
    ]
}

pub fn find(name: &str) -> Option<CommandSpec> {
    all().into_iter().find(|c| c.name == name)
}

/// Unknown names are treated as privileged.
pub fn requires_admin(name: &str) -> bool {
    find(name).map_or(true, |s| s.admin_only)
}

/// A resolved option value as delivered by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Role(RoleRef),
    Channel(ChannelRef),
    User(UserRef),
}

impl ArgValue {
    fn kind_name(&self) -> &'static str {
        match self {
            ArgValue::Str(_) => "text",
            ArgValue::Int(_) => "integer",
            ArgValue::Bool(_) => "boolean",
            ArgValue::Role(_) => "role",
            ArgValue::Channel(_) => "channel",
            ArgValue::User(_) => "user",
        }
    }
}

/// Option values of one invocation, keyed by option name.
#[derive(Clone, Debug, Default)]
pub struct Args(HashMap<String, ArgValue>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.0.insert(name.into(), value);
    }

    pub fn with(mut self, name: &str, value: ArgValue) -> Self {
        self.insert(name, value);
        self
    }

    fn mismatch(name: &str, expected: &str, got: &ArgValue) -> Error {
        Error::Validation(format!(
            "❌ Option `{name}` expects {expected}, got {}.",
            got.kind_name()
        ))
    }

    pub fn str(&self, name: &str) -> Result<Option<String>> {
        match self.0.get(name) {
            None => Ok(None),
            Some(ArgValue::Str(s)) => Ok(Some(s.trim().to_string()).filter(|s| !s.is_empty())),
            Some(other) => Err(Self::mismatch(name, "text", other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<Option<i64>> {
        match self.0.get(name) {
            None => Ok(None),
            Some(ArgValue::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(Self::mismatch(name, "integer", other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<Option<bool>> {
        match self.0.get(name) {
            None => Ok(None),
            Some(ArgValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(Self::mismatch(name, "boolean", other)),
        }
    }

    pub fn role(&self, name: &str) -> Result<Option<RoleRef>> {
        match self.0.get(name) {
            None => Ok(None),
            Some(ArgValue::Role(r)) => Ok(Some(r.clone())),
            Some(other) => Err(Self::mismatch(name, "role", other)),
        }
    }

    pub fn channel(&self, name: &str) -> Result<Option<ChannelRef>> {
        match self.0.get(name) {
            None => Ok(None),
            Some(ArgValue::Channel(c)) => Ok(Some(c.clone())),
            Some(other) => Err(Self::mismatch(name, "channel", other)),
        }
    }

    pub fn user(&self, name: &str) -> Result<Option<UserRef>> {
        match self.0.get(name) {
            None => Ok(None),
            Some(ArgValue::User(u)) => Ok(Some(u.clone())),
            Some(other) => Err(Self::mismatch(name, "user", other)),
        }
    }
}

/// Settings supplied to `/config`, kept with their display references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigChange {
    pub verification_channel: Option<ChannelRef>,
    pub verification_role: Option<RoleRef>,
    pub enable_auto_verification: Option<bool>,
    pub log_channel: Option<ChannelRef>,
}

impl ConfigChange {
    pub fn to_update(&self) -> ConfigUpdate {
        ConfigUpdate {
            verification_channel: self.verification_channel.as_ref().map(|c| c.id.to_string()),
            verification_role: self.verification_role.as_ref().map(|r| r.id.to_string()),
            enable_auto_verification: self.enable_auto_verification,
            log_channel: self.log_channel.as_ref().map(|c| c.id.to_string()),
        }
    }
}

/// A validated command invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandRequest {
    Help,
    Dashboard,
    Stats,
    Send {
        channel: Option<ChannelRef>,
    },
    Transfer {
        source: GuildId,
        limit: u32,
        role: Option<RoleRef>,
        delete_from_source: bool,
    },
    Restore {
        role: Option<RoleRef>,
        limit: u32,
    },
    Config(ConfigChange),
    Logs {
        limit: u32,
        log_type: Option<String>,
    },
    Verify {
        user: UserRef,
        role: Option<RoleRef>,
    },
}

impl CommandRequest {
    /// Validate argument shapes and ranges. Never touches the network.
    pub fn parse(name: &str, args: &Args) -> Result<Self> {
        let req = match name {
            "help" => CommandRequest::Help,
            "dashboard" => CommandRequest::Dashboard,
            "stats" => CommandRequest::Stats,
            "send" => CommandRequest::Send {
                channel: args.channel("channel")?,
            },
            "transfer" => {
                let raw = args
                    .str("source_server_id")?
                    .ok_or_else(|| Error::Validation("❌ A source server ID is required.".to_string()))?;
                let source = GuildId::parse(&raw)
                    .ok_or_else(|| Error::Validation("❌ Invalid server ID format.".to_string()))?;
                CommandRequest::Transfer {
                    source,
                    limit: bounded(args.int("limit")?, 0, JobKind::Transfer.limit_ceiling(), 0)?,
                    role: args.role("assign_role")?,
                    delete_from_source: args.bool("delete_from_source")?.unwrap_or(false),
                }
            }
            "restore" => CommandRequest::Restore {
                role: args.role("role")?,
                limit: bounded(args.int("limit")?, 0, JobKind::Restore.limit_ceiling(), 0)?,
            },
            "config" => {
                let change = ConfigChange {
                    verification_channel: args.channel("verification_channel")?,
                    verification_role: args.role("verification_role")?,
                    enable_auto_verification: args.bool("enable_auto_verification")?,
                    log_channel: args.channel("log_channel")?,
                };
                if change.to_update().is_empty() {
                    return Err(Error::Validation(
                        "❌ Provide at least one setting to change.".to_string(),
                    ));
                }
                CommandRequest::Config(change)
            }
            "logs" => CommandRequest::Logs {
                limit: bounded(args.int("limit")?, 1, LOGS_LIMIT_MAX, LOGS_LIMIT_DEFAULT)?,
                log_type: args.str("log_type")?,
            },
            "verify" => CommandRequest::Verify {
                user: args
                    .user("user")?
                    .ok_or_else(|| Error::Validation("❌ A user to verify is required.".to_string()))?,
                role: args.role("role")?,
            },
            other => {
                return Err(Error::Validation(format!("❌ Unknown command `/{other}`.")));
            }
        };
        Ok(req)
    }
}

fn bounded(value: Option<i64>, min: u32, max: u32, default: u32) -> Result<u32> {
    let Some(v) = value else {
        return Ok(default);
    };
    if v < i64::from(min) || v > i64::from(max) {
        return Err(Error::Validation(format!(
            "❌ Limit must be between {min} and {max}."
        )));
    }
    Ok(v as u32)
}
