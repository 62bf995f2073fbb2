use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A verified user as the API reports it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MemberRecord {
    /// Raw id as sent; empty when the API omitted it. Parsed per candidate.
    #[serde(default, deserialize_with = "snowflake_string")]
    pub discord_id: String,
    #[serde(default = "unknown_username")]
    pub username: String,
    #[serde(default)]
    pub restored: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl MemberRecord {
    pub fn new(discord_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            discord_id: discord_id.into(),
            username: username.into(),
            restored: false,
            metadata: Map::new(),
        }
    }
}

fn unknown_username() -> String {
    "Unknown".to_string()
}

/// Some API builds send snowflakes as JSON numbers; accept both.
///
/// Anything else (null, negative, nested) is kept as its JSON text so one bad
/// record fails alone instead of the whole list.
fn snowflake_string<'de, D>(de: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(de)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MembersEnvelope {
    #[serde(default)]
    pub members: Vec<MemberRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UsersEnvelope {
    #[serde(default)]
    pub users: Vec<MemberRecord>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VerifyUrlEnvelope {
    pub verification_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatsEnvelope {
    #[serde(default)]
    pub stats: GuildStats,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LogsEnvelope {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

/// Body of `POST /api/bot/guild/{guild}/restore`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RestoreRequest {
    pub member_ids: Vec<String>,
    pub role_id: Option<String>,
}

/// Expiry the API applies to manual verifications (7 days).
pub const MANUAL_VERIFICATION_EXPIRES_IN: u64 = 604_800;
pub const MANUAL_VERIFICATION_TOKEN: &str = "manual_verification";

/// Synthesized verification record for `POST /api/bot/verify-manual`.
///
/// No OAuth grant exists for these users, so the token fields carry a fixed
/// placeholder the API recognizes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManualVerification {
    pub discord_id: String,
    pub username: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub guild_id: String,
    pub metadata: ManualMetadata,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManualMetadata {
    pub manual: bool,
    pub verified_by: String,
    pub avatar: Option<String>,
}

impl ManualVerification {
    pub fn new(
        discord_id: impl Into<String>,
        username: impl Into<String>,
        guild_id: impl Into<String>,
        verified_by: impl Into<String>,
        avatar: Option<String>,
    ) -> Self {
        Self {
            discord_id: discord_id.into(),
            username: username.into(),
            access_token: MANUAL_VERIFICATION_TOKEN.to_string(),
            refresh_token: MANUAL_VERIFICATION_TOKEN.to_string(),
            expires_in: MANUAL_VERIFICATION_EXPIRES_IN,
            guild_id: guild_id.into(),
            metadata: ManualMetadata {
                manual: true,
                verified_by: verified_by.into(),
                avatar,
            },
        }
    }
}

/// Sparse settings update: only fields the caller supplied are serialized.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConfigUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_auto_verification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_channel: Option<String>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self.verification_channel.is_none()
            && self.verification_role.is_none()
            && self.enable_auto_verification.is_none()
            && self.log_channel.is_none()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct GuildStats {
    #[serde(default)]
    pub total_verified: u64,
    #[serde(default)]
    pub restored: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub verified_today: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    pub created_at: String,
    #[serde(rename = "type", default = "info_type")]
    pub kind: String,
    #[serde(default = "na_message")]
    pub message: String,
}

fn info_type() -> String {
    "info".to_string()
}

fn na_message() -> String {
    "N/A".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn member_record_accepts_numeric_ids_and_fills_defaults() {
        let rec: MemberRecord = serde_json::from_value(json!({ "discord_id": 123 })).unwrap();
        assert_eq!(rec.discord_id, "123");
        assert_eq!(rec.username, "Unknown");
        assert!(!rec.restored);
        assert!(rec.metadata.is_empty());
    }

    #[test]
    fn unusable_ids_decode_to_raw_text() {
        let recs: Vec<MemberRecord> = serde_json::from_value(json!([
            { "username": "no-id" },
            { "discord_id": null },
            { "discord_id": -5 },
            { "discord_id": { "nested": true } },
        ]))
        .unwrap();
        let ids: Vec<&str> = recs.iter().map(|r| r.discord_id.as_str()).collect();
        assert_eq!(ids, ["", "", "-5", r#"{"nested":true}"#]);
        assert_eq!(recs[0].username, "no-id");
    }

    #[test]
    fn config_update_serializes_only_supplied_keys() {
        let update = ConfigUpdate {
            enable_auto_verification: Some(false),
            log_channel: Some("9".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "enable_auto_verification": false, "log_channel": "9" })
        );
        assert!(ConfigUpdate::default().is_empty());
    }

    #[test]
    fn manual_verification_uses_placeholder_tokens_and_week_expiry() {
        let v = ManualVerification::new("1", "alice", "2", "admin", None);
        let body = serde_json::to_value(&v).unwrap();
        assert_eq!(body["access_token"], "manual_verification");
        assert_eq!(body["refresh_token"], "manual_verification");
        assert_eq!(body["expires_in"], 604_800);
        assert_eq!(body["metadata"]["manual"], true);
        assert_eq!(body["metadata"]["avatar"], Value::Null);
    }

    #[test]
    fn log_entry_reads_type_field() {
        let entry: LogEntry = serde_json::from_value(json!({
            "created_at": "2024-05-01T10:00:00Z",
            "type": "restoration",
        }))
        .unwrap();
        assert_eq!(entry.kind, "restoration");
        assert_eq!(entry.message, "N/A");
    }
}
