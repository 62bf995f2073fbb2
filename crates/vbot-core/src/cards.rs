//! Static and API-backed cards posted by the non-migration commands.

use chrono::DateTime;

use crate::{
    api::types::{GuildStats, LogEntry},
    commands::ConfigChange,
    domain::{GuildRef, RoleRef, UserRef},
    messaging::types::{Card, LinkButton, Tone},
};

/// Entries rendered into one logs card.
pub const LOGS_PER_CARD: usize = 10;

pub fn help(brand: &str, footer: &str, bot_avatar_url: Option<String>) -> Card {
    Card::new(format!("🤖 {brand} Bot Help"), Tone::Info)
        .description("All available commands for the verification system")
        .field(
            "📋 Verification",
            "• `/send` - Create verification embed\n\
             • `/verify` - Manual verification (admins only)\n\
             • `/stats` - View verification statistics",
            false,
        )
        .field(
            "🔄 Transfer & Restoration",
            "• `/transfer` - Transfer users between servers\n\
             • `/restore` - Restore verified users",
            false,
        )
        .field(
            "⚙️ Configuration",
            "• `/config` - Configure bot settings\n\
             • `/dashboard` - Get dashboard link\n\
             • `/logs` - View recent verification logs",
            false,
        )
        .footer(footer)
        .thumbnail(bot_avatar_url)
        .timestamped()
}

pub fn dashboard(dashboard_url: &str, footer: &str) -> Card {
    Card::new("🌐 Web Dashboard", Tone::Info)
        .description("Manage your server verification settings via our web dashboard.")
        .field(
            "🔗 Dashboard Link",
            format!("[Click here to access dashboard]({dashboard_url})"),
            false,
        )
        .field(
            "📋 Features",
            "• View verification statistics\n\
             • Manage verified members\n\
             • Configure bot settings\n\
             • View activity logs\n\
             • Transfer users between servers",
            false,
        )
        .footer(footer)
        .timestamped()
}

pub fn verification_prompt(guild: &GuildRef, footer: &str) -> Card {
    Card::new("🔐 Server Verification Required", Tone::Info)
        .description(
            "Click the button below to verify your account and gain access to this server.",
        )
        .field(
            "📋 Instructions",
            "1. Click the **Verify Now** button\n\
             2. Login with Discord\n\
             3. Authorize the permissions\n\
             4. You'll be automatically verified!",
            false,
        )
        .field(
            "🔒 Security",
            "Your data is encrypted and secure. We only request necessary permissions.",
            false,
        )
        .footer(footer)
        .thumbnail(guild.icon_url.clone())
        .timestamped()
}

pub fn verify_button(url: impl Into<String>) -> LinkButton {
    LinkButton {
        label: "Verify Now".to_string(),
        emoji: Some('✅'),
        url: url.into(),
    }
}

pub fn stats(guild: &GuildRef, stats: &GuildStats, footer: &str) -> Card {
    let mut card = Card::new("📊 Verification Statistics", Tone::Stats)
        .field("✅ Total Verified", stats.total_verified.to_string(), true)
        .field("🔄 Restored", stats.restored.to_string(), true)
        .field("⏳ Pending", stats.pending.to_string(), true);
    if stats.verified_today > 0 {
        card = card.field("📈 Verified Today", stats.verified_today.to_string(), true);
    }
    card.footer(footer)
        .thumbnail(guild.icon_url.clone())
        .timestamped()
}

/// Renders the first `LOGS_PER_CARD` entries. `logs` must be non-empty.
pub fn logs(logs: &[LogEntry]) -> Card {
    let shown = &logs[..logs.len().min(LOGS_PER_CARD)];
    let mut card = Card::new("📝 Recent Verification Logs", Tone::Muted);
    for entry in shown {
        card = card.field(
            format!("{} {}", log_emoji(&entry.kind), log_time(&entry.created_at)),
            format!("**{}**: {}", title_case(&entry.kind), entry.message),
            false,
        );
    }
    card.footer(format!("Showing {} of {} logs", shown.len(), logs.len()))
        .timestamped()
}

fn log_emoji(kind: &str) -> &'static str {
    match kind {
        "verification" => "✅",
        "restoration" => "🔄",
        "error" => "❌",
        "config" => "⚙️",
        _ => "📝",
    }
}

/// `2024-05-01T10:00:00Z` -> `2024-05-01 10:00`; unparseable stamps are shown raw.
fn log_time(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn config_updated(change: &ConfigChange, footer: &str) -> Card {
    let mut card = Card::new("⚙️ Configuration Updated", Tone::Success)
        .description("Bot settings have been saved successfully.");
    if let Some(channel) = &change.verification_channel {
        card = card.field("Verification Channel", channel.mention(), true);
    }
    if let Some(role) = &change.verification_role {
        card = card.field("Verification Role", role.mention(), true);
    }
    if let Some(enabled) = change.enable_auto_verification {
        let value = if enabled { "Enabled" } else { "Disabled" };
        card = card.field("Auto Verification", value, true);
    }
    if let Some(channel) = &change.log_channel {
        card = card.field("Log Channel", channel.mention(), true);
    }
    card.footer(footer).timestamped()
}

pub fn user_verified(user: &UserRef, role: Option<&RoleRef>, verified_by: &str) -> Card {
    let mut card = Card::new("✅ User Verified", Tone::Success)
        .description(format!("Successfully verified {}", user.mention()));
    if let Some(role) = role {
        card = card.field("Role Assigned", role.mention(), true);
    }
    card.footer(format!("Verified by {verified_by}")).timestamped()
}

pub fn welcome(brand: &str) -> Card {
    Card::new(format!("✅ {brand} Bot Added"), Tone::Success)
        .description("Thanks for adding me to your server!")
        .field(
            "Getting Started",
            "Use `/send` to create a verification embed\n\
             Use `/dashboard` to access the web dashboard\n\
             Use `/help` for more commands",
            false,
        )
        .footer("Type /help for all commands")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChannelId, ChannelRef, GuildId, RoleId, UserId};
    use crate::messaging::types::FIELD_VALUE_MAX;

    fn entry(created_at: &str, kind: &str) -> LogEntry {
        LogEntry {
            created_at: created_at.to_string(),
            kind: kind.to_string(),
            message: "m".to_string(),
        }
    }

    #[test]
    fn verified_today_only_when_positive() {
        let guild = GuildRef {
            id: GuildId(1),
            name: "G".to_string(),
            icon_url: Some("https://cdn/icon.png".to_string()),
        };
        let mut s = GuildStats {
            total_verified: 7,
            restored: 3,
            pending: 1,
            verified_today: 0,
        };
        let card = stats(&guild, &s, "f");
        assert_eq!(card.field_value("✅ Total Verified"), Some("7"));
        assert!(card.field_value("📈 Verified Today").is_none());
        assert_eq!(card.thumbnail_url.as_deref(), Some("https://cdn/icon.png"));

        s.verified_today = 2;
        assert_eq!(stats(&guild, &s, "f").field_value("📈 Verified Today"), Some("2"));
    }

    #[test]
    fn logs_card_caps_at_ten_and_formats_entries() {
        let mut entries = vec![entry("2024-05-01T10:30:00Z", "verification")];
        entries.extend((0..13).map(|_| entry("garbage", "something else")));

        let card = logs(&entries);
        assert_eq!(card.fields.len(), 10);
        assert_eq!(card.fields[0].name, "✅ 2024-05-01 10:30");
        assert_eq!(card.fields[0].value, "**Verification**: m");
        assert_eq!(card.fields[1].name, "📝 garbage");
        assert_eq!(card.fields[1].value, "**Something Else**: m");
        assert_eq!(card.footer.as_deref(), Some("Showing 10 of 14 logs"));
    }

    #[test]
    fn config_card_lists_only_changed_settings() {
        let change = ConfigChange {
            log_channel: Some(ChannelRef {
                id: ChannelId(8),
                name: None,
            }),
            enable_auto_verification: Some(false),
            ..Default::default()
        };
        let card = config_updated(&change, "f");
        assert_eq!(card.fields.len(), 2);
        assert_eq!(card.field_value("Auto Verification"), Some("Disabled"));
        assert_eq!(card.field_value("Log Channel"), Some("<#8>"));
    }

    #[test]
    fn verified_card_mentions_user_and_role() {
        let user = UserRef {
            id: UserId(4),
            tag: "bob".to_string(),
            avatar_url: None,
        };
        let role = RoleRef {
            id: RoleId(6),
            name: "Verified".to_string(),
        };
        let card = user_verified(&user, Some(&role), "admin");
        assert_eq!(card.description.as_deref(), Some("Successfully verified <@4>"));
        assert_eq!(card.field_value("Role Assigned"), Some("<@&6>"));
        assert_eq!(card.footer.as_deref(), Some("Verified by admin"));
    }

    #[test]
    fn long_log_messages_fit_the_field_limit() {
        let mut long = entry("2024-05-01T10:30:00Z", "error");
        long.message = "é".repeat(5000);
        let card = logs(&[long]);
        let value = &card.fields[0].value;
        assert_eq!(value.chars().count(), FIELD_VALUE_MAX);
        assert!(value.starts_with("**Error**: é"));
        assert!(value.ends_with('…'));
    }

    #[test]
    fn brand_flows_into_titles() {
        assert_eq!(help("acme", "f", None).title, "🤖 acme Bot Help");
        assert_eq!(welcome("acme").title, "✅ acme Bot Added");
    }
}
