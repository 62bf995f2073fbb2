//! Progress reporting for migration jobs.
//!
//! Rendering is pure (`render_*`), delivery goes through the interaction's
//! edit/followup channel and is best-effort: a failed delivery (expired
//! interaction token, deleted message) is logged and dropped.

use crate::{
    errors::ApiError,
    messaging::{
        port::InteractionPort,
        types::{Card, Reply, Tone},
    },
    migration::{EmptyReason, JobKind, MigrationJob, ProgressSnapshot},
};

pub struct ProgressReporter<'a> {
    out: &'a dyn InteractionPort,
    footer: String,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(out: &'a dyn InteractionPort, footer: impl Into<String>) -> Self {
        Self {
            out,
            footer: footer.into(),
        }
    }

    pub async fn started(&self, job: &MigrationJob) {
        self.edit(render_started(job).into()).await;
    }

    pub async fn progress(&self, snapshot: &ProgressSnapshot) {
        self.edit(render_progress(snapshot).into()).await;
    }

    pub async fn finished(&self, job: &MigrationJob, snapshot: &ProgressSnapshot) {
        self.edit(render_summary(job, snapshot, &self.footer).into())
            .await;
    }

    pub async fn aborted(&self, kind: JobKind, err: &ApiError) {
        self.followup(Reply::text(render_abort(kind, err))).await;
    }

    pub async fn nothing_to_do(&self, kind: JobKind, reason: EmptyReason) {
        self.followup(Reply::text(render_nothing_to_do(kind, reason)))
            .await;
    }

    async fn edit(&self, reply: Reply) {
        if let Err(e) = self.out.edit_original(&reply).await {
            tracing::debug!(error = %e, "progress update not delivered");
        }
    }

    async fn followup(&self, reply: Reply) {
        if let Err(e) = self.out.followup(&reply, true).await {
            tracing::debug!(error = %e, "progress followup not delivered");
        }
    }
}

pub fn render_started(job: &MigrationJob) -> Card {
    let count = job.candidates.len();
    let mut card = match job.kind {
        JobKind::Transfer => {
            let source = job
                .source_guild
                .as_ref()
                .map(|g| g.name.as_str())
                .unwrap_or("unknown");
            Card::new("🔄 Transferring Users", Tone::Progress)
                .description(format!(
                    "Transferring **{count}** users from `{source}` to `{}`...",
                    job.target_guild.name
                ))
                .field("Source Server", source, true)
                .field("Target Server", job.target_guild.name.clone(), true)
                .field("Users to Transfer", count.to_string(), true)
        }
        JobKind::Restore => Card::new("🔄 Restoring Members", Tone::Progress)
            .description(format!("Restoring **{count}** users...")),
    };

    if let Some(role) = &job.role {
        card = card.field("Role to Assign", role.mention(), true);
    }
    card.footer("This may take a while...").timestamped()
}

pub fn render_progress(snapshot: &ProgressSnapshot) -> Card {
    let c = &snapshot.counters;
    let title = match snapshot.kind {
        JobKind::Transfer => "🔄 Transfer in Progress",
        JobKind::Restore => "🔄 Restoration in Progress",
    };
    Card::new(title, Tone::Progress).description(format!(
        "**{}/{}** users processed ({} succeeded, {} failed)",
        c.processed, c.total, c.succeeded, c.failed
    ))
}

pub fn render_summary(job: &MigrationJob, snapshot: &ProgressSnapshot, footer: &str) -> Card {
    let c = &snapshot.counters;
    let mut card = match snapshot.kind {
        JobKind::Transfer => Card::new("✅ Transfer Complete", Tone::Success)
            .field("✅ Transferred", c.succeeded.to_string(), true)
            .field("✔️ Already Present", c.already_present.to_string(), true)
            .field("❌ Failed", c.failed.to_string(), true)
            .field("📊 Total Attempted", c.total.to_string(), false),
        JobKind::Restore => Card::new("✅ Restoration Complete", Tone::Success)
            .field("✅ Restored", c.succeeded.to_string(), true)
            .field("✔️ Already Present", c.already_present.to_string(), true)
            .field("❌ Failed", c.failed.to_string(), true)
            .field("📊 Total", c.total.to_string(), true),
    };

    if c.succeeded == 0 && c.failed > 0 {
        card.tone = Tone::Failure;
    }

    if let Some(role) = &job.role {
        if c.roles_assigned > 0 {
            card = card.field(
                "🎯 Role Assigned",
                format!("{} ({} members)", role.mention(), c.roles_assigned),
                false,
            );
        }
    }
    if job.remove_from_source {
        card = card.field("🗑️ Removed from Source", "Yes", true);
    }
    card.footer(footer).timestamped()
}

pub fn render_abort(kind: JobKind, err: &ApiError) -> String {
    match (kind, err.status) {
        (JobKind::Transfer, Some(status)) => {
            format!("❌ Failed to get users from source server (API error: {status})")
        }
        (JobKind::Transfer, None) => "❌ Failed to connect to verification API.".to_string(),
        (JobKind::Restore, _) => "❌ Failed to get verified users from API.".to_string(),
    }
}

pub fn render_nothing_to_do(kind: JobKind, reason: EmptyReason) -> String {
    match (kind, reason) {
        (JobKind::Restore, EmptyReason::AllRestored) => {
            "✅ All users are already restored!".to_string()
        }
        (JobKind::Restore, EmptyReason::NoCandidates) => {
            "ℹ️ No verified users found for this server.".to_string()
        }
        (JobKind::Transfer, _) => "ℹ️ No verified users found in the source server.".to_string(),
    }
}
