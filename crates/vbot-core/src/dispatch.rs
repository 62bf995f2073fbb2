//! Routes a parsed slash command to its handler.
//!
//! The dispatcher owns no platform types: the adapter hands it an
//! `Invocation`, the raw option values and the two per-interaction ports.

use std::sync::Arc;

use crate::{
    api::types::{ManualVerification, RestoreRequest},
    cards,
    commands::{self, Args, CommandRequest, ConfigChange},
    config::Config,
    domain::{ChannelRef, GuildId, Invocation, RoleRef, UserRef},
    errors::Error,
    messaging::{port::InteractionPort, types::Reply},
    migration::{MigrationJob, MigrationWorkflow},
    ports::{GuildPort, VerificationApi},
    progress::ProgressReporter,
    Result,
};

pub struct CommandDispatcher {
    api: Arc<dyn VerificationApi>,
    cfg: Arc<Config>,
}

impl CommandDispatcher {
    pub fn new(api: Arc<dyn VerificationApi>, cfg: Arc<Config>) -> Self {
        Self { api, cfg }
    }

    /// Run one command to completion. Never fails: errors are reported to the
    /// invoker through `reply` and logged.
    pub async fn dispatch(
        &self,
        inv: &Invocation,
        name: &str,
        args: &Args,
        guilds: &dyn GuildPort,
        reply: &dyn InteractionPort,
    ) {
        tracing::info!(
            command = name,
            guild = %inv.guild.id,
            user = %inv.invoker.user.id,
            "command received"
        );

        let result = if commands::requires_admin(name) && !inv.invoker.is_admin {
            Err(Error::Permission(
                "❌ You need administrator permissions to use this command.".to_string(),
            ))
        } else {
            match CommandRequest::parse(name, args) {
                Ok(req) => self.execute(inv, req, guilds, reply).await,
                Err(e) => Err(e),
            }
        };

        if let Err(e) = result {
            match &e {
                Error::Validation(_) | Error::Permission(_) | Error::Precondition(_) => {
                    tracing::info!(command = name, error = %e, "command rejected");
                }
                Error::InteractionExpired => {
                    tracing::warn!(command = name, "interaction expired before reply");
                }
                _ => tracing::error!(command = name, error = %e, "command failed"),
            }
            respond_error(reply, &e).await;
        }
    }

    async fn execute(
        &self,
        inv: &Invocation,
        req: CommandRequest,
        guilds: &dyn GuildPort,
        reply: &dyn InteractionPort,
    ) -> Result<()> {
        match req {
            CommandRequest::Help => {
                let card = cards::help(
                    &self.cfg.brand_name,
                    &self.cfg.footer(),
                    inv.bot_avatar_url.clone(),
                );
                reply.respond(&card.into(), false).await
            }
            CommandRequest::Dashboard => {
                let card = cards::dashboard(&self.cfg.dashboard_url, &self.cfg.footer());
                reply.respond(&card.into(), false).await
            }
            CommandRequest::Stats => self.stats(inv, reply).await,
            CommandRequest::Send { channel } => self.send(inv, channel, guilds, reply).await,
            CommandRequest::Transfer {
                source,
                limit,
                role,
                delete_from_source,
            } => {
                self.transfer(inv, source, limit, role, delete_from_source, guilds, reply)
                    .await
            }
            CommandRequest::Restore { role, limit } => {
                reply.defer(false).await?;
                let job = MigrationJob::restore(inv.guild.clone(), limit, role);
                self.run_job(job, guilds, reply).await;
                Ok(())
            }
            CommandRequest::Config(change) => self.config(inv, change, reply).await,
            CommandRequest::Logs { limit, log_type } => {
                self.logs(inv, limit, log_type, reply).await
            }
            CommandRequest::Verify { user, role } => {
                self.verify(inv, user, role, guilds, reply).await
            }
        }
    }

    async fn run_job(
        &self,
        job: MigrationJob,
        guilds: &dyn GuildPort,
        reply: &dyn InteractionPort,
    ) {
        let reporter = ProgressReporter::new(reply, self.cfg.footer());
        let mut workflow = MigrationWorkflow::new(
            self.api.as_ref(),
            guilds,
            reporter,
            self.cfg.migration_settings(),
        );
        let outcome = workflow.run(job).await;
        tracing::debug!(?outcome, state = ?workflow.state(), "migration job returned");
    }

    #[allow(clippy::too_many_arguments)]
    async fn transfer(
        &self,
        inv: &Invocation,
        source: GuildId,
        limit: u32,
        role: Option<RoleRef>,
        delete_from_source: bool,
        guilds: &dyn GuildPort,
        reply: &dyn InteractionPort,
    ) -> Result<()> {
        if source == inv.guild.id {
            return Err(Error::Validation(
                "❌ Source and target server must be different.".to_string(),
            ));
        }

        reply.defer(false).await?;

        let Some(info) = guilds.guild_info(source).await? else {
            return Err(Error::Precondition(
                "❌ Source server not found or bot is not in that server.".to_string(),
            ));
        };
        if !info.bot_is_admin {
            return Err(Error::Precondition(
                "⚠️ Bot needs admin permissions in the source server to transfer users."
                    .to_string(),
            ));
        }

        let job = MigrationJob::transfer(
            info.guild,
            inv.guild.clone(),
            limit,
            role,
            delete_from_source,
        );
        self.run_job(job, guilds, reply).await;
        Ok(())
    }

    async fn send(
        &self,
        inv: &Invocation,
        channel: Option<ChannelRef>,
        guilds: &dyn GuildPort,
        reply: &dyn InteractionPort,
    ) -> Result<()> {
        reply.defer(true).await?;

        let target = channel.unwrap_or_else(|| inv.channel.clone());
        if !guilds.can_send(inv.guild.id, target.id).await? {
            return Err(Error::Precondition(
                "❌ I don't have permission to send messages in that channel.".to_string(),
            ));
        }

        let url = self.api.verification_url(inv.guild.id).await;
        let card = cards::verification_prompt(&inv.guild, &self.cfg.footer());
        if let Err(e) = guilds
            .send_card(target.id, &card, Some(&cards::verify_button(url)))
            .await
        {
            tracing::error!(channel = %target.id, error = %e, "verification card not sent");
            deliver(
                reply
                    .followup(
                        &Reply::text("❌ Failed to send verification embed. Please try again."),
                        true,
                    )
                    .await,
            );
            return Ok(());
        }

        deliver(
            reply
                .followup(
                    &Reply::text(format!(
                        "✅ Verification embed sent to {}!",
                        target.mention()
                    )),
                    true,
                )
                .await,
        );
        Ok(())
    }

    async fn stats(&self, inv: &Invocation, reply: &dyn InteractionPort) -> Result<()> {
        reply.defer(false).await?;
        let stats = match self.api.stats(inv.guild.id).await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(guild = %inv.guild.id, error = %e, "stats unavailable");
                Default::default()
            }
        };
        let card = cards::stats(&inv.guild, &stats, &self.cfg.footer());
        deliver(reply.edit_original(&card.into()).await);
        Ok(())
    }

    async fn config(
        &self,
        inv: &Invocation,
        change: ConfigChange,
        reply: &dyn InteractionPort,
    ) -> Result<()> {
        reply.defer(true).await?;
        let update = change.to_update();
        if let Err(e) = self.api.update_config(inv.guild.id, &update).await {
            tracing::error!(guild = %inv.guild.id, error = %e, "config update failed");
            deliver(
                reply
                    .followup(
                        &Reply::text(format!("❌ Failed to save configuration: {e}")),
                        true,
                    )
                    .await,
            );
            return Ok(());
        }
        let card = cards::config_updated(&change, &self.cfg.footer());
        deliver(reply.followup(&card.into(), true).await);
        Ok(())
    }

    async fn logs(
        &self,
        inv: &Invocation,
        limit: u32,
        log_type: Option<String>,
        reply: &dyn InteractionPort,
    ) -> Result<()> {
        reply.defer(true).await?;
        let logs = match self
            .api
            .logs(inv.guild.id, limit, log_type.as_deref())
            .await
        {
            Ok(logs) => logs,
            Err(e) => {
                tracing::warn!(guild = %inv.guild.id, error = %e, "logs unavailable");
                Vec::new()
            }
        };

        let out = if logs.is_empty() {
            Reply::text("No logs found for this server.")
        } else {
            cards::logs(&logs).into()
        };
        deliver(reply.followup(&out, true).await);
        Ok(())
    }

    async fn verify(
        &self,
        inv: &Invocation,
        user: UserRef,
        role: Option<RoleRef>,
        guilds: &dyn GuildPort,
        reply: &dyn InteractionPort,
    ) -> Result<()> {
        reply.defer(true).await?;

        let verified_by = inv.invoker.user.tag.as_str();
        let record = ManualVerification::new(
            user.id.to_string(),
            user.tag.clone(),
            inv.guild.id.to_string(),
            verified_by,
            user.avatar_url.clone(),
        );
        if let Err(e) = self.api.verify_manual(&record).await {
            tracing::error!(user = %user.id, error = %e, "manual verification rejected");
            deliver(
                reply
                    .followup(
                        &Reply::text("❌ Failed to register verification with API."),
                        true,
                    )
                    .await,
            );
            return Ok(());
        }

        if let Some(role) = &role {
            let reason = format!("Manually verified by {verified_by}");
            if let Err(e) = guilds.add_role(inv.guild.id, user.id, role.id, &reason).await {
                tracing::error!(user = %user.id, role = %role.id, error = %e, "role assignment failed");
            }
        }

        let mark = RestoreRequest {
            member_ids: vec![user.id.to_string()],
            role_id: role.as_ref().map(|r| r.id.to_string()),
        };
        if let Err(e) = self.api.mark_restored(inv.guild.id, &mark).await {
            tracing::error!(user = %user.id, error = %e, "restore mark failed");
        }

        let card = cards::user_verified(&user, role.as_ref(), verified_by);
        deliver(reply.followup(&card.into(), true).await);
        Ok(())
    }
}

/// Text shown to the invoker for a failed command.
pub fn user_message(err: &Error) -> String {
    match err {
        Error::Validation(msg) | Error::Permission(msg) | Error::Precondition(msg) => msg.clone(),
        Error::Api(e) => format!("❌ Verification API error: {e}"),
        Error::InteractionExpired => {
            "⚠️ Interaction timed out. Please try the command again.".to_string()
        }
        other => format!("❌ An error occurred: {other}"),
    }
}

/// Tell the invoker a command failed.
///
/// Uses the initial response while it is still available, otherwise (or if
/// that fails) a followup. An expired interaction goes straight to a
/// followup. Delivery failures are logged and dropped.
pub async fn respond_error(reply: &dyn InteractionPort, err: &Error) {
    let msg = Reply::text(user_message(err));
    let expired = matches!(err, Error::InteractionExpired);
    if !expired && !reply.is_acknowledged() {
        match reply.respond(&msg, true).await {
            Ok(()) => return,
            Err(e) => tracing::debug!(error = %e, "initial error response failed"),
        }
    }
    if let Err(e) = reply.followup(&msg, true).await {
        tracing::debug!(error = %e, "error followup not delivered");
    }
}

fn deliver(res: Result<()>) {
    if let Err(e) = res {
        tracing::debug!(error = %e, "reply not delivered");
    }
}
