use crate::{
    api::types::{MemberRecord, RestoreRequest},
    domain::UserId,
    ports::{ApiResult, GuildPort, VerificationApi},
    progress::ProgressReporter,
};

use super::{
    CandidateOutcome, EmptyReason, FailureReason, JobCounters, JobKind, JobOutcome, JobState,
    MigrationJob, MigrationSettings,
};

/// Drives one migration job to completion.
///
/// Strictly sequential: the only suspension points are the port calls and
/// the fixed inter-candidate delay.
pub struct MigrationWorkflow<'a> {
    api: &'a dyn VerificationApi,
    guilds: &'a dyn GuildPort,
    reporter: ProgressReporter<'a>,
    settings: MigrationSettings,
    state: JobState,
}

impl<'a> MigrationWorkflow<'a> {
    pub fn new(
        api: &'a dyn VerificationApi,
        guilds: &'a dyn GuildPort,
        reporter: ProgressReporter<'a>,
        settings: MigrationSettings,
    ) -> Self {
        Self {
            api,
            guilds,
            reporter,
            settings,
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    fn transition(&mut self, next: JobState) {
        tracing::debug!(from = ?self.state, to = ?next, "migration state");
        self.state = next;
    }

    pub async fn run(&mut self, mut job: MigrationJob) -> JobOutcome {
        let kind = job.kind;
        self.transition(JobState::FetchingCandidates);

        let fetched = match self.fetch_candidates(&job).await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!(job = kind.as_str(), error = %e, "candidate fetch failed");
                self.transition(JobState::Aborted);
                self.reporter.aborted(kind, &e).await;
                return JobOutcome::Aborted(e);
            }
        };

        self.transition(JobState::Filtering);
        let selection = job.select_candidates(fetched);
        tracing::info!(
            job = kind.as_str(),
            target = %job.target_guild.id,
            fetched = selection.fetched,
            already_restored = selection.already_restored,
            selected = selection.selected,
            "migration candidates selected"
        );

        if job.candidates.is_empty() {
            let reason = if selection.already_restored > 0 {
                EmptyReason::AllRestored
            } else {
                EmptyReason::NoCandidates
            };
            self.reporter.nothing_to_do(kind, reason).await;
            self.transition(JobState::Completed);
            return JobOutcome::NothingToDo(reason);
        }

        self.transition(JobState::Iterating);
        self.reporter.started(&job).await;

        let mut counters = JobCounters::new(job.candidates.len());
        let every = self.settings.progress_every.max(1);
        let last = job.candidates.len() - 1;

        for (idx, candidate) in job.candidates.iter().enumerate() {
            let outcome = self.process_candidate(&job, candidate).await;
            counters.record(&outcome);

            if outcome.is_success() && counters.succeeded % every == 0 {
                self.reporter.progress(&counters.snapshot(kind)).await;
            }

            if idx < last && !self.settings.delay.is_zero() {
                tokio::time::sleep(self.settings.delay).await;
            }
        }

        let snapshot = counters.snapshot(kind);
        tracing::info!(
            job = kind.as_str(),
            target = %job.target_guild.id,
            processed = counters.processed,
            succeeded = counters.succeeded,
            already_present = counters.already_present,
            failed = counters.failed,
            "migration finished"
        );
        self.reporter.finished(&job, &snapshot).await;
        self.transition(JobState::Completed);
        JobOutcome::Completed(snapshot)
    }

    async fn fetch_candidates(&self, job: &MigrationJob) -> ApiResult<Vec<MemberRecord>> {
        match (job.kind, &job.source_guild) {
            (JobKind::Transfer, Some(source)) => self.api.source_members(source.id).await,
            // A transfer without a source has nothing to read from.
            (JobKind::Transfer, None) => Ok(Vec::new()),
            (JobKind::Restore, _) => self.api.verified_users(job.target_guild.id).await,
        }
    }

    async fn process_candidate(
        &self,
        job: &MigrationJob,
        candidate: &MemberRecord,
    ) -> CandidateOutcome {
        let Some(user) = UserId::parse(&candidate.discord_id) else {
            tracing::warn!(id = %candidate.discord_id, "skipping candidate with invalid id");
            return CandidateOutcome::Failed(FailureReason::InvalidId(
                candidate.discord_id.clone(),
            ));
        };

        let outcome = self.resolve_in_target(job, user).await;
        match &outcome {
            CandidateOutcome::Failed(FailureReason::NotInTarget) => {
                // Joining a user to a guild needs their OAuth grant; we never hold one.
                tracing::warn!(
                    user = %user,
                    username = %candidate.username,
                    "not in target guild; cannot add without OAuth grant"
                );
            }
            CandidateOutcome::Failed(reason) => {
                tracing::error!(
                    user = %user,
                    username = %candidate.username,
                    ?reason,
                    "candidate failed"
                );
            }
            _ => self.after_success(job, user).await,
        }
        outcome
    }

    async fn resolve_in_target(&self, job: &MigrationJob, user: UserId) -> CandidateOutcome {
        let target = job.target_guild.id;
        let member = match self.guilds.fetch_member(target, user).await {
            Ok(Some(m)) => m,
            Ok(None) => return CandidateOutcome::Failed(FailureReason::NotInTarget),
            Err(e) => return CandidateOutcome::Failed(FailureReason::Platform(e.to_string())),
        };

        let Some(role) = &job.role else {
            return CandidateOutcome::Present;
        };
        if member.has_role(role.id) {
            return CandidateOutcome::Present;
        }

        let reason = match (job.kind, &job.source_guild) {
            (JobKind::Transfer, Some(source)) => format!("Transferred from {}", source.name),
            _ => "Verification restoration".to_string(),
        };
        match self.guilds.add_role(target, user, role.id, &reason).await {
            Ok(()) => CandidateOutcome::RoleAssigned,
            Err(e) => CandidateOutcome::Failed(FailureReason::Platform(e.to_string())),
        }
    }

    /// Best-effort side calls; none of them can change the candidate's outcome.
    async fn after_success(&self, job: &MigrationJob, user: UserId) {
        if job.remove_from_source {
            if let Some(source) = &job.source_guild {
                let reason = format!("Transferred to {}", job.target_guild.name);
                if let Err(e) = self.guilds.remove_member(source.id, user, &reason).await {
                    tracing::debug!(user = %user, error = %e, "removal from source skipped");
                }
            }
        }

        let req = RestoreRequest {
            member_ids: vec![user.to_string()],
            role_id: job.role.as_ref().map(|r| r.id.to_string()),
        };
        if let Err(e) = self.api.mark_restored(job.target_guild.id, &req).await {
            tracing::error!(user = %user, error = %e, "failed to mark user as restored in API");
        }
    }
}
