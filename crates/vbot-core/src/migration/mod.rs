//! Batch member migration (transfer between guilds, restore within a guild).
//!
//! One `MigrationJob` per command invocation, owned by the workflow that runs
//! it. Candidates are processed strictly in order with a fixed delay between
//! them; per-candidate failures are values and never stop the loop.

mod workflow;

use std::time::Duration;

pub use workflow::MigrationWorkflow;

use crate::{
    api::types::MemberRecord,
    domain::{GuildRef, RoleRef},
    errors::ApiError,
};

pub const TRANSFER_LIMIT_MAX: u32 = 1000;
pub const RESTORE_LIMIT_MAX: u32 = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    /// Move verified users of another guild into the invoking guild.
    Transfer,
    /// Re-apply verification to the invoking guild's own verified users.
    Restore,
}

impl JobKind {
    /// Upper bound accepted for the `limit` argument.
    pub fn limit_ceiling(self) -> u32 {
        match self {
            JobKind::Transfer => TRANSFER_LIMIT_MAX,
            JobKind::Restore => RESTORE_LIMIT_MAX,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::Transfer => "transfer",
            JobKind::Restore => "restore",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MigrationSettings {
    /// Pause between two consecutive candidates.
    pub delay: Duration,
    /// Emit a progress update every time this many candidates have succeeded.
    pub progress_every: u32,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            progress_every: 10,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MigrationJob {
    pub kind: JobKind,
    pub source_guild: Option<GuildRef>,
    pub target_guild: GuildRef,
    pub candidates: Vec<MemberRecord>,
    /// 0 means unbounded.
    pub limit: u32,
    pub role: Option<RoleRef>,
    pub remove_from_source: bool,
}

impl MigrationJob {
    pub fn transfer(
        source: GuildRef,
        target: GuildRef,
        limit: u32,
        role: Option<RoleRef>,
        remove_from_source: bool,
    ) -> Self {
        Self {
            kind: JobKind::Transfer,
            source_guild: Some(source),
            target_guild: target,
            candidates: Vec::new(),
            limit,
            role,
            remove_from_source,
        }
    }

    pub fn restore(target: GuildRef, limit: u32, role: Option<RoleRef>) -> Self {
        Self {
            kind: JobKind::Restore,
            source_guild: None,
            target_guild: target,
            candidates: Vec::new(),
            limit,
            role,
            remove_from_source: false,
        }
    }

    /// Install the fetched list, dropping already-restored users for restore
    /// jobs and truncating to `limit`. Input order is preserved.
    pub fn select_candidates(&mut self, fetched: Vec<MemberRecord>) -> Selection {
        let fetched_len = fetched.len();
        let mut candidates = fetched;
        if self.kind == JobKind::Restore {
            candidates.retain(|m| !m.restored);
        }
        let after_filter = candidates.len();

        let limit = self.limit as usize;
        if limit > 0 && limit < candidates.len() {
            candidates.truncate(limit);
        }

        self.candidates = candidates;
        Selection {
            fetched: fetched_len,
            already_restored: fetched_len - after_filter,
            selected: self.candidates.len(),
        }
    }
}

/// How the fetched list was narrowed down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub fetched: usize,
    pub already_restored: usize,
    pub selected: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// Not a member of the target guild. Adding a user needs an OAuth grant
    /// (`guilds.join`) this bot never holds, so this is terminal.
    NotInTarget,
    /// The API record carried an id that is not a snowflake.
    InvalidId(String),
    /// Member lookup or role assignment failed on the platform.
    Platform(String),
}

/// Result of processing one candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Found in the target guild; nothing needed to change.
    Present,
    /// Found in the target guild and the requested role was newly added.
    RoleAssigned,
    Failed(FailureReason),
}

impl CandidateOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, CandidateOutcome::Failed(_))
    }
}

/// Running totals of one job. Buckets only ever increase.
///
/// `succeeded + failed == processed <= total`; `already_present` and
/// `roles_assigned` are disjoint subsets of `succeeded`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobCounters {
    pub processed: u32,
    pub succeeded: u32,
    pub already_present: u32,
    pub roles_assigned: u32,
    pub failed: u32,
    pub total: u32,
}

impl JobCounters {
    pub fn new(total: usize) -> Self {
        Self {
            total: u32::try_from(total).unwrap_or(u32::MAX),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &CandidateOutcome) {
        self.processed += 1;
        match outcome {
            CandidateOutcome::Present => {
                self.succeeded += 1;
                self.already_present += 1;
            }
            CandidateOutcome::RoleAssigned => {
                self.succeeded += 1;
                self.roles_assigned += 1;
            }
            CandidateOutcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }

    pub fn snapshot(&self, kind: JobKind) -> ProgressSnapshot {
        ProgressSnapshot {
            kind,
            counters: *self,
        }
    }
}

/// Immutable view of the counters at emission time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub kind: JobKind,
    pub counters: JobCounters,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Idle,
    FetchingCandidates,
    Filtering,
    Iterating,
    Completed,
    Aborted,
}

/// Why a job finished without processing anyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyReason {
    NoCandidates,
    AllRestored,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOutcome {
    /// Candidate fetch failed; nothing was processed.
    Aborted(ApiError),
    NothingToDo(EmptyReason),
    Completed(ProgressSnapshot),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GuildId;

    fn guild(id: u64) -> GuildRef {
        GuildRef {
            id: GuildId(id),
            name: format!("g{id}"),
            icon_url: None,
        }
    }

    fn records(n: usize) -> Vec<MemberRecord> {
        (1..=n)
            .map(|i| MemberRecord::new(i.to_string(), format!("user{i}")))
            .collect()
    }

    #[test]
    fn restore_selection_drops_restored_then_truncates() {
        let mut fetched = records(6);
        fetched[0].restored = true;
        fetched[3].restored = true;

        let mut job = MigrationJob::restore(guild(1), 3, None);
        let sel = job.select_candidates(fetched);

        assert_eq!(
            sel,
            Selection {
                fetched: 6,
                already_restored: 2,
                selected: 3
            }
        );
        let ids: Vec<_> = job.candidates.iter().map(|m| m.discord_id.as_str()).collect();
        assert_eq!(ids, ["2", "3", "5"]);
    }

    #[test]
    fn transfer_selection_keeps_restored_users() {
        let mut fetched = records(3);
        fetched[1].restored = true;
        let mut job = MigrationJob::transfer(guild(1), guild(2), 0, None, false);
        let sel = job.select_candidates(fetched);
        assert_eq!(sel.selected, 3);
        assert_eq!(sel.already_restored, 0);
    }

    #[test]
    fn limit_larger_than_list_is_a_no_op() {
        let mut job = MigrationJob::restore(guild(1), 50, None);
        job.select_candidates(records(4));
        assert_eq!(job.candidates.len(), 4);
    }

    #[test]
    fn counters_partition_processed() {
        let mut c = JobCounters::new(4);
        c.record(&CandidateOutcome::Present);
        c.record(&CandidateOutcome::RoleAssigned);
        c.record(&CandidateOutcome::Failed(FailureReason::NotInTarget));
        assert!(!c.is_complete());
        c.record(&CandidateOutcome::Present);

        assert!(c.is_complete());
        assert_eq!(c.succeeded + c.failed, c.processed);
        assert_eq!(c.already_present + c.roles_assigned, c.succeeded);
        assert_eq!((c.succeeded, c.already_present, c.failed), (3, 2, 1));
    }
}
