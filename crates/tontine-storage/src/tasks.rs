use crate::error::StorageResult;
use crate::remote::Session;
use crate::slot::{Slot, SlotStore};
use async_trait::async_trait;
use tontine_core::TaskRecord;
use tracing::{error, warn};

/// Remote side of task persistence. Implemented by
/// [`crate::remote::RemoteTaskClient`] and by test fixtures.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn fetch_tasks(&self, session: &Session) -> StorageResult<Vec<TaskRecord>>;
    async fn upsert_task(&self, session: &Session, task: &TaskRecord) -> StorageResult<()>;
}

/// Which path a task save actually took. Callers and tests assert on this
/// instead of inferring the path from side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Every record reached the remote table.
    Remote,
    /// The remote side failed; the full collection went to the local
    /// backup slot instead.
    LocalFallback,
    /// No authenticated session; nothing was written anywhere.
    Skipped,
    /// Remote and backup both failed.
    Failed,
}

impl PersistOutcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::LocalFallback => "local-fallback",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// Task persistence orchestration: per-record remote upsert with a
/// best-effort local snapshot when the remote side fails. No retries, no
/// staleness protection.
pub struct TaskPersistence<B> {
    backend: B,
    slots: SlotStore,
}

impl<B: TaskBackend> TaskPersistence<B> {
    pub fn new(backend: B, slots: SlotStore) -> Self {
        Self { backend, slots }
    }

    /// Upsert every task by id. Skips entirely without a session; on the
    /// first remote failure the whole collection is snapshotted locally.
    pub async fn save(&self, tasks: &[TaskRecord], session: Option<&Session>) -> PersistOutcome {
        let Some(session) = session else {
            return PersistOutcome::Skipped;
        };

        for task in tasks {
            if let Err(err) = self.backend.upsert_task(session, task).await {
                warn!(error = %err, "remote task save failed, falling back to local snapshot");
                return match self.slots.save(Slot::TasksBackup, tasks) {
                    Ok(()) => PersistOutcome::LocalFallback,
                    Err(backup_err) => {
                        error!(error = %backup_err, "local task snapshot failed too");
                        PersistOutcome::Failed
                    }
                };
            }
        }
        PersistOutcome::Remote
    }

    /// Replace-with-remote load: the full remote result set, or an empty
    /// collection when unauthenticated or on any request failure.
    pub async fn load(&self, session: Option<&Session>) -> Vec<TaskRecord> {
        let Some(session) = session else {
            return Vec::new();
        };
        match self.backend.fetch_tasks(session).await {
            Ok(tasks) => tasks,
            Err(err) => {
                error!(error = %err, "remote task load failed, starting empty");
                Vec::new()
            }
        }
    }
}
