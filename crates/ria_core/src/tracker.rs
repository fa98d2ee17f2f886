use crate::{JobId, JobKind, JobSnapshot, JobStatus, StatusUpdate};

/// Where a tracker is in its submit → poll → terminate cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrackerPhase {
    #[default]
    Idle,
    /// Submission request is in flight; no id yet.
    Submitting,
    /// Server accepted the job; the snapshot follows polling responses.
    Tracking(JobSnapshot),
    /// Submission failed before any id was assigned.
    Rejected { message: String },
}

/// What a polling response did to the tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Continue,
    Done,
    Failed,
}

/// Pure state for one job kind.
///
/// Every asynchronous result is tagged with the generation of the
/// submission that produced it. Results from an older generation, or for a
/// job this tracker no longer polls, are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerState {
    kind: JobKind,
    generation: u64,
    polling: bool,
    phase: TrackerPhase,
}

impl TrackerState {
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            generation: 0,
            polling: false,
            phase: TrackerPhase::Idle,
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn next_generation(&self) -> u64 {
        self.generation + 1
    }

    pub fn phase(&self) -> &TrackerPhase {
        &self.phase
    }

    pub fn snapshot(&self) -> Option<&JobSnapshot> {
        match &self.phase {
            TrackerPhase::Tracking(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.snapshot().map(JobSnapshot::id)
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// A submission is in flight or a polling cycle is active.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, TrackerPhase::Submitting) || self.polling
    }

    /// Terminal from the user's point of view: done, failed, or rejected.
    pub fn is_settled(&self) -> bool {
        match &self.phase {
            TrackerPhase::Idle | TrackerPhase::Rejected { .. } => true,
            TrackerPhase::Submitting => false,
            TrackerPhase::Tracking(snapshot) => snapshot.is_terminal() || !self.polling,
        }
    }

    pub fn is_done(&self) -> bool {
        self.snapshot()
            .is_some_and(|snapshot| snapshot.status == JobStatus::Done)
    }

    /// Start a new submission, superseding whatever this tracker held.
    /// Returns false if `generation` is not newer than the current one.
    pub fn begin_submit(&mut self, generation: u64) -> bool {
        if generation <= self.generation {
            return false;
        }
        self.generation = generation;
        self.polling = false;
        self.phase = TrackerPhase::Submitting;
        true
    }

    pub fn accept_submission(&mut self, generation: u64, job_id: JobId) -> bool {
        if generation != self.generation || self.phase != TrackerPhase::Submitting {
            return false;
        }
        self.phase = TrackerPhase::Tracking(JobSnapshot::queued(job_id));
        self.polling = true;
        true
    }

    pub fn reject_submission(&mut self, generation: u64, message: impl Into<String>) -> bool {
        if generation != self.generation || self.phase != TrackerPhase::Submitting {
            return false;
        }
        self.phase = TrackerPhase::Rejected {
            message: message.into(),
        };
        true
    }

    /// Merge one polling response. `None` means the response was stale and
    /// was not applied.
    pub fn apply_status(
        &mut self,
        generation: u64,
        job_id: &JobId,
        update: StatusUpdate,
    ) -> Option<StatusOutcome> {
        let snapshot = self.live_snapshot(generation, job_id)?;
        snapshot.apply(update);
        let outcome = match snapshot.status {
            JobStatus::Done => StatusOutcome::Done,
            JobStatus::Error => StatusOutcome::Failed,
            _ => StatusOutcome::Continue,
        };
        if outcome != StatusOutcome::Continue {
            self.polling = false;
        }
        Some(outcome)
    }

    /// Polling gave up; the job becomes a terminal error with `message`.
    pub fn abandon(&mut self, generation: u64, job_id: &JobId, message: impl Into<String>) -> bool {
        let Some(snapshot) = self.live_snapshot(generation, job_id) else {
            return false;
        };
        snapshot.fail(message.into());
        self.polling = false;
        true
    }

    /// Stop following the current job. Fetched data is kept. Safe to call
    /// repeatedly.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_busy();
        self.polling = false;
        if self.phase == TrackerPhase::Submitting {
            self.phase = TrackerPhase::Idle;
        }
        was_active
    }

    /// Forget the current job entirely.
    pub fn clear(&mut self) {
        self.polling = false;
        self.phase = TrackerPhase::Idle;
    }

    fn live_snapshot(&mut self, generation: u64, job_id: &JobId) -> Option<&mut JobSnapshot> {
        if generation != self.generation || !self.polling {
            return None;
        }
        match &mut self.phase {
            TrackerPhase::Tracking(snapshot) if snapshot.id() == job_id => Some(snapshot),
            _ => None,
        }
    }
}
