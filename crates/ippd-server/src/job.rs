// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job model and state machine (C4). One job per Print-Job/Create-Job
// request; transitions are confined to the edges in spec.md §4.4.

use std::path::PathBuf;
use std::time::SystemTime;

use ippd_proto::Attribute;

/// `job-state` (RFC 8011 §4.3.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Held,
    Processing,
    Stopped,
    Canceled,
    Aborted,
    Completed,
}

impl JobState {
    /// The `job-state` integer value this variant encodes as.
    pub const fn ipp_value(self) -> i32 {
        match self {
            JobState::Pending => 3,
            JobState::Held => 4,
            JobState::Processing => 5,
            JobState::Stopped => 6,
            JobState::Canceled => 7,
            JobState::Aborted => 8,
            JobState::Completed => 9,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, JobState::Canceled | JobState::Aborted | JobState::Completed)
    }
}

/// One print job, owned by a [`crate::printer::Printer`]'s job table.
///
/// Carries no back-reference to its printer — per design note 9, the printer
/// owns the job, and any code that needs the printer already has it in hand.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: i32,
    pub name: String,
    pub state: JobState,
    /// Latched cancel request; a writer observes this between chunks and
    /// transitions the job to `Canceled` (spec.md §5, "Cancellation").
    pub canceled: bool,
    pub completed_at: Option<SystemTime>,
    /// Job-template attributes copied from the creating request.
    pub attributes: Vec<Attribute>,
    pub document_path: Option<PathBuf>,
    pub document_format: String,
    /// Whether the creating request carried `job-hold-until` — feeds
    /// `job-state-reasons` while the job is `Held`.
    pub has_hold_until: bool,
    /// Number of documents already received (Send-Document legality check).
    pub documents_received: u32,
    /// The client id that created this job — Send-Document may only be
    /// issued within the creating session (spec.md §4.5).
    pub creating_connection: u64,
}

impl Job {
    pub fn new(id: i32, name: String, attributes: Vec<Attribute>, creating_connection: u64) -> Self {
        Self {
            id,
            name,
            state: JobState::Pending,
            canceled: false,
            completed_at: None,
            attributes,
            document_path: None,
            document_format: "application/octet-stream".to_string(),
            has_hold_until: false,
            documents_received: 0,
            creating_connection,
        }
    }

    /// `job-state-reasons`, derived purely from `(state, canceled,
    /// has_hold_until)` per RFC 8011 and spec.md §4.4.
    pub fn state_reasons(&self) -> &'static str {
        match (self.state, self.canceled, self.has_hold_until) {
            (JobState::Pending, _, _) => "none",
            (JobState::Held, _, true) => "job-hold-until-specified",
            (JobState::Held, _, false) => "job-incoming",
            (JobState::Processing, true, _) => "processing-to-stop-point",
            (JobState::Processing, false, _) => "job-printing",
            (JobState::Canceled, _, _) => "job-canceled-by-user",
            (JobState::Aborted, _, _) => "aborted-by-system",
            (JobState::Completed, _, _) => "job-completed-successfully",
            (JobState::Stopped, _, _) => "job-stopped",
        }
    }

    /// Transition to `Processing` once the document is fully received
    /// (Print-Job's inline body, or Send-Document with `last-document=true`).
    pub fn advance_to_processing(&mut self) {
        if self.state == JobState::Pending || self.state == JobState::Held {
            self.state = JobState::Processing;
        }
    }

    pub fn complete(&mut self, now: SystemTime) {
        if !self.state.is_terminal() {
            self.state = JobState::Completed;
            self.completed_at = Some(now);
        }
    }

    /// Cancel-Job: legal from pending/held/processing; latches `canceled`
    /// and, outside of processing, moves straight to the terminal state.
    pub fn cancel(&mut self, now: SystemTime) -> Result<(), crate::status::IppStatus> {
        if self.state.is_terminal() {
            return Err(crate::status::IppStatus::CLIENT_ERROR_NOT_POSSIBLE);
        }
        self.canceled = true;
        if self.state != JobState::Processing {
            self.state = JobState::Canceled;
            self.completed_at = Some(now);
        }
        Ok(())
    }

    pub fn abort(&mut self, now: SystemTime) {
        if !self.state.is_terminal() {
            self.state = JobState::Aborted;
            self.completed_at = Some(now);
        }
    }

    /// The writer observes a cancel latch between chunks and finalizes the
    /// transition to `Canceled` (spec.md §4.4's "state advances to canceled
    /// when writer observes it").
    pub fn observe_cancel_if_latched(&mut self, now: SystemTime) {
        if self.canceled && self.state == JobState::Processing {
            self.state = JobState::Canceled;
            self.completed_at = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(1, "test".into(), Vec::new(), 0)
    }

    #[test]
    fn new_job_is_pending_with_none_reason() {
        let j = job();
        assert_eq!(j.state, JobState::Pending);
        assert_eq!(j.state_reasons(), "none");
    }

    #[test]
    fn advance_to_processing_from_pending() {
        let mut j = job();
        j.advance_to_processing();
        assert_eq!(j.state, JobState::Processing);
        assert_eq!(j.state_reasons(), "job-printing");
    }

    #[test]
    fn cancel_pending_job_is_immediately_terminal() {
        let mut j = job();
        j.cancel(SystemTime::now()).unwrap();
        assert_eq!(j.state, JobState::Canceled);
        assert!(j.completed_at.is_some());
        assert_eq!(j.state_reasons(), "job-canceled-by-user");
    }

    #[test]
    fn cancel_processing_job_latches_until_observed() {
        let mut j = job();
        j.advance_to_processing();
        j.cancel(SystemTime::now()).unwrap();
        assert_eq!(j.state, JobState::Processing);
        assert!(j.canceled);
        assert_eq!(j.state_reasons(), "processing-to-stop-point");

        j.observe_cancel_if_latched(SystemTime::now());
        assert_eq!(j.state, JobState::Canceled);
    }

    #[test]
    fn cancel_terminal_job_is_rejected() {
        let mut j = job();
        j.complete(SystemTime::now());
        let err = j.cancel(SystemTime::now()).unwrap_err();
        assert_eq!(err, crate::status::IppStatus::CLIENT_ERROR_NOT_POSSIBLE);
    }

    #[test]
    fn abort_sets_terminal_state() {
        let mut j = job();
        j.abort(SystemTime::now());
        assert_eq!(j.state, JobState::Aborted);
        assert_eq!(j.state_reasons(), "aborted-by-system");
    }

    #[test]
    fn completed_job_cannot_be_reopened_by_further_transitions() {
        let mut j = job();
        j.complete(SystemTime::now());
        let completed_at = j.completed_at;
        j.advance_to_processing();
        assert_eq!(j.state, JobState::Completed);
        assert_eq!(j.completed_at, completed_at);
    }
}
