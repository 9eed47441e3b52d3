//! In-process session store.
//!
//! Used by `run --offline` and as the test double for the recorder. Every
//! call is logged in order, and each operation can be made to fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::types::{PomodoroRecord, PomodoroStatus, SessionId, SubjectId, TaskId};

use super::error::BackendError;
use super::{PomodoroBackend, StartRequest};

/// A call received by [`MemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Start {
        subject_id: Option<SubjectId>,
        task_id: Option<TaskId>,
        duration_minutes: Option<u32>,
    },
    Complete {
        session_id: SessionId,
        duration_minutes: u32,
    },
    Cancel {
        session_id: SessionId,
        duration_minutes: u32,
    },
    History {
        limit: u32,
    },
}

#[derive(Debug, Default)]
struct Store {
    next_id: i64,
    records: Vec<PomodoroRecord>,
    subjects: HashMap<SubjectId, String>,
    calls: Vec<BackendCall>,
}

/// Backend that keeps sessions in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
    fail_start: AtomicBool,
    fail_complete: AtomicBool,
    fail_cancel: AtomicBool,
    fail_history: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subject name returned with records that reference it.
    pub fn with_subject(self, subject_id: SubjectId, name: impl Into<String>) -> Self {
        self.store()
            .subjects
            .insert(subject_id, name.into());
        self
    }

    /// Seeds a record, as if it had been stored earlier.
    pub fn insert_record(&self, record: PomodoroRecord) {
        let mut store = self.store();
        store.next_id = store.next_id.max(record.id.0);
        store.records.push(record);
    }

    pub fn set_should_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_complete(&self, fail: bool) {
        self.fail_complete.store(fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_history(&self, fail: bool) {
        self.fail_history.store(fail, Ordering::SeqCst);
    }

    /// Returns every call received so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.store().calls.clone()
    }

    /// Returns the number of open calls received.
    pub fn start_count(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Start { .. }))
    }

    /// Returns the number of complete calls received.
    pub fn complete_count(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Complete { .. }))
    }

    /// Returns the number of cancel calls received.
    pub fn cancel_count(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::Cancel { .. }))
    }

    /// Returns the number of history calls received.
    pub fn history_count(&self) -> usize {
        self.count(|call| matches!(call, BackendCall::History { .. }))
    }

    /// Returns a stored record by id.
    pub fn record(&self, session_id: SessionId) -> Option<PomodoroRecord> {
        self.store()
            .records
            .iter()
            .find(|r| r.id == session_id)
            .cloned()
    }

    fn count(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.store()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self, call: BackendCall) {
        self.store().calls.push(call);
    }

    fn close(
        &self,
        session_id: SessionId,
        duration_minutes: u32,
        status: PomodoroStatus,
    ) -> Result<(), BackendError> {
        let mut store = self.store();
        let record = store
            .records
            .iter_mut()
            .find(|r| r.id == session_id)
            .ok_or_else(|| BackendError::Rejected(format!("pomodoro {session_id} not found")))?;

        if record.status != PomodoroStatus::Pending {
            return Err(BackendError::Rejected(format!(
                "pomodoro {session_id} is already {}",
                record.status.as_str()
            )));
        }

        record.status = status;
        record.duration_minutes = duration_minutes;
        record.end_time = Some(Utc::now());
        Ok(())
    }
}

impl PomodoroBackend for MemoryBackend {
    async fn start_pomodoro(&self, request: StartRequest) -> Result<PomodoroRecord, BackendError> {
        self.log(BackendCall::Start {
            subject_id: request.subject_id,
            task_id: request.task_id,
            duration_minutes: request.duration_minutes,
        });
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("start_pomodoro".to_string()));
        }

        let mut store = self.store();
        store.next_id += 1;
        let record = PomodoroRecord {
            id: SessionId(store.next_id),
            subject_id: request.subject_id,
            subject_name: request
                .subject_id
                .and_then(|id| store.subjects.get(&id).cloned()),
            task_id: request.task_id,
            start_time: Utc::now(),
            end_time: None,
            duration_minutes: request.duration_minutes.unwrap_or_default(),
            status: PomodoroStatus::Pending,
        };
        store.records.push(record.clone());
        Ok(record)
    }

    async fn complete_pomodoro(
        &self,
        session_id: SessionId,
        duration_minutes: u32,
    ) -> Result<(), BackendError> {
        self.log(BackendCall::Complete {
            session_id,
            duration_minutes,
        });
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("complete_pomodoro".to_string()));
        }
        self.close(session_id, duration_minutes, PomodoroStatus::Completed)
    }

    async fn cancel_pomodoro(
        &self,
        session_id: SessionId,
        duration_minutes: u32,
    ) -> Result<(), BackendError> {
        self.log(BackendCall::Cancel {
            session_id,
            duration_minutes,
        });
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("cancel_pomodoro".to_string()));
        }
        self.close(session_id, duration_minutes, PomodoroStatus::Cancelled)
    }

    async fn get_pomodoro_history(&self, limit: u32) -> Result<Vec<PomodoroRecord>, BackendError> {
        self.log(BackendCall::History { limit });
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("get_pomodoro_history".to_string()));
        }

        let mut records = self.store().records.clone();
        records.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.0.cmp(&a.id.0)));
        records.truncate(limit as usize);
        Ok(records)
    }
}
