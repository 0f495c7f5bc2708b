//! Client view-model for the student admin console.
//!
//! All UI state lives in [`ViewState`], which only changes through its update
//! methods. [`AdminViewModel`] wraps it with the effect boundary: it issues
//! requests to a [`RecordService`] and then re-fetches the whole collection.
//! Nothing is updated optimistically; the cache only ever holds the result of
//! the most recently issued successful reload.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use shared::{
    domain::{AttendanceStatus, Student, StudentId},
    protocol::{AttendanceRequest, NewStudentRequest},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{error::RecordServiceError, RecordService};

/// Case-insensitive substring match over name or email. An empty query keeps
/// every student; input order is preserved.
pub fn filter_students<'a>(students: &'a [Student], query: &str) -> Vec<&'a Student> {
    let needle = query.to_lowercase();
    students
        .iter()
        .filter(|student| {
            student.name.to_lowercase().contains(&needle)
                || student.email.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Pending user input. Never populated from server data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub email: String,
    pub search: String,
    pub att_date: String,
    pub att_status: AttendanceStatus,
}

/// Mutating actions that can be in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreateStudent,
    DeleteStudent(StudentId),
    RecordAttendance(StudentId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionState {
    #[default]
    Idle,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    MissingEmail,
    MissingAttendanceDate,
}

#[derive(Debug, Clone)]
pub enum ReloadStatus {
    NotIssued,
    Refreshed { count: usize },
    /// A later-issued reload was applied first; this response was dropped.
    Stale,
    Failed(RecordServiceError),
}

#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Form-only change; no request was made.
    Local,
    /// Precondition failed; no request was made.
    Skipped(SkipReason),
    /// The same action is still submitting; no request was made.
    Busy(Action),
    Applied(ReloadStatus),
    Rejected {
        error: RecordServiceError,
        reload: ReloadStatus,
    },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            SyncOutcome::Local => true,
            SyncOutcome::Applied(reload) => !matches!(reload, ReloadStatus::Failed(_)),
            _ => false,
        }
    }

    /// The request error, or the reload error when the request itself succeeded.
    pub fn error(&self) -> Option<&RecordServiceError> {
        match self {
            SyncOutcome::Rejected { error, .. } => Some(error),
            SyncOutcome::Applied(ReloadStatus::Failed(error)) => Some(error),
            _ => None,
        }
    }

    pub fn reload(&self) -> Option<&ReloadStatus> {
        match self {
            SyncOutcome::Applied(reload) | SyncOutcome::Rejected { reload, .. } => Some(reload),
            _ => None,
        }
    }
}

/// Commands accepted by [`AdminViewModel::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load,
    SetName(String),
    SetEmail(String),
    SetSearch(String),
    SetAttendanceDate(String),
    SetAttendanceStatus(AttendanceStatus),
    CreateStudent,
    DeleteStudent(StudentId),
    RecordAttendance(StudentId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket(u64);

/// Actions currently submitting. An entry is released when its
/// [`SubmitGuard`] drops, including when the operation future is cancelled.
#[derive(Debug, Default)]
pub struct InFlight(StdMutex<HashSet<Action>>);

impl InFlight {
    /// Idle -> Submitting. `None` when the action is already submitting.
    pub fn begin(&self, action: Action) -> Option<SubmitGuard<'_>> {
        let mut actions = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !actions.insert(action) {
            return None;
        }
        Some(SubmitGuard {
            in_flight: self,
            action,
        })
    }

    pub fn state(&self, action: Action) -> ActionState {
        let actions = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if actions.contains(&action) {
            ActionState::Submitting
        } else {
            ActionState::Idle
        }
    }
}

/// Submitting -> Idle when dropped.
#[derive(Debug)]
pub struct SubmitGuard<'a> {
    in_flight: &'a InFlight,
    action: Action,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.action);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    students: Vec<Student>,
    pub form: FormState,
    last_error: Option<String>,
    reloads_issued: u64,
    reload_applied: u64,
}

impl ViewState {
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn filtered(&self) -> Vec<&Student> {
        filter_students(&self.students, &self.form.search)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn create_request(&self) -> Result<NewStudentRequest, SkipReason> {
        // Empty-string check only; whitespace counts as input.
        if self.form.name.is_empty() {
            return Err(SkipReason::MissingName);
        }
        if self.form.email.is_empty() {
            return Err(SkipReason::MissingEmail);
        }
        Ok(NewStudentRequest {
            name: self.form.name.clone(),
            email: self.form.email.clone(),
        })
    }

    pub fn attendance_request(&self) -> Result<AttendanceRequest, SkipReason> {
        if self.form.att_date.is_empty() {
            return Err(SkipReason::MissingAttendanceDate);
        }
        Ok(AttendanceRequest {
            date: self.form.att_date.clone(),
            status: self.form.att_status,
        })
    }

    pub fn on_create_succeeded(&mut self) {
        self.form.name.clear();
        self.form.email.clear();
        self.last_error = None;
    }

    pub fn on_create_failed(&mut self, error: &RecordServiceError) {
        self.last_error = Some(error.to_string());
    }

    pub fn on_attendance_issued(&mut self) {
        self.form.att_date.clear();
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn issue_reload(&mut self) -> ReloadTicket {
        self.reloads_issued += 1;
        ReloadTicket(self.reloads_issued)
    }

    /// Replaces the whole cache unless a later-issued reload already landed.
    pub fn apply_reload(&mut self, ticket: ReloadTicket, students: Vec<Student>) -> bool {
        if ticket.0 <= self.reload_applied {
            return false;
        }
        self.reload_applied = ticket.0;
        self.students = students;
        true
    }
}

pub struct AdminViewModel {
    service: Arc<dyn RecordService>,
    state: Mutex<ViewState>,
    in_flight: InFlight,
}

impl AdminViewModel {
    pub fn new(service: Arc<dyn RecordService>) -> Arc<Self> {
        Arc::new(Self {
            service,
            state: Mutex::new(ViewState::default()),
            in_flight: InFlight::default(),
        })
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.clone()
    }

    pub async fn filtered(&self) -> Vec<Student> {
        let state = self.state.lock().await;
        state.filtered().into_iter().cloned().collect()
    }

    pub async fn action_state(&self, action: Action) -> ActionState {
        self.in_flight.state(action)
    }

    pub async fn set_name(&self, name: impl Into<String>) {
        self.state.lock().await.form.name = name.into();
    }

    pub async fn set_email(&self, email: impl Into<String>) {
        self.state.lock().await.form.email = email.into();
    }

    pub async fn set_search(&self, search: impl Into<String>) {
        self.state.lock().await.form.search = search.into();
    }

    pub async fn set_attendance_date(&self, date: impl Into<String>) {
        self.state.lock().await.form.att_date = date.into();
    }

    pub async fn set_attendance_status(&self, status: AttendanceStatus) {
        self.state.lock().await.form.att_status = status;
    }

    pub async fn dispatch(&self, command: Command) -> SyncOutcome {
        match command {
            Command::Load => SyncOutcome::Applied(self.load().await),
            Command::SetName(value) => {
                self.set_name(value).await;
                SyncOutcome::Local
            }
            Command::SetEmail(value) => {
                self.set_email(value).await;
                SyncOutcome::Local
            }
            Command::SetSearch(value) => {
                self.set_search(value).await;
                SyncOutcome::Local
            }
            Command::SetAttendanceDate(value) => {
                self.set_attendance_date(value).await;
                SyncOutcome::Local
            }
            Command::SetAttendanceStatus(status) => {
                self.set_attendance_status(status).await;
                SyncOutcome::Local
            }
            Command::CreateStudent => self.create_student().await,
            Command::DeleteStudent(id) => self.delete_student(id).await,
            Command::RecordAttendance(id) => self.record_attendance(id).await,
        }
    }

    /// Fetches the full collection and replaces the cache with it.
    pub async fn load(&self) -> ReloadStatus {
        let ticket = self.state.lock().await.issue_reload();
        match self.service.list_students().await {
            Ok(students) => {
                let count = students.len();
                if self.state.lock().await.apply_reload(ticket, students) {
                    debug!(count, "records: reload applied");
                    ReloadStatus::Refreshed { count }
                } else {
                    debug!("records: stale reload discarded");
                    ReloadStatus::Stale
                }
            }
            Err(error) => {
                warn!(%error, "records: reload failed; keeping cached students");
                ReloadStatus::Failed(error)
            }
        }
    }

    /// Submits the name/email form. On failure the form is kept and no
    /// reload is issued.
    pub async fn create_student(&self) -> SyncOutcome {
        let action = Action::CreateStudent;
        let request = match self.state.lock().await.create_request() {
            Ok(request) => request,
            Err(reason) => return SyncOutcome::Skipped(reason),
        };
        let Some(_submitting) = self.in_flight.begin(action) else {
            return SyncOutcome::Busy(action);
        };

        match self.service.create_student(&request).await {
            Ok(()) => {
                info!("records: student created");
                self.state.lock().await.on_create_succeeded();
                SyncOutcome::Applied(self.load().await)
            }
            Err(error) => {
                warn!(%error, "records: create student failed");
                self.state.lock().await.on_create_failed(&error);
                SyncOutcome::Rejected {
                    error,
                    reload: ReloadStatus::NotIssued,
                }
            }
        }
    }

    /// Deletes and reloads, whatever the delete response was.
    pub async fn delete_student(&self, id: StudentId) -> SyncOutcome {
        let action = Action::DeleteStudent(id);
        let Some(_submitting) = self.in_flight.begin(action) else {
            return SyncOutcome::Busy(action);
        };

        let result = self.service.delete_student(id).await;
        if let Err(error) = &result {
            warn!(student_id = id.0, %error, "records: delete student failed");
        }
        let reload = self.load().await;

        match result {
            Ok(()) => SyncOutcome::Applied(reload),
            Err(error) => SyncOutcome::Rejected { error, reload },
        }
    }

    /// Records the pending date/status for `id`. The date field is cleared as
    /// soon as the request has been issued, whatever its outcome.
    pub async fn record_attendance(&self, id: StudentId) -> SyncOutcome {
        let action = Action::RecordAttendance(id);
        let request = match self.state.lock().await.attendance_request() {
            Ok(request) => request,
            Err(reason) => return SyncOutcome::Skipped(reason),
        };
        let Some(_submitting) = self.in_flight.begin(action) else {
            return SyncOutcome::Busy(action);
        };

        let result = self.service.record_attendance(id, &request).await;
        if let Err(error) = &result {
            warn!(student_id = id.0, %error, "records: record attendance failed");
        }
        self.state.lock().await.on_attendance_issued();
        let reload = self.load().await;

        match result {
            Ok(()) => SyncOutcome::Applied(reload),
            Err(error) => SyncOutcome::Rejected { error, reload },
        }
    }
}

#[cfg(test)]
#[path = "tests/view_model_tests.rs"]
mod tests;
