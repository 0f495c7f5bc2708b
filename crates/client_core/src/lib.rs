use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{Student, StudentId},
    error::ApiError,
    protocol::{attendance_route, student_route, AttendanceRequest, NewStudentRequest, STUDENTS_ROUTE},
};
use tracing::debug;

pub mod config;
pub mod error;
pub mod view_model;

pub use config::ClientSettings;
pub use error::{ConfigError, ErrorKind, RecordServiceError};
pub use view_model::{
    filter_students, Action, ActionState, AdminViewModel, Command, FormState, ReloadStatus,
    SkipReason, SyncOutcome, ViewState,
};

const OP_LIST: &str = "list students";
const OP_CREATE: &str = "create student";
const OP_DELETE: &str = "delete student";
const OP_ATTENDANCE: &str = "record attendance";

/// The REST backend that owns student records.
#[async_trait]
pub trait RecordService: Send + Sync {
    async fn list_students(&self) -> Result<Vec<Student>, RecordServiceError>;
    async fn create_student(&self, request: &NewStudentRequest) -> Result<(), RecordServiceError>;
    async fn delete_student(&self, id: StudentId) -> Result<(), RecordServiceError>;
    async fn record_attendance(
        &self,
        id: StudentId,
        request: &AttendanceRequest,
    ) -> Result<(), RecordServiceError>;
}

pub struct HttpRecordService {
    http: Client,
    base_url: String,
}

impl HttpRecordService {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.api_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn ensure_success(
        operation: &'static str,
        response: Response,
    ) -> Result<Response, RecordServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Best effort: the service reports `{ "error": ... }` on most failures.
        let message = response
            .json::<ApiError>()
            .await
            .ok()
            .map(|body| body.message);
        Err(RecordServiceError::Status {
            operation,
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RecordService for HttpRecordService {
    async fn list_students(&self) -> Result<Vec<Student>, RecordServiceError> {
        let response = self
            .http
            .get(self.endpoint(STUDENTS_ROUTE))
            .send()
            .await
            .map_err(|e| RecordServiceError::from_reqwest(OP_LIST, e))?;
        let students: Vec<Student> = Self::ensure_success(OP_LIST, response)
            .await?
            .json()
            .await
            .map_err(|e| RecordServiceError::from_reqwest(OP_LIST, e))?;
        debug!(count = students.len(), "records: students fetched");
        Ok(students)
    }

    async fn create_student(&self, request: &NewStudentRequest) -> Result<(), RecordServiceError> {
        let response = self
            .http
            .post(self.endpoint(STUDENTS_ROUTE))
            .json(request)
            .send()
            .await
            .map_err(|e| RecordServiceError::from_reqwest(OP_CREATE, e))?;
        Self::ensure_success(OP_CREATE, response).await?;
        Ok(())
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), RecordServiceError> {
        let response = self
            .http
            .delete(self.endpoint(&student_route(id)))
            .send()
            .await
            .map_err(|e| RecordServiceError::from_reqwest(OP_DELETE, e))?;
        Self::ensure_success(OP_DELETE, response).await?;
        Ok(())
    }

    async fn record_attendance(
        &self,
        id: StudentId,
        request: &AttendanceRequest,
    ) -> Result<(), RecordServiceError> {
        let response = self
            .http
            .post(self.endpoint(&attendance_route(id)))
            .json(request)
            .send()
            .await
            .map_err(|e| RecordServiceError::from_reqwest(OP_ATTENDANCE, e))?;
        Self::ensure_success(OP_ATTENDANCE, response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
