use serde::Deserialize;
use shared::{
    domain::{AttendanceRecord, AttendanceStatus, Student, StudentId},
    error::{ApiError, ErrorCode},
    protocol::{AttendanceResponse, DeleteResponse, UpdateStudentRequest},
};
use storage::Storage;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Body of `POST /students`. Fields are optional so a missing key maps to a
/// validation error instead of a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct CreateStudentBody {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceBody {
    pub date: Option<String>,
    pub status: Option<AttendanceStatus>,
}

pub async fn list_students(ctx: &ApiContext) -> Result<Vec<Student>, ApiError> {
    ctx.storage.list_students().await.map_err(internal)
}

pub async fn get_student(ctx: &ApiContext, id: StudentId) -> Result<Student, ApiError> {
    ctx.storage
        .get_student(id)
        .await
        .map_err(internal)?
        .ok_or_else(student_not_found)
}

pub async fn create_student(ctx: &ApiContext, body: CreateStudentBody) -> Result<Student, ApiError> {
    let (Some(name), Some(email)) = (body.name, body.email) else {
        return Err(ApiError::validation("name and email are required"));
    };

    let student = ctx
        .storage
        .create_student(&name, &email)
        .await
        .map_err(internal)?;
    info!(student_id = student.id.0, "records: student created");
    Ok(student)
}

pub async fn update_student(
    ctx: &ApiContext,
    id: StudentId,
    body: UpdateStudentRequest,
) -> Result<Student, ApiError> {
    if body.is_empty() {
        return Err(ApiError::validation("No updatable fields provided"));
    }

    ctx.storage
        .update_student(id, &body)
        .await
        .map_err(internal)?
        .ok_or_else(student_not_found)
}

pub async fn delete_student(ctx: &ApiContext, id: StudentId) -> Result<DeleteResponse, ApiError> {
    let deleted = ctx.storage.delete_student(id).await.map_err(internal)?;
    if !deleted {
        return Err(student_not_found());
    }
    info!(student_id = id.0, "records: student deleted");
    Ok(DeleteResponse {
        message: "Deleted".to_string(),
    })
}

pub async fn record_attendance(
    ctx: &ApiContext,
    id: StudentId,
    body: AttendanceBody,
) -> Result<AttendanceResponse, ApiError> {
    let (Some(date), Some(status)) = (body.date, body.status) else {
        return Err(ApiError::validation("date and status are required"));
    };

    let attendance = ctx
        .storage
        .append_attendance(id, &AttendanceRecord::new(date, status))
        .await
        .map_err(internal)?
        .ok_or_else(student_not_found)?;
    info!(
        student_id = id.0,
        entries = attendance.len(),
        "records: attendance recorded"
    );
    Ok(AttendanceResponse { id, attendance })
}

fn student_not_found() -> ApiError {
    ApiError::not_found("Student not found")
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
