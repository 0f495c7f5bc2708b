use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite, Transaction,
};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::{
    domain::{AttendanceRecord, Student, StudentId},
    protocol::UpdateStudentRequest,
};

const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every in-memory connection is its own database, so keep a single one.
        let max_connections = if database_url.starts_with(MEMORY_URL) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// All students ordered by id, each with attendance in entry order.
    pub async fn list_students(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query("SELECT id, name, email FROM students ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .context("failed to list students")?;

        let mut students: BTreeMap<i64, Student> = BTreeMap::new();
        for row in rows {
            let student = student_from_row(&row);
            students.insert(student.id.0, student);
        }

        let attendance_rows =
            sqlx::query("SELECT student_id, date, status FROM attendance ORDER BY student_id, id")
                .fetch_all(&self.pool)
                .await
                .context("failed to list attendance")?;
        for row in attendance_rows {
            let student_id: i64 = row.get(0);
            if let Some(student) = students.get_mut(&student_id) {
                student.attendance.push(attendance_from_row(&row, 1)?);
            }
        }

        Ok(students.into_values().collect())
    }

    pub async fn get_student(&self, id: StudentId) -> Result<Option<Student>> {
        let row = sqlx::query("SELECT id, name, email FROM students WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut student = student_from_row(&row);
        student.attendance = self.attendance_for(id).await?;
        Ok(Some(student))
    }

    pub async fn create_student(&self, name: &str, email: &str) -> Result<Student> {
        let rec = sqlx::query("INSERT INTO students (name, email) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .context("failed to insert student")?;
        let id = StudentId(rec.get::<i64, _>(0));
        debug!(student_id = id.0, "storage: student inserted");
        Ok(Student {
            id,
            name: name.to_string(),
            email: email.to_string(),
            attendance: Vec::new(),
        })
    }

    /// Applies the provided fields; `None` when the student does not exist.
    pub async fn update_student(
        &self,
        id: StudentId,
        update: &UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        let updated = sqlx::query(
            "UPDATE students
             SET name = COALESCE(?1, name), email = COALESCE(?2, email)
             WHERE id = ?3
             RETURNING id",
        )
        .bind(update.name.as_deref())
        .bind(update.email.as_deref())
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update student")?;

        if updated.is_none() {
            return Ok(None);
        }
        self.get_student(id).await
    }

    /// Returns `false` when no student had this id.
    pub async fn delete_student(&self, id: StudentId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM attendance WHERE student_id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM students WHERE id = ? RETURNING id")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await
            .context("failed to delete student")?;
        tx.commit().await?;
        Ok(deleted.is_some())
    }

    /// Appends one record and returns the student's full attendance list, or
    /// `None` when the student does not exist. Runs in a single transaction.
    pub async fn append_attendance(
        &self,
        id: StudentId,
        record: &AttendanceRecord,
    ) -> Result<Option<Vec<AttendanceRecord>>> {
        let mut tx = self.pool.begin().await?;
        let exists = sqlx::query("SELECT 1 FROM students WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            tx.rollback().await?;
            return Ok(None);
        }

        sqlx::query("INSERT INTO attendance (student_id, date, status) VALUES (?, ?, ?)")
            .bind(id.0)
            .bind(&record.date)
            .bind(record.status.as_str())
            .execute(&mut *tx)
            .await
            .context("failed to insert attendance")?;
        let attendance = attendance_in_tx(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(attendance))
    }

    async fn attendance_for(&self, id: StudentId) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query("SELECT date, status FROM attendance WHERE student_id = ? ORDER BY id")
            .bind(id.0)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| attendance_from_row(row, 0)).collect()
    }
}

async fn attendance_in_tx(
    tx: &mut Transaction<'_, Sqlite>,
    id: StudentId,
) -> Result<Vec<AttendanceRecord>> {
    let rows = sqlx::query("SELECT date, status FROM attendance WHERE student_id = ? ORDER BY id")
        .bind(id.0)
        .fetch_all(&mut **tx)
        .await?;
    rows.iter().map(|row| attendance_from_row(row, 0)).collect()
}

fn student_from_row(row: &SqliteRow) -> Student {
    Student {
        id: StudentId(row.get::<i64, _>(0)),
        name: row.get::<String, _>(1),
        email: row.get::<String, _>(2),
        attendance: Vec::new(),
    }
}

fn attendance_from_row(row: &SqliteRow, offset: usize) -> Result<AttendanceRecord> {
    let date: String = row.try_get(offset)?;
    let status: String = row.try_get(offset + 1)?;
    Ok(AttendanceRecord::new(date, status))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_URL) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
