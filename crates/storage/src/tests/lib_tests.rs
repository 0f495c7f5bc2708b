use super::*;
use shared::domain::{AttendanceStatus, RecordedStatus};

async fn memory_storage() -> Storage {
    Storage::new("sqlite::memory:").await.expect("db")
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = memory_storage().await;
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_and_lists_students_in_id_order() {
    let storage = memory_storage().await;
    let ann = storage
        .create_student("Ann", "ann@x.com")
        .await
        .expect("ann");
    let bo = storage.create_student("Bo", "bo@y.com").await.expect("bo");
    assert!(ann.id < bo.id);
    assert!(ann.attendance.is_empty());

    let students = storage.list_students().await.expect("list");
    let names: Vec<_> = students.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Bo"]);
}

#[tokio::test]
async fn attendance_is_appended_in_entry_order() {
    let storage = memory_storage().await;
    let ann = storage
        .create_student("Ann", "ann@x.com")
        .await
        .expect("ann");

    storage
        .append_attendance(
            ann.id,
            &AttendanceRecord::new("2025-10-06", AttendanceStatus::Late),
        )
        .await
        .expect("first");
    let attendance = storage
        .append_attendance(
            ann.id,
            &AttendanceRecord::new("2025-10-05", AttendanceStatus::Excused),
        )
        .await
        .expect("second")
        .expect("student exists");

    assert_eq!(
        attendance,
        vec![
            AttendanceRecord::new("2025-10-06", AttendanceStatus::Late),
            AttendanceRecord::new("2025-10-05", AttendanceStatus::Excused),
        ]
    );

    let listed = storage.list_students().await.expect("list");
    assert_eq!(listed[0].attendance, attendance);
}

#[tokio::test]
async fn attendance_for_missing_student_returns_none() {
    let storage = memory_storage().await;
    let result = storage
        .append_attendance(
            StudentId(99),
            &AttendanceRecord::new("2025-10-05", AttendanceStatus::Present),
        )
        .await
        .expect("query");
    assert!(result.is_none());
}

#[tokio::test]
async fn update_changes_only_provided_fields() {
    let storage = memory_storage().await;
    let ann = storage
        .create_student("Ann", "ann@x.com")
        .await
        .expect("ann");

    let updated = storage
        .update_student(
            ann.id,
            &UpdateStudentRequest {
                name: Some("Annie".to_string()),
                email: None,
            },
        )
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(updated.name, "Annie");
    assert_eq!(updated.email, "ann@x.com");

    let missing = storage
        .update_student(
            StudentId(404),
            &UpdateStudentRequest {
                name: Some("Nobody".to_string()),
                email: None,
            },
        )
        .await
        .expect("update");
    assert!(missing.is_none());
}

#[tokio::test]
async fn delete_removes_student_and_attendance() {
    let storage = memory_storage().await;
    let ann = storage
        .create_student("Ann", "ann@x.com")
        .await
        .expect("ann");
    storage
        .append_attendance(
            ann.id,
            &AttendanceRecord::new("2025-10-05", AttendanceStatus::Present),
        )
        .await
        .expect("attendance");

    assert!(storage.delete_student(ann.id).await.expect("delete"));
    assert!(!storage.delete_student(ann.id).await.expect("second delete"));
    assert!(storage.get_student(ann.id).await.expect("get").is_none());

    let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
        .fetch_one(storage.pool())
        .await
        .expect("count");
    assert_eq!(orphaned, 0);
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("student_records_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("students.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn sqlite_path_ignores_memory_and_foreign_urls() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/students.db?mode=rwc"),
        Some(PathBuf::from("./data/students.db"))
    );
}

#[tokio::test]
async fn foreign_status_rows_load_verbatim() {
    let storage = memory_storage().await;
    let ann = storage.create_student("Ann", "ann@x.com").await.expect("ann");
    sqlx::query("INSERT INTO attendance (student_id, date, status) VALUES (?, ?, ?), (?, ?, ?)")
        .bind(ann.id.0)
        .bind("2025-10-01")
        .bind("present")
        .bind(ann.id.0)
        .bind("2025-10-02")
        .bind("Sick")
        .execute(storage.pool())
        .await
        .expect("raw insert");

    let students = storage.list_students().await.expect("list");
    let attendance = &students[0].attendance;
    assert_eq!(attendance[0].status, AttendanceStatus::Present);
    assert_eq!(attendance[1].status, RecordedStatus::Other("Sick".into()));
}
