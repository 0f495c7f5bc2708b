use super::*;

#[test]
fn student_without_attendance_key_decodes_as_empty() {
    let student: Student =
        serde_json::from_str(r#"{"id":1,"name":"Ann","email":"ann@x.com"}"#).expect("json");
    assert!(student.attendance.is_empty());
    assert_eq!(student.attendance_count(), 0);
}

#[test]
fn student_with_null_attendance_decodes_as_empty() {
    let student: Student = serde_json::from_str(
        r#"{"id":1,"name":"Ann","email":"ann@x.com","attendance":null}"#,
    )
    .expect("json");
    assert!(student.attendance.is_empty());
}

#[test]
fn attendance_keeps_wire_order() {
    let student: Student = serde_json::from_str(
        r#"{"id":7,"name":"Bo","email":"bo@y.com","attendance":[
            {"date":"2025-10-06","status":"Late"},
            {"date":"2025-10-05","status":"Present"}
        ]}"#,
    )
    .expect("json");
    assert_eq!(student.id, StudentId(7));
    assert_eq!(
        student.attendance,
        vec![
            AttendanceRecord::new("2025-10-06", AttendanceStatus::Late),
            AttendanceRecord::new("2025-10-05", AttendanceStatus::Present),
        ]
    );
}

#[test]
fn student_id_serializes_as_plain_number() {
    let json = serde_json::to_value(StudentId(42)).expect("json");
    assert_eq!(json, serde_json::json!(42));
}

#[test]
fn attendance_status_uses_capitalized_wire_names() {
    for status in AttendanceStatus::ALL {
        let json = serde_json::to_value(status).expect("json");
        assert_eq!(json, serde_json::json!(status.as_str()));
    }
}

#[test]
fn attendance_status_parses_case_insensitively() {
    assert_eq!("late".parse::<AttendanceStatus>(), Ok(AttendanceStatus::Late));
    assert_eq!(
        " EXCUSED ".parse::<AttendanceStatus>(),
        Ok(AttendanceStatus::Excused)
    );
    assert!("sick".parse::<AttendanceStatus>().is_err());
}

#[test]
fn default_attendance_status_is_present() {
    assert_eq!(AttendanceStatus::default(), AttendanceStatus::Present);
}

#[test]
fn calendar_date_accepts_only_iso_dates() {
    let record = AttendanceRecord::new("2025-10-05", AttendanceStatus::Present);
    assert_eq!(
        record.calendar_date(),
        NaiveDate::from_ymd_opt(2025, 10, 5)
    );
    assert_eq!(
        AttendanceRecord::new("05/10/2025", AttendanceStatus::Present).calendar_date(),
        None
    );
}

#[test]
fn recorded_status_tolerates_other_spellings_and_values() {
    let students: Vec<Student> = serde_json::from_str(
        r#"[{"id":1,"name":"Ann","email":"ann@x.com","attendance":[{"date":"2025-10-01","status":"present"}]},
            {"id":2,"name":"Bo","email":"bo@y.com","attendance":[{"date":"2025-10-01","status":"Sick"}]}]"#,
    )
    .expect("json");
    assert_eq!(students.len(), 2);
    assert_eq!(students[0].attendance[0].status, AttendanceStatus::Present);
    assert_eq!(
        students[1].attendance[0].status,
        RecordedStatus::Other("Sick".into())
    );
    assert_eq!(students[1].attendance[0].status.known(), None);
}

#[test]
fn recorded_status_serializes_canonical_or_verbatim() {
    let known = serde_json::to_value(RecordedStatus::from("late".to_string())).expect("json");
    assert_eq!(known, serde_json::json!("Late"));
    let other = serde_json::to_value(RecordedStatus::Other("Sick".into())).expect("json");
    assert_eq!(other, serde_json::json!("Sick"));
}
