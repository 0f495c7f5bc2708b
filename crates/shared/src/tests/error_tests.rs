use super::*;

#[test]
fn serializes_message_under_error_key() {
    let json = serde_json::to_value(ApiError::not_found("Student not found")).expect("json");
    assert_eq!(
        json,
        serde_json::json!({"code": "not_found", "error": "Student not found"})
    );
}

#[test]
fn body_without_code_decodes_as_internal() {
    let err: ApiError = serde_json::from_str(r#"{"error":"boom"}"#).expect("json");
    assert_eq!(err, ApiError::new(ErrorCode::Internal, "boom"));
}
