use super::*;

#[test]
fn theme_is_read_from_file() {
    assert_eq!(
        theme_from_file("api_url = \"http://localhost:5001\"\ntheme = \"compact\"\n"),
        Some(Theme::Compact)
    );
}

#[test]
fn missing_or_unknown_theme_in_file_is_ignored() {
    assert_eq!(theme_from_file("api_url = \"http://localhost:5001\"\n"), None);
    assert_eq!(theme_from_file("theme = \"neon\"\n"), None);
    assert_eq!(theme_from_file("theme = "), None);
}

#[test]
fn flags_override_file_values() {
    let dir = std::env::temp_dir().join(format!("console-settings-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("console.toml");
    std::fs::write(&path, "api_url = \"http://file:5001\"\ntheme = \"card\"\n").expect("write");

    let settings = ConsoleSettings::load(&path, Some("flag:7000/api/"), Some(Theme::Plain))
        .expect("load settings");
    assert_eq!(settings.client.api_url, "http://flag:7000/api");
    assert_eq!(settings.theme, Theme::Plain);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_api_url_flag_is_an_error() {
    let path = std::env::temp_dir().join("console-settings-missing.toml");
    assert!(ConsoleSettings::load(&path, Some("ftp://nope"), None).is_err());
}
