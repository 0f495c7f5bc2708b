use super::*;
use shared::domain::{AttendanceRecord, AttendanceStatus};

fn ann() -> Student {
    Student {
        id: StudentId(1),
        name: "Ann".into(),
        email: "ann@x.com".into(),
        attendance: vec![
            AttendanceRecord::new("2025-10-05", AttendanceStatus::Present),
            AttendanceRecord::new("2025-10-06", AttendanceStatus::Late),
        ],
    }
}

fn bo() -> Student {
    Student {
        id: StudentId(2),
        name: "Bo".into(),
        email: "bo@y.com".into(),
        attendance: Vec::new(),
    }
}

#[test]
fn parses_theme_names_case_insensitively() {
    assert_eq!("Card".parse::<Theme>(), Ok(Theme::Card));
    assert_eq!(" plain ".parse::<Theme>(), Ok(Theme::Plain));
    assert!("neon".parse::<Theme>().is_err());
    for theme in Theme::ALL {
        assert_eq!(theme.to_string().parse::<Theme>(), Ok(theme));
    }
}

#[test]
fn every_theme_shows_name_email_and_attendance_count() {
    let student = ann();
    for theme in Theme::ALL {
        let line = theme.student(&student, false);
        assert!(line.contains("Ann"), "{theme}: {line}");
        assert!(line.contains("ann@x.com"), "{theme}: {line}");
        assert!(line.contains('2'), "{theme}: {line}");
        assert!(!line.contains("2025-10-05"), "{theme}: {line}");
    }
}

#[test]
fn expanded_entries_list_attendance_in_order() {
    let student = ann();
    for theme in Theme::ALL {
        let text = theme.student(&student, true);
        let first = text.find("2025-10-05").expect("first record");
        let second = text.find("2025-10-06").expect("second record");
        assert!(first < second, "{theme}: {text}");
        assert!(text.contains("Late"), "{theme}: {text}");
    }
}

#[test]
fn classic_line_layout() {
    assert_eq!(
        Theme::Classic.student(&bo(), false),
        "#2    Bo <bo@y.com>  (0 attendance)"
    );
    assert_eq!(Theme::Compact.student(&bo(), false), "2|Bo|bo@y.com|0");
}

#[test]
fn card_borders_fit_the_widest_line() {
    let card = Theme::Card.student(&bo(), false);
    let widths: Vec<_> = card.lines().map(|l| l.chars().count()).collect();
    assert_eq!(widths.len(), 5);
    assert!(widths.iter().all(|w| *w == widths[0]), "{card}");
}

#[test]
fn render_students_expands_only_selected_entries() {
    let (ann, bo) = (ann(), bo());
    let shown = vec![&ann, &bo];
    let expanded = HashSet::from([StudentId(1)]);
    let text = render_students(Theme::Plain, &shown, 3, &expanded);

    assert!(text.starts_with("Showing 2 of 3 students."));
    assert!(text.contains("2025-10-05 was Present"));
    assert!(!text.contains("(no attendance recorded)"));
}

#[test]
fn render_students_notes_an_empty_list() {
    let text = render_students(Theme::Compact, &[], 0, &HashSet::new());
    assert_eq!(text, "# students 0/0\n(no students)");
}

#[test]
fn error_banner_carries_message() {
    for theme in Theme::ALL {
        assert!(theme.error_banner("boom").contains("boom"));
    }
}

#[test]
fn unrecognised_status_is_shown_verbatim() {
    let mut student = bo();
    student
        .attendance
        .push(AttendanceRecord::new("2025-10-07", "Sick".to_string()));
    for theme in Theme::ALL {
        assert!(theme.student(&student, true).contains("Sick"), "{theme}");
    }
}
