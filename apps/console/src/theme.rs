//! Presentation presets for the student list.
//!
//! Every preset renders the same information (header, one entry per student
//! with its attendance count, the expanded attendance list, an error banner);
//! only the layout differs.

use std::{collections::HashSet, fmt, str::FromStr};

use shared::domain::{Student, StudentId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Classic,
    Compact,
    Card,
    Plain,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Classic, Theme::Compact, Theme::Card, Theme::Plain];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Compact => "compact",
            Theme::Card => "card",
            Theme::Plain => "plain",
        }
    }

    pub fn header(self, shown: usize, total: usize) -> String {
        match self {
            Theme::Classic => {
                let title = format!("Student Records ({shown} of {total})");
                let rule = "=".repeat(title.len());
                format!("{title}\n{rule}")
            }
            Theme::Compact => format!("# students {shown}/{total}"),
            Theme::Card => format!("[ Student Records | showing {shown} of {total} ]"),
            Theme::Plain => format!("Showing {shown} of {total} students."),
        }
    }

    pub fn student(self, student: &Student, expanded: bool) -> String {
        let count = student.attendance_count();
        let mut out = match self {
            Theme::Classic => format!(
                "#{:<4} {} <{}>  ({count} attendance)",
                student.id.0, student.name, student.email
            ),
            Theme::Compact => format!(
                "{}|{}|{}|{count}",
                student.id, student.name, student.email
            ),
            Theme::Card => card(student, count),
            Theme::Plain => format!(
                "{} ({}), id {}, {count} attendance records",
                student.name, student.email, student.id
            ),
        };
        if expanded {
            for record in &student.attendance {
                out.push('\n');
                out.push_str(&match self {
                    Theme::Classic => format!("      {}  {}", record.date, record.status),
                    Theme::Compact => format!("  {} {}", record.date, record.status),
                    Theme::Card => format!("  - {}: {}", record.date, record.status),
                    Theme::Plain => format!("  {} was {}", record.date, record.status),
                });
            }
            if student.attendance.is_empty() && self != Theme::Compact {
                out.push_str("\n  (no attendance recorded)");
            }
        }
        out
    }

    pub fn error_banner(self, message: &str) -> String {
        match self {
            Theme::Classic => format!("!! error: {message}"),
            Theme::Compact => format!("ERR {message}"),
            Theme::Card => format!("[ error ] {message}"),
            Theme::Plain => format!("Error: {message}"),
        }
    }
}

fn card(student: &Student, count: usize) -> String {
    let lines = [
        format!("#{} {}", student.id, student.name),
        student.email.clone(),
        format!("attendance: {count}"),
    ];
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let border = format!("+{}+", "-".repeat(width + 2));
    let mut out = border.clone();
    for line in &lines {
        let pad = width - line.chars().count();
        out.push_str(&format!("\n| {line}{} |", " ".repeat(pad)));
    }
    out.push('\n');
    out.push_str(&border);
    out
}

/// Header plus one entry per shown student; `expanded` selects which
/// entries list their attendance.
pub fn render_students(
    theme: Theme,
    shown: &[&Student],
    total: usize,
    expanded: &HashSet<StudentId>,
) -> String {
    let mut out = theme.header(shown.len(), total);
    for student in shown {
        out.push('\n');
        out.push_str(&theme.student(student, expanded.contains(&student.id)));
    }
    if shown.is_empty() {
        out.push_str("\n(no students)");
    }
    out
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!("unknown theme '{wanted}' (expected classic, compact, card or plain)")
            })
    }
}

#[cfg(test)]
#[path = "tests/theme_tests.rs"]
mod tests;
