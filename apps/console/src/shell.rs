//! Line-oriented front end over the admin view-model.

use std::{collections::HashSet, io::Write, sync::Arc};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use client_core::{AdminViewModel, Command, ReloadStatus, SkipReason, SyncOutcome};
use shared::domain::{parse_attendance_date, AttendanceStatus, StudentId, ATTENDANCE_DATE_FORMAT};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::theme::{render_students, Theme};

pub const HELP: &str = "\
commands:
  name TEXT        set the pending student name
  email TEXT       set the pending student email
  add              create a student from the pending name and email
  search [TEXT]    filter by name or email (empty shows everyone)
  date DATE|today  set the pending attendance date (YYYY-MM-DD)
  status STATUS    Present, Absent, Late or Excused
  record ID        record the pending attendance for a student
  delete ID        delete a student (asks for confirmation)
  show ID          expand or collapse a student's attendance
  list             print the current list
  reload           fetch the list from the record service
  help             this text
  quit             leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    Command(Command),
    Delete(StudentId),
    Toggle(StudentId),
    List,
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str, today: NaiveDate) -> Result<ShellInput, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (keyword, rest) = match line.trim_start().split_once(' ') {
        Some((keyword, rest)) => (keyword, rest),
        None => (line.trim(), ""),
    };

    let input = match keyword.to_ascii_lowercase().as_str() {
        "" => ShellInput::Empty,
        "name" => ShellInput::Command(Command::SetName(rest.trim().to_string())),
        "email" => ShellInput::Command(Command::SetEmail(rest.trim().to_string())),
        "add" => ShellInput::Command(Command::CreateStudent),
        "search" => ShellInput::Command(Command::SetSearch(rest.to_string())),
        "date" => ShellInput::Command(Command::SetAttendanceDate(resolve_date(rest, today)?)),
        "status" => {
            let status: AttendanceStatus = rest.parse().map_err(|e| format!("{e}"))?;
            ShellInput::Command(Command::SetAttendanceStatus(status))
        }
        "record" => ShellInput::Command(Command::RecordAttendance(parse_id(rest)?)),
        "delete" => ShellInput::Delete(parse_id(rest)?),
        "show" => ShellInput::Toggle(parse_id(rest)?),
        "list" => ShellInput::List,
        "reload" => ShellInput::Command(Command::Load),
        "help" | "?" => ShellInput::Help,
        "quit" | "exit" => ShellInput::Quit,
        other => return Err(format!("unknown command '{other}'; type 'help'")),
    };
    Ok(input)
}

fn parse_id(raw: &str) -> Result<StudentId, String> {
    raw.trim()
        .parse::<i64>()
        .map(StudentId)
        .map_err(|_| format!("expected a student id, got '{}'", raw.trim()))
}

/// Empty clears the date; `today` uses the local calendar date.
pub fn resolve_date(raw: &str, today: NaiveDate) -> Result<String, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(String::new());
    }
    let date = if raw.eq_ignore_ascii_case("today") {
        today
    } else {
        parse_attendance_date(raw).ok_or_else(|| format!("'{raw}' is not a YYYY-MM-DD date"))?
    };
    Ok(date.format(ATTENDANCE_DATE_FORMAT).to_string())
}

pub fn confirmed(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// One line per outcome worth telling the user about; form edits say nothing.
pub fn describe_outcome(theme: Theme, outcome: &SyncOutcome) -> Option<String> {
    match outcome {
        SyncOutcome::Local => None,
        SyncOutcome::Skipped(reason) => Some(format!(
            "nothing sent: {}",
            match reason {
                SkipReason::MissingName => "name is empty",
                SkipReason::MissingEmail => "email is empty",
                SkipReason::MissingAttendanceDate => "attendance date is empty",
            }
        )),
        SyncOutcome::Busy(action) => Some(format!("still submitting {action:?}; try again shortly")),
        SyncOutcome::Applied(reload) => Some(describe_reload(theme, reload)),
        SyncOutcome::Rejected { error, reload } => {
            let mut out = theme.error_banner(&error.to_string());
            if !matches!(reload, ReloadStatus::NotIssued) {
                out.push('\n');
                out.push_str(&describe_reload(theme, reload));
            }
            Some(out)
        }
    }
}

fn describe_reload(theme: Theme, reload: &ReloadStatus) -> String {
    match reload {
        ReloadStatus::NotIssued => "done".to_string(),
        ReloadStatus::Refreshed { count } => format!("reloaded {count} students"),
        ReloadStatus::Stale => "a newer reload is already shown".to_string(),
        ReloadStatus::Failed(error) => theme.error_banner(&format!("reload failed: {error}")),
    }
}

pub async fn print_list(vm: &AdminViewModel, theme: Theme, expanded: &HashSet<StudentId>) {
    let state = vm.snapshot().await;
    let shown = state.filtered();
    println!("{}", render_students(theme, &shown, state.students().len(), expanded));
    if let Some(error) = state.last_error() {
        println!("{}", theme.error_banner(error));
    }
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

pub async fn run(vm: Arc<AdminViewModel>, theme: Theme, assume_yes: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut expanded = HashSet::new();

    if let Some(message) = describe_outcome(theme, &vm.dispatch(Command::Load).await) {
        println!("{message}");
    }
    print_list(&vm, theme, &expanded).await;

    loop {
        prompt("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = match parse_line(&line, Local::now().date_naive()) {
            Ok(input) => input,
            Err(message) => {
                println!("{}", theme.error_banner(&message));
                continue;
            }
        };

        match input {
            ShellInput::Empty => {}
            ShellInput::Quit => break,
            ShellInput::Help => println!("{HELP}"),
            ShellInput::List => print_list(&vm, theme, &expanded).await,
            ShellInput::Toggle(id) => {
                if !expanded.remove(&id) {
                    expanded.insert(id);
                }
                print_list(&vm, theme, &expanded).await;
            }
            ShellInput::Delete(id) => {
                if !assume_yes {
                    prompt(&format!("delete student {id}? [y/N] "));
                    let answer = lines.next_line().await?.unwrap_or_default();
                    if !confirmed(&answer) {
                        println!("cancelled");
                        continue;
                    }
                }
                expanded.remove(&id);
                let outcome = vm.dispatch(Command::DeleteStudent(id)).await;
                if let Some(message) = describe_outcome(theme, &outcome) {
                    println!("{message}");
                }
                print_list(&vm, theme, &expanded).await;
            }
            ShellInput::Command(command) => {
                let refreshes = matches!(
                    command,
                    Command::Load
                        | Command::SetSearch(_)
                        | Command::CreateStudent
                        | Command::RecordAttendance(_)
                );
                let outcome = vm.dispatch(command).await;
                if let Some(message) = describe_outcome(theme, &outcome) {
                    println!("{message}");
                }
                if refreshes {
                    print_list(&vm, theme, &expanded).await;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
