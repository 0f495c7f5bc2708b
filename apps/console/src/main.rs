use std::{collections::HashSet, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use client_core::{AdminViewModel, Command, HttpRecordService, ReloadStatus, SyncOutcome};
use shared::domain::{AttendanceStatus, StudentId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod settings;
mod shell;
mod theme;

use settings::ConsoleSettings;
use shell::{confirmed, describe_outcome, print_list, resolve_date};
use theme::Theme;

#[derive(Parser, Debug)]
#[command(about = "Student records admin console")]
struct Cli {
    /// Record service base URL, e.g. http://localhost:5001 or http://host/api
    #[arg(long)]
    api_url: Option<String>,
    /// classic, compact, card or plain
    #[arg(long)]
    theme: Option<Theme>,
    #[arg(long, default_value = "console.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print all students, optionally filtered by name or email.
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a student.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Delete a student.
    Delete {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
    /// Record attendance for a student.
    Attend {
        id: i64,
        /// YYYY-MM-DD or `today`
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "Present")]
        status: AttendanceStatus,
    },
    /// Print one student with its attendance.
    Show { id: i64 },
    /// Interactive session.
    Shell {
        /// Skip delete confirmations.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = ConsoleSettings::load(
        &cli.config,
        cli.api_url.as_deref(),
        cli.theme,
    )?;
    info!(api_url = %settings.client.api_url, theme = %settings.theme, "console: starting");

    let service = Arc::new(HttpRecordService::from_settings(&settings.client));
    let vm = AdminViewModel::new(service);
    let theme = settings.theme;

    match cli.command {
        CliCommand::List { search } => {
            load_or_bail(&vm).await?;
            vm.set_search(search.unwrap_or_default()).await;
            print_list(&vm, theme, &HashSet::new()).await;
        }
        CliCommand::Add { name, email } => {
            vm.set_name(name).await;
            vm.set_email(email).await;
            let outcome = vm.dispatch(Command::CreateStudent).await;
            finish(theme, &outcome)?;
        }
        CliCommand::Delete { id, yes } => {
            let id = StudentId(id);
            if !yes && !ask(&format!("delete student {id}? [y/N] "))? {
                println!("cancelled");
                return Ok(());
            }
            let outcome = vm.dispatch(Command::DeleteStudent(id)).await;
            finish(theme, &outcome)?;
        }
        CliCommand::Attend { id, date, status } => {
            let date = resolve_date(&date, Local::now().date_naive())
                .map_err(anyhow::Error::msg)
                .context("invalid --date")?;
            vm.set_attendance_date(date).await;
            vm.set_attendance_status(status).await;
            let outcome = vm.dispatch(Command::RecordAttendance(StudentId(id))).await;
            finish(theme, &outcome)?;
        }
        CliCommand::Show { id } => {
            let id = StudentId(id);
            load_or_bail(&vm).await?;
            let state = vm.snapshot().await;
            let Some(student) = state.students().iter().find(|s| s.id == id) else {
                bail!("student {id} not found");
            };
            println!("{}", theme.student(student, true));
        }
        CliCommand::Shell { yes } => shell::run(vm, theme, yes).await?,
    }

    Ok(())
}

async fn load_or_bail(vm: &AdminViewModel) -> Result<()> {
    match vm.load().await {
        ReloadStatus::Failed(error) => Err(anyhow::Error::new(error).context("loading students")),
        _ => Ok(()),
    }
}

/// Prints the outcome and turns anything but success into a non-zero exit.
fn finish(theme: Theme, outcome: &SyncOutcome) -> Result<()> {
    if let Some(message) = describe_outcome(theme, outcome) {
        println!("{message}");
    }
    if outcome.is_success() {
        Ok(())
    } else {
        bail!("request did not complete")
    }
}

fn ask(question: &str) -> Result<bool> {
    use std::io::{BufRead, Write};

    print!("{question}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("reading confirmation")?;
    Ok(confirmed(&answer))
}
