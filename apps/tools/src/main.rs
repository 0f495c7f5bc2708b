use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::domain::{parse_attendance_date, AttendanceRecord, AttendanceStatus, StudentId};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/students.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert a few demo students with attendance.
    SeedDemo,
    AddStudent {
        name: String,
        email: String,
    },
    AddAttendance {
        student_id: i64,
        /// YYYY-MM-DD
        date: String,
        #[arg(default_value = "Present")]
        status: AttendanceStatus,
    },
    List,
    /// Print every student as a JSON array in the record service wire shape.
    Export,
}

const DEMO_STUDENTS: [(&str, &str, &[(&str, AttendanceStatus)]); 3] = [
    (
        "Ann",
        "ann@x.com",
        &[
            ("2025-10-01", AttendanceStatus::Present),
            ("2025-10-02", AttendanceStatus::Late),
        ],
    ),
    ("Bo", "bo@y.com", &[("2025-10-01", AttendanceStatus::Absent)]),
    ("Cy", "cy@z.org", &[]),
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("opening {}", cli.database_url))?;
    run(&storage, cli.command, &mut std::io::stdout().lock()).await
}

async fn run(storage: &Storage, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::SeedDemo => {
            for (name, email, attendance) in DEMO_STUDENTS {
                let student = storage.create_student(name, email).await?;
                for (date, status) in attendance {
                    storage
                        .append_attendance(student.id, &AttendanceRecord::new(*date, *status))
                        .await?;
                }
                writeln!(out, "created student_id={} name={name}", student.id)?;
            }
            info!(count = DEMO_STUDENTS.len(), "tools: demo students seeded");
        }
        Command::AddStudent { name, email } => {
            if name.is_empty() || email.is_empty() {
                bail!("name and email are required");
            }
            let student = storage.create_student(&name, &email).await?;
            writeln!(out, "created student_id={}", student.id)?;
        }
        Command::AddAttendance {
            student_id,
            date,
            status,
        } => {
            let date = parse_attendance_date(&date)
                .ok_or_else(|| anyhow!("'{date}' is not a YYYY-MM-DD date"))?;
            let record = AttendanceRecord::new(date.to_string(), status);
            let attendance = storage
                .append_attendance(StudentId(student_id), &record)
                .await?
                .ok_or_else(|| anyhow!("student {student_id} not found"))?;
            writeln!(
                out,
                "student_id={student_id} now has {} attendance records",
                attendance.len()
            )?;
        }
        Command::List => {
            for student in storage.list_students().await? {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    student.id,
                    student.name,
                    student.email,
                    student.attendance_count()
                )?;
            }
        }
        Command::Export => {
            let students = storage.list_students().await?;
            serde_json::to_writer_pretty(&mut *out, &students)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
