//! Roster and attendance maintenance subcommands.

use std::io::Write;

use anyhow::{Context, bail};
use checkin_core::{AttendanceEvent, IdentityCode, StaffId, StaffRecord};
use checkin_storage::{AttendanceRepository, StaffRepository};
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum StaffCommand {
    /// Add a staff member, or update an existing one
    Add {
        /// Stable staff identifier
        id: String,

        /// Text encoded in the staff member's badge
        code: String,

        /// Name shown on the welcome screen
        name: String,

        /// Optional ministry or class group
        #[arg(short, long)]
        group: Option<String>,
    },

    /// List the roster
    List {
        /// Include inactive staff
        #[arg(short, long)]
        all: bool,
    },

    /// Stop a badge from matching
    Deactivate {
        /// Staff identifier
        id: String,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct AttendanceQuery {
    /// Day to report (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Show recent check-ins of one staff member instead
    #[arg(short, long)]
    pub staff: Option<String>,

    /// Maximum rows for a per-staff report
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: i64,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn run_staff<S, W>(repo: &S, command: StaffCommand, out: &mut W) -> anyhow::Result<()>
where
    S: StaffRepository,
    W: Write,
{
    match command {
        StaffCommand::Add {
            id,
            code,
            name,
            group,
        } => {
            if name.trim().is_empty() {
                bail!("Display name must not be empty");
            }
            let mut record = StaffRecord::new(StaffId::new(id)?, IdentityCode::new(code)?, name);
            if let Some(group) = group {
                record = record.with_group(group);
            }

            repo.upsert(&record)
                .await
                .with_context(|| format!("Failed to save staff {}", record.id))?;
            info!(staff_id = %record.id, "Staff saved");
            writeln!(out, "Saved {} ({})", record.display_name, record.id)?;
        }
        StaffCommand::List { all } => {
            let staff = repo.list_all().await.context("Failed to list staff")?;
            let mut shown = 0;
            for record in staff.iter().filter(|s| all || s.active) {
                writeln!(
                    out,
                    "{:<12} {:<16} {:<28} {:<12} {}",
                    record.id.as_str(),
                    record.identity_code.as_str(),
                    record.display_name,
                    record.group.as_deref().unwrap_or("-"),
                    if record.active { "active" } else { "inactive" },
                )?;
                shown += 1;
            }
            writeln!(out, "{} staff", shown)?;
        }
        StaffCommand::Deactivate { id } => {
            let id = StaffId::new(id)?;
            repo.deactivate(&id)
                .await
                .with_context(|| format!("Failed to deactivate staff {}", id))?;
            info!(staff_id = %id, "Staff deactivated");
            writeln!(out, "Deactivated {}", id)?;
        }
    }
    Ok(())
}

pub async fn run_attendance<A, W>(
    repo: &A,
    query: AttendanceQuery,
    out: &mut W,
) -> anyhow::Result<()>
where
    A: AttendanceRepository,
    W: Write,
{
    let events: Vec<AttendanceEvent> = match &query.staff {
        Some(staff) => {
            let staff = StaffId::new(staff.clone())?;
            repo.find_by_staff(&staff, query.limit.max(1))
                .await
                .with_context(|| format!("Failed to load attendance for {}", staff))?
        }
        None => {
            let date = query.date.unwrap_or_else(|| Local::now().date_naive());
            repo.find_by_date(date)
                .await
                .with_context(|| format!("Failed to load attendance for {}", date))?
        }
    };

    if query.json {
        serde_json::to_writer_pretty(&mut *out, &events)?;
        writeln!(out)?;
        return Ok(());
    }

    for event in &events {
        writeln!(
            out,
            "{}  {}  {}",
            event.date, event.time_of_day, event.staff_id
        )?;
    }
    writeln!(out, "{} check-ins", events.len())?;
    Ok(())
}
