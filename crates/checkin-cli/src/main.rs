//! `checkin-kiosk` - unattended chapel check-in terminal.
//!
//! `run` hosts the terminal with a simulated camera: each line typed on stdin
//! is held up to the camera as badge text, and `:`-prefixed lines are operator
//! actions. `staff` and `attendance` maintain the SQLite store the terminal
//! reads from and writes to.

mod admin;
mod config;
mod console;

use std::path::PathBuf;

use anyhow::Context;
use checkin_hardware::mock::{MockAudio, MockCamera};
use checkin_storage::Database;
use checkin_terminal::CheckInTerminal;
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::admin::{AttendanceQuery, StaffCommand};
use crate::config::{KioskConfig, LogFormat, LoggingSection};

#[derive(Debug, Parser)]
#[command(name = "checkin-kiosk", version, about = "Unattended QR badge check-in kiosk")]
struct Cli {
    /// Path to the kiosk TOML configuration
    #[arg(short, long, global = true, env = "CHECKIN_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the check-in terminal with a console-driven camera
    Run,

    /// Maintain the staff roster
    #[command(subcommand)]
    Staff(StaffCommand),

    /// Report recorded check-ins
    Attendance(AttendanceQuery),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = KioskConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        config.database.path = path;
        config.validate()?;
    }
    init_logging(&config.logging)?;

    match cli.command {
        Command::Run => run_kiosk(config).await,
        Command::Staff(command) => {
            let db = open_database(&config).await?;
            let result = admin::run_staff(&db.staff(), command, &mut std::io::stdout()).await;
            db.close().await;
            result
        }
        Command::Attendance(query) => {
            let db = open_database(&config).await?;
            let result =
                admin::run_attendance(&db.attendance(), query, &mut std::io::stdout()).await;
            db.close().await;
            result
        }
    }
}

/// Logs go to stderr so the console screen on stdout stays readable.
fn init_logging(logging: &LoggingSection) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .with_context(|| format!("Invalid logging.filter {:?}", logging.filter))?;

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .context("Failed to install log subscriber")
}

async fn open_database(config: &KioskConfig) -> anyhow::Result<Database> {
    let path = &config.database.path;
    Database::new(config.database_config())
        .await
        .with_context(|| format!("Failed to open database {}", path))
}

async fn run_kiosk(config: KioskConfig) -> anyhow::Result<()> {
    let db = open_database(&config).await?;
    db.health_check().await.context("Database health check failed")?;

    let (camera, badge) =
        MockCamera::with_facings("Console Camera", config.camera.simulated_facings.clone());
    let (speaker, _speaker) = if config.audio.enabled {
        MockAudio::new()
    } else {
        MockAudio::unavailable()
    };

    let columns = config.terminal.banner_columns;
    let (terminal, handle) = CheckInTerminal::new(
        camera.into(),
        speaker.into(),
        db.staff(),
        db.attendance(),
        config.terminal_config(),
    );
    let task = terminal.spawn();
    let screen = console::spawn_screen(handle.watch(), columns);

    info!(database = %config.database.path, "Check-in kiosk running");
    println!("{}", console::HELP);

    tokio::select! {
        result = console::run_console(BufReader::new(tokio::io::stdin()), &handle, &badge, columns) => {
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted");
        }
    }

    if handle.shutdown().await.is_err() {
        warn!("Terminal had already stopped");
    }
    task.await.context("Terminal task failed")?;
    screen.abort();

    let snapshot = handle.snapshot();
    info!(
        check_ins = snapshot.check_ins,
        rejections = snapshot.rejections,
        "Check-in kiosk stopped"
    );
    db.close().await;
    Ok(())
}
