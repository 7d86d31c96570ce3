//! Operator console for `checkin-kiosk run`.
//!
//! Each stdin line is either an operator action (`:start`, `:retry`,
//! `:reset`, `:quit`), a simulation hook (`:fault`, `:status`) or badge text
//! held up to the simulated camera.

use anyhow::Context;
use checkin_hardware::CameraError;
use checkin_hardware::mock::MockCameraHandle;
use checkin_terminal::{Alignment, TerminalCommand, TerminalHandle, TerminalSnapshot, align_text};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const HELP: &str = "\
Commands:
  :start    start scanning
  :retry    acknowledge an error
  :reset    stop and return to idle
  :fault    simulate a camera failure
  :status   print the current screen
  :quit     shut the terminal down
Any other line is shown to the camera as a badge.";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Command(TerminalCommand),
    Fault,
    Status,
    Badge(String),
    Unknown(String),
    Empty,
}

pub fn parse_line(line: &str) -> ConsoleInput {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return ConsoleInput::Empty;
    }

    match line.trim() {
        ":start" => ConsoleInput::Command(TerminalCommand::Start),
        ":retry" => ConsoleInput::Command(TerminalCommand::Retry),
        ":reset" => ConsoleInput::Command(TerminalCommand::Reset),
        ":quit" | ":q" => ConsoleInput::Command(TerminalCommand::Shutdown),
        ":fault" => ConsoleInput::Fault,
        ":status" => ConsoleInput::Status,
        other if other.starts_with(':') => ConsoleInput::Unknown(other.to_string()),
        _ => ConsoleInput::Badge(line.to_string()),
    }
}

/// Feed operator input to the terminal until `:quit` or end of input.
pub async fn run_console<R>(
    input: R,
    terminal: &TerminalHandle,
    camera: &MockCameraHandle,
    columns: usize,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read operator input")?
    {
        match parse_line(&line) {
            ConsoleInput::Command(TerminalCommand::Shutdown) => break,
            ConsoleInput::Command(command) => terminal
                .send(command)
                .await
                .context("Terminal is no longer running")?,
            ConsoleInput::Fault => {
                camera
                    .inject_fault(CameraError::capture_failed("fault injected from console"))
                    .await;
            }
            ConsoleInput::Status => println!("{}", render_screen(&terminal.snapshot(), columns)),
            ConsoleInput::Badge(code) => {
                if !camera.present_code(&code).await {
                    warn!("Camera is closed, badge was not seen");
                }
            }
            ConsoleInput::Unknown(command) => println!("Unknown command {}\n{}", command, HELP),
            ConsoleInput::Empty => {}
        }
    }

    debug!("Operator console closed");
    Ok(())
}

/// Print every screen change until the terminal stops.
pub fn spawn_screen(
    mut snapshots: watch::Receiver<TerminalSnapshot>,
    columns: usize,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let screen = render_screen(&snapshots.borrow_and_update(), columns);
            println!("{}", screen);
            if snapshots.changed().await.is_err() {
                break;
            }
        }
    })
}

/// Boxed two-line banner with a status line underneath.
pub fn render_screen(snapshot: &TerminalSnapshot, columns: usize) -> String {
    let border = format!("+{}+", "-".repeat(columns));
    let mut screen = format!(
        "{border}\n|{}|\n|{}|\n{border}\n state={} check_ins={} rejections={} dropped={}",
        align_text(&snapshot.headline, columns, Alignment::Center),
        align_text(&snapshot.detail, columns, Alignment::Center),
        snapshot.state,
        snapshot.check_ins,
        snapshot.rejections,
        snapshot.scans_dropped,
    );
    if let Some(error) = &snapshot.last_error {
        screen.push_str(&format!("\n error: {}", error));
    }
    screen
}
