use thiserror::Error;

/// Errors returned by a [`TerminalHandle`](crate::TerminalHandle).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminalError {
    #[error("Check-in terminal has stopped")]
    Stopped,
}

pub type TerminalResult<T> = std::result::Result<T, TerminalError>;
