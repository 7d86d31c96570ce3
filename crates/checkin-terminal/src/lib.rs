//! Unattended QR check-in terminal.
//!
//! The terminal reads staff badges through the camera, matches the decoded
//! code against the active roster, records one attendance event per match
//! and gives audible and on-screen feedback.
//!
//! # Modules
//!
//! - [`state_machine`]: kiosk states, the transition table and scheduled
//!   transitions
//! - [`terminal`]: the driver task and the [`TerminalHandle`] view
//! - [`verifier`] and [`matcher`]: roster lookup and attendance recording
//! - [`feedback`], [`tone`] and [`banner`]: tones and instruction text
//! - [`bus`]: session-scoped signals for the rest of the application

pub mod banner;
pub mod bus;
pub mod config;
pub mod error;
pub mod feedback;
pub mod matcher;
pub mod state_machine;
pub mod terminal;
pub mod tone;
pub mod verifier;

pub use banner::{Alignment, InstructionBanner, align_text};
pub use bus::{SessionBus, SessionSignal};
pub use config::TerminalConfig;
pub use error::{TerminalError, TerminalResult};
pub use feedback::{FeedbackConfig, FeedbackEmitter};
pub use matcher::{RosterCache, match_staff};
pub use state_machine::{
    KioskState, ScheduledTransition, StateMachine, StateMachineBuilder, StateTransition,
};
pub use terminal::{
    CheckInTerminal, RecentCheckIn, TerminalCommand, TerminalHandle, TerminalSnapshot,
};
pub use tone::{Envelope, TonePattern, ToneSpec};
pub use verifier::{SharedVerifier, VerificationOutcome, Verifier};
