//! Check-in kiosk state machine.
//!
//! Owns the kiosk state, validates every transition against the transition
//! table, keeps a bounded transition history and holds at most one scheduled
//! transition (the success dwell or the rejection delay).
//!
//! # States
//!
//! - `Idle`: camera off, waiting for the operator to start scanning
//! - `Scanning`: camera open, waiting for a badge
//! - `Verifying`: a badge was read; roster lookup and recording in flight
//! - `Success`: check-in recorded, showing confirmation for the dwell time
//! - `Error`: camera or backend failure, waiting for the operator
//!
//! # Valid Transitions
//!
//! - Idle → Scanning (camera opened) | Error (camera open failed)
//! - Scanning → Verifying (badge read) | Error (camera fault)
//! - Verifying → Success | Scanning (no match, after the rejection delay) | Error
//! - Success → Scanning (after the dwell) | Error (camera reopen failed)
//! - Error → Idle (operator retry)
//! - any → Idle through [`StateMachine::reset`]
//!
//! # Examples
//!
//! ```
//! use checkin_terminal::{KioskState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! machine.transition_to(KioskState::Scanning).unwrap();
//! machine.transition_to(KioskState::Verifying).unwrap();
//!
//! assert!(machine.transition_to(KioskState::Idle).is_err());
//! assert_eq!(machine.current_state(), KioskState::Verifying);
//! ```
//!
//! # Scheduled Transitions
//!
//! Timers are owned by the machine and die with the state that set them:
//!
//! ```
//! use checkin_terminal::{KioskState, StateMachine};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let mut machine = StateMachine::builder()
//!     .with_initial_state(KioskState::Success)
//!     .build();
//! machine.schedule(Duration::from_secs(4), KioskState::Scanning).unwrap();
//!
//! machine.reset();
//! assert!(machine.next_deadline().is_none());
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use checkin_core::constants::MAX_TRANSITION_HISTORY;
use checkin_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Kiosk state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KioskState {
    /// Camera off, waiting for "start".
    Idle,

    /// Camera open, waiting for a badge.
    Scanning,

    /// One badge accepted; every further scan is dropped.
    Verifying,

    /// Check-in recorded; confirmation shown until the dwell elapses.
    Success,

    /// Camera or backend failure; needs an operator retry.
    Error,
}

impl fmt::Display for KioskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            KioskState::Idle => "Idle",
            KioskState::Scanning => "Scanning",
            KioskState::Verifying => "Verifying",
            KioskState::Success => "Success",
            KioskState::Error => "Error",
        };
        write!(f, "{}", state_str)
    }
}

impl KioskState {
    /// Check if the transition table allows moving to `target`.
    ///
    /// Forced resets to `Idle` bypass this check.
    ///
    /// # Examples
    ///
    /// ```
    /// use checkin_terminal::KioskState;
    ///
    /// assert!(KioskState::Idle.can_transition_to(&KioskState::Scanning));
    /// assert!(!KioskState::Idle.can_transition_to(&KioskState::Success));
    /// ```
    pub fn can_transition_to(&self, target: &KioskState) -> bool {
        matches!(
            (self, target),
            (KioskState::Idle, KioskState::Scanning | KioskState::Error)
                | (KioskState::Scanning, KioskState::Verifying | KioskState::Error)
                | (
                    KioskState::Verifying,
                    KioskState::Success | KioskState::Scanning | KioskState::Error
                )
                | (KioskState::Success, KioskState::Scanning | KioskState::Error)
                | (KioskState::Error, KioskState::Idle)
        )
    }

    /// Whether decoded badges are acted on in this state.
    pub fn accepts_scans(&self) -> bool {
        matches!(self, KioskState::Scanning)
    }

    /// Whether the camera is expected to be open in this state.
    ///
    /// `Verifying` keeps the camera open so a rejected badge can be followed
    /// by another scan without a reopen.
    pub fn camera_expected(&self) -> bool {
        matches!(self, KioskState::Scanning | KioskState::Verifying)
    }
}

/// A single state change with the time it happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: KioskState,
    pub to: KioskState,

    /// Not serialized; deserialized records carry the deserialization time.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: KioskState, to: KioskState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// A transition that fires once its deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTransition {
    pub target: KioskState,
    pub deadline: Instant,
}

/// Kiosk state machine.
///
/// Not thread-safe; the terminal driver owns it on a single task.
#[derive(Debug)]
pub struct StateMachine {
    current_state: KioskState,

    state_entered_at: Instant,

    /// Bounded to `MAX_TRANSITION_HISTORY` entries.
    history: VecDeque<StateTransition>,

    /// Cleared on every state change.
    scheduled: Option<ScheduledTransition>,
}

impl StateMachine {
    /// Create a machine in `Idle`.
    pub fn new() -> Self {
        Self {
            current_state: KioskState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_TRANSITION_HISTORY),
            scheduled: None,
        }
    }

    pub fn builder() -> StateMachineBuilder {
        StateMachineBuilder::default()
    }

    pub fn current_state(&self) -> KioskState {
        self.current_state
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Transition history, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The most recent `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Move to `new_state` if the transition table allows it.
    ///
    /// Any scheduled transition is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` and leaves the machine
    /// untouched if the move is not in the table.
    pub fn transition_to(&mut self, new_state: KioskState) -> Result<StateTransition> {
        self.ensure_allowed(new_state)?;

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());
        Ok(transition)
    }

    /// Schedule a move to `target` after `after` has elapsed.
    ///
    /// Replaces any previous schedule. The schedule is dropped as soon as the
    /// state changes for any other reason.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if `target` is not reachable
    /// from the current state.
    pub fn schedule(&mut self, after: Duration, target: KioskState) -> Result<()> {
        self.ensure_allowed(target)?;
        self.scheduled = Some(ScheduledTransition {
            target,
            deadline: Instant::now() + after,
        });
        Ok(())
    }

    pub fn scheduled(&self) -> Option<ScheduledTransition> {
        self.scheduled
    }

    /// Deadline of the scheduled transition, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduled.map(|s| s.deadline)
    }

    /// Remove and return the scheduled target if its deadline has passed.
    ///
    /// The caller performs the transition (and its side effects) itself.
    pub fn take_due(&mut self, now: Instant) -> Option<KioskState> {
        match self.scheduled {
            Some(scheduled) if scheduled.deadline <= now => {
                self.scheduled = None;
                Some(scheduled.target)
            }
            _ => None,
        }
    }

    /// Force the machine back to `Idle` from any state.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state, KioskState::Idle);
        self.perform_state_change(KioskState::Idle, transition.clone());
        transition
    }

    fn ensure_allowed(&self, target: KioskState) -> Result<()> {
        if self.current_state.can_transition_to(&target) {
            return Ok(());
        }
        Err(Error::InvalidStateTransition {
            from: self.current_state.to_string(),
            to: target.to_string(),
        })
    }

    fn perform_state_change(&mut self, new_state: KioskState, transition: StateTransition) {
        self.current_state = new_state;
        self.state_entered_at = Instant::now();
        self.scheduled = None;

        self.history.push_back(transition);
        if self.history.len() > MAX_TRANSITION_HISTORY {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for restoring a machine into a given state.
#[derive(Debug)]
pub struct StateMachineBuilder {
    initial_state: KioskState,
    history: VecDeque<StateTransition>,
}

impl StateMachineBuilder {
    pub fn with_initial_state(mut self, state: KioskState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_history(mut self, history: VecDeque<StateTransition>) -> Self {
        self.history = history;
        self
    }

    pub fn build(self) -> StateMachine {
        StateMachine {
            current_state: self.initial_state,
            state_entered_at: Instant::now(),
            history: self.history,
            scheduled: None,
        }
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self {
            initial_state: KioskState::Idle,
            history: VecDeque::with_capacity(MAX_TRANSITION_HISTORY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use super::KioskState::{Error as Fault, Idle, Scanning, Success, Verifying};

    #[test]
    fn test_new_machine_starts_idle() {
        let machine = StateMachine::new();
        assert_eq!(machine.current_state(), Idle);
        assert!(machine.history().is_empty());
        assert!(machine.scheduled().is_none());
    }

    #[rstest]
    #[case(Idle, Scanning)]
    #[case(Idle, Fault)]
    #[case(Scanning, Verifying)]
    #[case(Scanning, Fault)]
    #[case(Verifying, Success)]
    #[case(Verifying, Scanning)]
    #[case(Verifying, Fault)]
    #[case(Success, Scanning)]
    #[case(Success, Fault)]
    #[case(Fault, Idle)]
    fn test_valid_transitions(#[case] from: KioskState, #[case] to: KioskState) {
        let mut machine = StateMachine::builder().with_initial_state(from).build();

        let transition = machine.transition_to(to).unwrap();

        assert_eq!(transition.from, from);
        assert_eq!(transition.to, to);
        assert_eq!(machine.current_state(), to);
    }

    #[rstest]
    #[case(Idle, Verifying)]
    #[case(Idle, Success)]
    #[case(Scanning, Success)]
    #[case(Scanning, Idle)]
    #[case(Verifying, Idle)]
    #[case(Success, Verifying)]
    #[case(Success, Idle)]
    #[case(Fault, Scanning)]
    #[case(Scanning, Scanning)]
    fn test_invalid_transitions(#[case] from: KioskState, #[case] to: KioskState) {
        let mut machine = StateMachine::builder().with_initial_state(from).build();

        let result = machine.transition_to(to);

        assert!(matches!(result, Err(Error::InvalidStateTransition { .. })));
        assert_eq!(machine.current_state(), from);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_only_scanning_accepts_scans() {
        assert!(Scanning.accepts_scans());
        for state in [Idle, Verifying, Success, Fault] {
            assert!(!state.accepts_scans(), "{} must drop scans", state);
        }
    }

    #[test]
    fn test_camera_expected() {
        assert!(Scanning.camera_expected());
        assert!(Verifying.camera_expected());
        assert!(!Success.camera_expected());
        assert!(!Idle.camera_expected());
    }

    #[test]
    fn test_complete_check_in_cycle() {
        let mut machine = StateMachine::new();
        for state in [Scanning, Verifying, Success, Scanning] {
            machine.transition_to(state).unwrap();
        }

        let states: Vec<_> = machine.history().iter().map(|t| t.to).collect();
        assert_eq!(states, vec![Scanning, Verifying, Success, Scanning]);
    }

    #[test]
    fn test_reset_from_any_state() {
        for state in [Idle, Scanning, Verifying, Success, Fault] {
            let mut machine = StateMachine::builder().with_initial_state(state).build();
            let transition = machine.reset();
            assert_eq!(transition.from, state);
            assert_eq!(machine.current_state(), Idle);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_after_deadline() {
        let mut machine = StateMachine::builder().with_initial_state(Success).build();
        machine.schedule(Duration::from_secs(4), Scanning).unwrap();

        assert_eq!(machine.take_due(Instant::now()), None);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(machine.take_due(Instant::now()), Some(Scanning));
        assert!(machine.scheduled().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_in_current_state_restarts_on_transition() {
        let mut machine = StateMachine::new();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(machine.time_in_current_state(), Duration::from_secs(3));

        machine.transition_to(Scanning).unwrap();
        assert_eq!(machine.time_in_current_state(), Duration::ZERO);
    }

    #[test]
    fn test_schedule_rejects_unreachable_target() {
        let mut machine = StateMachine::new();
        let result = machine.schedule(Duration::from_secs(1), Success);
        assert!(result.is_err());
        assert!(machine.scheduled().is_none());
    }

    #[test]
    fn test_state_change_cancels_schedule() {
        let mut machine = StateMachine::builder().with_initial_state(Verifying).build();
        machine.schedule(Duration::from_millis(1500), Scanning).unwrap();

        machine.transition_to(Fault).unwrap();
        assert!(machine.next_deadline().is_none());
    }

    #[test]
    fn test_reset_cancels_schedule() {
        let mut machine = StateMachine::builder().with_initial_state(Success).build();
        machine.schedule(Duration::from_secs(4), Scanning).unwrap();

        machine.reset();
        assert!(machine.next_deadline().is_none());
    }

    #[test]
    fn test_history_size_limit() {
        let mut machine = StateMachine::new();
        machine.transition_to(Scanning).unwrap();
        for _ in 0..MAX_TRANSITION_HISTORY {
            machine.transition_to(Verifying).unwrap();
            machine.transition_to(Scanning).unwrap();
        }

        assert_eq!(machine.history().len(), MAX_TRANSITION_HISTORY);
        let last = machine.last_transitions(2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].to, Verifying);
        assert_eq!(last[1].to, Scanning);
    }

    #[test]
    fn test_state_display_and_serialization() {
        assert_eq!(Verifying.to_string(), "Verifying");
        assert_eq!(serde_json::to_string(&Fault).unwrap(), "\"error\"");

        let parsed: KioskState = serde_json::from_str("\"success\"").unwrap();
        assert_eq!(parsed, Success);
    }
}
