//! The check-in terminal driver.
//!
//! A single task owns the kiosk: the state machine, the camera session
//! manager, the feedback emitter and the in-flight verification. Everything
//! that can happen to the kiosk arrives on that task and is handled one
//! event at a time:
//!
//! ```text
//!   TerminalHandle ──commands──┐
//!   capture loop ──CameraEvent─┤
//!   verification task ─result──┼──► select! ──► state machine ──► snapshot (watch)
//!   scheduled transition ──────┘                    │
//!                                                   └──► SessionBus (broadcast)
//! ```
//!
//! Verification runs on its own task so the driver keeps draining camera
//! events while it waits. Scans that arrive outside `Scanning` are dropped,
//! never queued, which is what makes recording single-flight.
//!
//! A verification is never left running unobserved. Reset and shutdown abort
//! it; a camera fault that arrives while it runs is held until its result is
//! in, so a recorded check-in is always acknowledged.
//!
//! # Examples
//!
//! ```no_run
//! use checkin_core::{IdentityCode, StaffId, StaffRecord};
//! use checkin_hardware::mock::{MockAudio, MockCamera};
//! use checkin_storage::{InMemoryAttendance, InMemoryRoster};
//! use checkin_terminal::{CheckInTerminal, KioskState, TerminalConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let roster = InMemoryRoster::new(vec![StaffRecord::new(
//!     StaffId::new("T1")?,
//!     IdentityCode::new("DED-123")?,
//!     "Sister Maria",
//! )]);
//! let (camera, badge) = MockCamera::new();
//! let (speaker, _) = MockAudio::new();
//!
//! let (terminal, handle) = CheckInTerminal::new(
//!     camera.into(),
//!     speaker.into(),
//!     roster,
//!     InMemoryAttendance::new(),
//!     TerminalConfig::default(),
//! );
//! let task = terminal.spawn();
//!
//! handle.start().await?;
//! handle.wait_for_state(KioskState::Scanning).await?;
//! badge.present_code("DED-123").await;
//!
//! let snapshot = handle.wait_for_state(KioskState::Success).await?;
//! assert_eq!(snapshot.check_ins, 1);
//!
//! handle.shutdown().await?;
//! task.await?;
//! # Ok(())
//! # }
//! ```

use std::future;
use std::sync::Arc;

use checkin_core::{AttendanceEvent, Result, SessionId};
use checkin_hardware::{AnyAudioOutput, AnyCameraDevice, CameraEvent, CameraSessionManager};
use checkin_storage::{AttendanceRecorder, RosterSource};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::bus::{SessionBus, SessionSignal};
use crate::config::TerminalConfig;
use crate::error::{TerminalError, TerminalResult};
use crate::feedback::FeedbackEmitter;
use crate::matcher::RosterCache;
use crate::state_machine::{KioskState, StateMachine};
use crate::verifier::{SharedVerifier, VerificationOutcome, Verifier};

/// Capacity of the operator command channel.
const COMMAND_CHANNEL_CAPACITY: usize = 16;

const REJECTED_HEADLINE: &str = "Badge not recognized";
const REJECTED_DETAIL: &str = "Please try again";
const RETRY_DETAIL: &str = "Tap retry to continue";
const BACKEND_FAULT_HEADLINE: &str = "Check-in service unavailable";

/// Operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCommand {
    /// Open the camera and start scanning (from `Idle`).
    Start,

    /// Acknowledge an error (from `Error`).
    Retry,

    /// Stop everything and return to `Idle` from any state.
    Reset,

    /// Release the camera and stop the terminal task.
    Shutdown,
}

/// Most recent successful check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentCheckIn {
    pub display_name: String,
    pub event: AttendanceEvent,
}

/// What the kiosk screen shows, published after every handled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalSnapshot {
    pub state: KioskState,
    pub headline: String,
    pub detail: String,

    /// Open camera session, if any.
    pub camera_session: Option<SessionId>,

    pub last_check_in: Option<RecentCheckIn>,

    /// Cleared by a retry or reset.
    pub last_error: Option<String>,

    pub check_ins: u64,
    pub rejections: u64,

    /// Scans discarded because a verification was in flight, the terminal
    /// was not scanning, or they came from a closed camera session.
    pub scans_dropped: u64,
}

/// Cloneable handle to a running terminal: the mountable view.
#[derive(Debug, Clone)]
pub struct TerminalHandle {
    commands: mpsc::Sender<TerminalCommand>,
    snapshots: watch::Receiver<TerminalSnapshot>,
    bus: SessionBus,
}

impl TerminalHandle {
    /// "Start scanning" action.
    pub async fn start(&self) -> TerminalResult<()> {
        self.send(TerminalCommand::Start).await
    }

    /// "Retry" action.
    pub async fn retry(&self) -> TerminalResult<()> {
        self.send(TerminalCommand::Retry).await
    }

    pub async fn reset(&self) -> TerminalResult<()> {
        self.send(TerminalCommand::Reset).await
    }

    pub async fn shutdown(&self) -> TerminalResult<()> {
        self.send(TerminalCommand::Shutdown).await
    }

    pub async fn send(&self, command: TerminalCommand) -> TerminalResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TerminalError::Stopped)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> TerminalSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn state(&self) -> KioskState {
        self.snapshots.borrow().state
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// Checks the current snapshot first.
    pub async fn wait_for<F>(&self, mut predicate: F) -> TerminalResult<TerminalSnapshot>
    where
        F: FnMut(&TerminalSnapshot) -> bool,
    {
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| TerminalError::Stopped)?;
        Ok(snapshot.clone())
    }

    pub async fn wait_for_state(&self, state: KioskState) -> TerminalResult<TerminalSnapshot> {
        self.wait_for(|s| s.state == state).await
    }

    /// Receiver that sees every snapshot change.
    pub fn watch(&self) -> watch::Receiver<TerminalSnapshot> {
        self.snapshots.clone()
    }

    /// Subscribe to session signals.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.bus.subscribe()
    }
}

/// Everything that can wake the driver.
enum Wake {
    Command(Option<TerminalCommand>),
    Camera(CameraEvent),
    Verification(std::result::Result<Result<VerificationOutcome>, JoinError>),
    Deadline,
}

/// Unattended check-in terminal.
pub struct CheckInTerminal<R, W> {
    machine: StateMachine,
    camera: CameraSessionManager,
    feedback: FeedbackEmitter,
    verifier: SharedVerifier<R, W>,
    config: TerminalConfig,
    bus: SessionBus,

    commands: mpsc::Receiver<TerminalCommand>,
    camera_tx: mpsc::Sender<CameraEvent>,
    camera_rx: mpsc::Receiver<CameraEvent>,

    /// At most one verification at a time.
    pending: Option<JoinHandle<Result<VerificationOutcome>>>,

    /// Camera fault reported while `pending` was running.
    deferred_fault: Option<String>,

    snapshots: watch::Sender<TerminalSnapshot>,
    last_check_in: Option<RecentCheckIn>,
    last_error: Option<String>,
    check_ins: u64,
    rejections: u64,
    scans_dropped: u64,
}

impl<R, W> CheckInTerminal<R, W>
where
    R: RosterSource + 'static,
    W: AttendanceRecorder + 'static,
{
    /// Build a terminal in `Idle` and the handle that controls it.
    pub fn new(
        camera: AnyCameraDevice,
        audio: AnyAudioOutput,
        roster: R,
        recorder: W,
        config: TerminalConfig,
    ) -> (Self, TerminalHandle) {
        let camera = CameraSessionManager::new(camera, config.camera.clone());
        Self::with_camera_manager(camera, audio, roster, recorder, config)
    }

    /// Build a terminal around an existing camera session manager.
    pub fn with_camera_manager(
        camera: CameraSessionManager,
        audio: AnyAudioOutput,
        roster: R,
        recorder: W,
        config: TerminalConfig,
    ) -> (Self, TerminalHandle) {
        let mut feedback = FeedbackEmitter::new(audio, config.feedback.clone());
        feedback.update_from_state(KioskState::Idle);

        let verifier = Arc::new(Verifier::new(
            RosterCache::new(roster, config.roster_cache_ttl),
            recorder,
            config.verification_timeout,
        ));

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (camera_tx, camera_rx) = mpsc::channel(config.scan_channel_capacity.max(1));
        let bus = SessionBus::new(config.bus_capacity);

        let terminal = Self {
            machine: StateMachine::new(),
            camera,
            feedback,
            verifier,
            config,
            bus: bus.clone(),
            commands: command_rx,
            camera_tx,
            camera_rx,
            pending: None,
            deferred_fault: None,
            snapshots: watch::Sender::new(TerminalSnapshot {
                state: KioskState::Idle,
                headline: String::new(),
                detail: String::new(),
                camera_session: None,
                last_check_in: None,
                last_error: None,
                check_ins: 0,
                rejections: 0,
                scans_dropped: 0,
            }),
            last_check_in: None,
            last_error: None,
            check_ins: 0,
            rejections: 0,
            scans_dropped: 0,
        };
        terminal.publish_snapshot();

        let handle = TerminalHandle {
            commands: command_tx,
            snapshots: terminal.snapshots.subscribe(),
            bus,
        };

        (terminal, handle)
    }

    pub fn state(&self) -> KioskState {
        self.machine.current_state()
    }

    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    /// Run the driver on a new task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drive the terminal until `Shutdown` or until every handle is dropped.
    pub async fn run(mut self) {
        info!("Check-in terminal running");

        loop {
            let deadline = self.machine.next_deadline();

            let wake = tokio::select! {
                biased;
                command = self.commands.recv() => Wake::Command(command),
                Some(event) = self.camera_rx.recv() => Wake::Camera(event),
                joined = join_pending(&mut self.pending) => Wake::Verification(joined),
                () = sleep_until(deadline) => Wake::Deadline,
            };

            match wake {
                Wake::Command(Some(TerminalCommand::Shutdown)) | Wake::Command(None) => break,
                Wake::Command(Some(command)) => self.handle_command(command).await,
                Wake::Camera(event) => self.handle_camera_event(event).await,
                Wake::Verification(joined) => {
                    self.pending = None;
                    self.handle_verification(joined).await;
                }
                Wake::Deadline => self.handle_deadline().await,
            }

            self.publish_snapshot();
        }

        self.shut_down().await;
    }

    async fn handle_command(&mut self, command: TerminalCommand) {
        let state = self.machine.current_state();
        match (command, state) {
            (TerminalCommand::Start, KioskState::Idle) => self.resume_scanning().await,
            (TerminalCommand::Retry, KioskState::Error) => {
                self.last_error = None;
                // The fault may have been a stale roster; read it fresh.
                self.verifier.roster().invalidate().await;
                self.enter(KioskState::Idle);
            }
            (TerminalCommand::Reset, _) => self.force_reset().await,
            (command, state) => debug!("Ignoring {:?} while {}", command, state),
        }
    }

    async fn handle_camera_event(&mut self, event: CameraEvent) {
        let current = self.camera.current().map(|handle| handle.session());
        if current != Some(event.session()) {
            if matches!(event, CameraEvent::Decoded(_)) {
                self.scans_dropped += 1;
            }
            debug!("Discarding event from closed camera session {}", event.session());
            return;
        }

        match event {
            CameraEvent::Decoded(scan) => {
                if !self.machine.current_state().accepts_scans() || self.pending.is_some() {
                    self.scans_dropped += 1;
                    debug!(
                        "Dropping scan while {} ({} dropped so far)",
                        self.machine.current_state(),
                        self.scans_dropped
                    );
                    return;
                }

                if !self.enter(KioskState::Verifying) {
                    return;
                }

                let verifier = Arc::clone(&self.verifier);
                let text = scan.text;
                self.pending = Some(tokio::spawn(async move { verifier.verify(&text).await }));
            }
            CameraEvent::Fault { session, message } => {
                if !self.machine.current_state().camera_expected() {
                    debug!("Ignoring camera fault while {}", self.machine.current_state());
                    return;
                }

                if self.pending.is_some() {
                    warn!(
                        "Camera session {} failed during verification, holding fault: {}",
                        session, message
                    );
                    self.deferred_fault = Some(message);
                    return;
                }

                error!("Camera session {} failed: {}", session, message);
                self.fail(&message, message.clone()).await;
            }
        }
    }

    async fn handle_verification(
        &mut self,
        joined: std::result::Result<Result<VerificationOutcome>, JoinError>,
    ) {
        if self.machine.current_state() != KioskState::Verifying {
            warn!(
                "Discarding verification result while {}",
                self.machine.current_state()
            );
            return;
        }

        match joined {
            Ok(Ok(VerificationOutcome::Verified { staff, event })) => {
                if let Some(message) = self.deferred_fault.take() {
                    info!("Check-in completed despite camera fault: {}", message);
                }
                self.camera.close().await;
                if !self.enter(KioskState::Success) {
                    return;
                }

                self.feedback
                    .set_instruction(&format!("Welcome, {}", staff.display_name));
                self.feedback
                    .set_detail(&format!("Checked in at {}", event.time_of_day));
                self.feedback.play_success_tone().await;

                self.check_ins += 1;
                self.last_check_in = Some(RecentCheckIn {
                    display_name: staff.display_name.clone(),
                    event: event.clone(),
                });
                self.bus.publish(SessionSignal::CheckedIn { staff, event });
                self.schedule(KioskState::Scanning, self.config.success_dwell);
            }
            Ok(Ok(VerificationOutcome::NoMatch { code })) => {
                self.rejections += 1;
                self.feedback.play_error_tone().await;
                self.bus.publish(SessionSignal::ScanRejected { code });

                match self.deferred_fault.take() {
                    Some(message) => {
                        error!("Camera failed during verification: {}", message);
                        self.fail(&message, message.clone()).await;
                    }
                    None => {
                        self.feedback.set_instruction(REJECTED_HEADLINE);
                        self.feedback.set_detail(REJECTED_DETAIL);
                        self.schedule(KioskState::Scanning, self.config.rejection_delay);
                    }
                }
            }
            Ok(Err(e)) => {
                error!("Verification failed: {}", e);
                self.fail(BACKEND_FAULT_HEADLINE, e.to_string()).await;
            }
            Err(e) => {
                error!("Verification task ended abnormally: {}", e);
                self.fail(BACKEND_FAULT_HEADLINE, e.to_string()).await;
            }
        }
    }

    async fn handle_deadline(&mut self) {
        let Some(target) = self.machine.take_due(Instant::now()) else {
            return;
        };
        debug!(
            "Scheduled transition {} -> {} is due",
            self.machine.current_state(),
            target
        );

        match target {
            KioskState::Scanning => self.resume_scanning().await,
            other => {
                self.enter(other);
            }
        }
    }

    /// Enter `Scanning`, opening the camera first when it is closed.
    async fn resume_scanning(&mut self) {
        if !self.camera.is_open() {
            if let Err(e) = self.camera.open(self.camera_tx.clone()).await {
                self.fail(e.operator_message(), e.to_string()).await;
                return;
            }
        }
        self.enter(KioskState::Scanning);
    }

    /// Close the camera, stop any verification and show the error.
    async fn fail(&mut self, headline: &str, detail: String) {
        self.cancel_pending("terminal fault");
        self.camera.close().await;

        if self.machine.current_state() != KioskState::Error {
            self.enter(KioskState::Error);
        }
        self.feedback.set_instruction(headline);
        self.feedback.set_detail(RETRY_DETAIL);

        self.bus.publish(SessionSignal::TerminalFault {
            message: detail.clone(),
        });
        self.last_error = Some(detail);
    }

    async fn force_reset(&mut self) {
        self.cancel_pending("reset");
        self.camera.close().await;

        let transition = self.machine.reset();
        self.last_error = None;
        self.feedback.update_from_state(KioskState::Idle);
        info!("Terminal reset: {} -> {}", transition.from, transition.to);
    }

    /// Abort the in-flight verification before it records anything more.
    fn cancel_pending(&mut self, reason: &str) {
        if let Some(task) = self.pending.take() {
            task.abort();
            info!("Cancelled in-flight verification on {}", reason);
        }
        self.deferred_fault = None;
    }

    fn schedule(&mut self, target: KioskState, after: std::time::Duration) {
        match self.machine.schedule(after, target) {
            Ok(()) => debug!("Scheduled {} in {:?}", target, after),
            Err(e) => error!("Could not schedule {}: {}", target, e),
        }
    }

    /// Perform a table transition and show the state's default banner.
    fn enter(&mut self, state: KioskState) -> bool {
        let stayed = self.machine.time_in_current_state();
        match self.machine.transition_to(state) {
            Ok(transition) => {
                info!(
                    "Terminal {} -> {} after {:?}",
                    transition.from, transition.to, stayed
                );
                self.feedback.update_from_state(state);
                true
            }
            Err(e) => {
                error!("Terminal refused transition: {}", e);
                false
            }
        }
    }

    async fn shut_down(&mut self) {
        self.cancel_pending("shutdown");
        self.camera.close().await;
        self.bus.publish(SessionSignal::LogoutRequested);
        self.publish_snapshot();
        info!("Check-in terminal stopped");
    }

    fn publish_snapshot(&self) {
        let banner = self.feedback.banner();
        let next = TerminalSnapshot {
            state: self.machine.current_state(),
            headline: banner.headline().to_string(),
            detail: banner.detail().to_string(),
            camera_session: self.camera.current().map(|handle| handle.session()),
            last_check_in: self.last_check_in.clone(),
            last_error: self.last_error.clone(),
            check_ins: self.check_ins,
            rejections: self.rejections,
            scans_dropped: self.scans_dropped,
        };

        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

impl<R, W> std::fmt::Debug for CheckInTerminal<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckInTerminal")
            .field("state", &self.machine.current_state())
            .field("camera", &self.camera)
            .field("verifying", &self.pending.is_some())
            .field("check_ins", &self.check_ins)
            .finish()
    }
}

/// Resolve the pending verification; never resolves when there is none.
async fn join_pending<T>(
    slot: &mut Option<JoinHandle<T>>,
) -> std::result::Result<T, JoinError> {
    match slot {
        Some(task) => task.await,
        None => future::pending().await,
    }
}

/// Sleep until `deadline`; never resolves without one.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
