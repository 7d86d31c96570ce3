//! Session-scoped signal bus.
//!
//! Other parts of the kiosk application (an attendance board, a sync job)
//! learn about check-ins by subscribing here rather than through global
//! events. The bus lives as long as the terminal that publishes on it.

use checkin_core::{AttendanceEvent, StaffRecord};
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of signals buffered per subscriber.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Signal published by the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    /// An attendance event was recorded.
    CheckedIn {
        staff: StaffRecord,
        event: AttendanceEvent,
    },

    /// A scanned code matched no active staff.
    ScanRejected { code: String },

    /// The terminal entered `Error`.
    TerminalFault { message: String },

    /// The terminal is shutting down and the session ends.
    LogoutRequested,
}

/// Broadcast channel for [`SessionSignal`]s.
#[derive(Debug, Clone)]
pub struct SessionBus {
    sender: broadcast::Sender<SessionSignal>,
}

impl SessionBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to every current subscriber.
    ///
    /// Returns the number of subscribers reached. Publishing with nobody
    /// listening is not an error.
    pub fn publish(&self, signal: SessionSignal) -> usize {
        match self.sender.send(signal) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(signal)) => {
                trace!("No subscribers for {:?}", signal);
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = SessionBus::default();
        assert_eq!(bus.publish(SessionSignal::LogoutRequested), 0);
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let bus = SessionBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let signal = SessionSignal::ScanRejected {
            code: "GARBAGE".to_string(),
        };
        assert_eq!(bus.publish(signal.clone()), 2);

        assert_eq!(first.recv().await.unwrap(), signal);
        assert_eq!(second.recv().await.unwrap(), signal);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_signals() {
        let bus = SessionBus::default();
        bus.publish(SessionSignal::LogoutRequested);

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
        assert_eq!(bus.subscriber_count(), 1);
    }
}
