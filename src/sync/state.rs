//! Sync session state machine.
//!
//! `Idle -> Reading -> (Merging | Encoding) -> Writing -> Idle | Failed`.
//! At most one session runs at a time; a session that is dropped before it
//! finishes (cancelled future) returns the machine to `Idle`.

use crate::error::SyncError;
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Reading,
    Merging,
    Encoding,
    Writing,
    /// Last session ended in an error; a new session may start.
    Failed,
}

impl SyncState {
    /// True while a session owns the machine.
    pub fn is_busy(&self) -> bool {
        !matches!(self, SyncState::Idle | SyncState::Failed)
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Reading => write!(f, "reading"),
            Self::Merging => write!(f, "merging"),
            Self::Encoding => write!(f, "encoding"),
            Self::Writing => write!(f, "writing"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

pub struct StateMachine {
    state: watch::Sender<SyncState>,
}

impl StateMachine {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self { state }
    }

    pub fn current(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Claim the machine and move it to `Reading`.
    pub fn begin(&self) -> Result<SyncSession<'_>, SyncError> {
        let mut busy = None;
        self.state.send_if_modified(|state| {
            if state.is_busy() {
                busy = Some(*state);
                false
            } else {
                *state = SyncState::Reading;
                true
            }
        });
        match busy {
            Some(state) => Err(SyncError::SyncBusy(state)),
            None => Ok(SyncSession {
                machine: self,
                outcome: None,
            }),
        }
    }

    fn set(&self, state: SyncState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "Sync state transition");
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive claim on the state machine for one operation.
pub struct SyncSession<'a> {
    machine: &'a StateMachine,
    outcome: Option<SyncState>,
}

impl SyncSession<'_> {
    pub fn advance(&self, state: SyncState) {
        self.machine.set(state);
    }

    /// Record the operation result; the final state is applied on drop.
    pub fn finish<T>(mut self, result: Result<T, SyncError>) -> Result<T, SyncError> {
        self.outcome = Some(if result.is_ok() {
            SyncState::Idle
        } else {
            SyncState::Failed
        });
        result
    }
}

impl Drop for SyncSession<'_> {
    fn drop(&mut self) {
        self.machine.set(self.outcome.unwrap_or(SyncState::Idle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_session_is_rejected_while_first_runs() {
        let machine = StateMachine::new();
        let session = machine.begin().unwrap();
        session.advance(SyncState::Merging);

        match machine.begin() {
            Err(SyncError::SyncBusy(state)) => assert_eq!(state, SyncState::Merging),
            Err(other) => panic!("unexpected error: {:?}", other),
            Ok(_) => panic!("expected SyncBusy"),
        }
        drop(session);
        assert!(machine.begin().is_ok());
    }

    #[test]
    fn finish_records_outcome() {
        let machine = StateMachine::new();
        let session = machine.begin().unwrap();
        let result: Result<(), SyncError> =
            session.finish(Err(SyncError::TransientStore("timeout".to_string())));
        assert!(result.is_err());
        assert_eq!(machine.current(), SyncState::Failed);

        let session = machine.begin().unwrap();
        assert_eq!(machine.current(), SyncState::Reading);
        session.finish(Ok(())).unwrap();
        assert_eq!(machine.current(), SyncState::Idle);
    }

    #[test]
    fn dropped_session_resets_to_idle() {
        let machine = StateMachine::new();
        let session = machine.begin().unwrap();
        session.advance(SyncState::Writing);
        drop(session);
        assert_eq!(machine.current(), SyncState::Idle);
    }

    #[test]
    fn subscribers_observe_transitions() {
        let machine = StateMachine::new();
        let mut rx = machine.subscribe();
        let session = machine.begin().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SyncState::Reading);
        drop(session);
        assert_eq!(*rx.borrow_and_update(), SyncState::Idle);
    }
}
