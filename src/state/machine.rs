use super::error::{StateError, StateResult};
use super::{SessionEvent, SessionPhase};

#[derive(Debug)]
pub struct StateMachine {
    state: SessionPhase,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionPhase::default(),
        }
    }

    pub fn state(&self) -> SessionPhase {
        self.state
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: SessionEvent) -> Option<SessionPhase> {
        use SessionEvent::*;
        match (self.state, event) {
            (SessionPhase::Empty, LoadImage) => Some(SessionPhase::Ready),
            (SessionPhase::Ready, LoadImage) => Some(SessionPhase::Ready),
            (SessionPhase::Ready, BeginRequest) => Some(SessionPhase::Generating),
            (SessionPhase::Generating, ResolveRequest) => Some(SessionPhase::Ready),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<SessionPhase> {
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        tracing::debug!(from = ?self.state, to = ?next, "session phase changed");
        self.state = next;
        Ok(self.state)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
