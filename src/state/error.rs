use super::event::SessionEvent;
use super::model::SessionPhase;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("session cannot handle {event:?} while {from:?}")]
    InvalidStateTransition {
        from: SessionPhase,
        event: SessionEvent,
    },
}
