//! Intake conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `(Option<Session>, Event) -> (Option<Session>, Vec<Effect>)`.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{ChatId, Session};
pub use transition::{transition, TransitionError};
