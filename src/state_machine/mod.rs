//! Task lifecycle state management.
//!
//! States, lifecycle events, the pure transition function, and the guard
//! checks the store runs before ownership-sensitive transitions.

pub mod events;
pub mod guards;
pub mod states;
pub mod transitions;

pub use events::TaskEvent;
pub use states::TaskStatus;
pub use transitions::{next_status, FailureDisposition};
