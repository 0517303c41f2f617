//! Sentra Runtime - transaction lifecycle controller
//!
//! Owns the synchronous decision path: validate, persist PENDING, score,
//! record the decision, transition the state machine, and feed the outcome
//! back into the user profile. Per-user ordering is enforced with in-process
//! advisory locks; every store call runs under a per-operation deadline and
//! the whole request under a total deadline.

pub mod cancel;
pub mod locks;
pub mod service;

pub use cancel::CancelToken;
pub use locks::UserLocks;
pub use service::{IngestOutcome, LifecycleService};
