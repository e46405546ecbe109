//! Application services.
//!
//! Card operations live in [`review`]; the interactive review walk built on
//! top of them lives in [`session`].

pub mod review;
pub mod session;

pub use review::ReviewService;
pub use session::{AnswerOutcome, DueWatcher, ReviewSession, SessionPhase};
