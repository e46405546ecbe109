pub mod scheduler;
pub mod selector;
pub mod stats;

pub use scheduler::transition;
pub use selector::{due_cards, next_due};
pub use stats::{card_stats, CardStats};
