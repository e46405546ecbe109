pub mod card;
pub mod rating;
pub mod review;

pub use card::{Card, CardId, CardState};
pub use rating::Rating;
pub use review::ReviewLog;
