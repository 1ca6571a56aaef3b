pub mod models;
pub mod normalizer;
pub mod recurrence;

pub use models::{SubscriptionCandidate, Transaction};
pub use normalizer::normalize_rows;
pub use recurrence::detect;
