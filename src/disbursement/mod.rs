pub mod directory;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod split;

pub use models::{AuthorizationEvent, ChargeAttempt, ChargeOutcome, DisbursementReport, DisbursementStatus};
pub use orchestrator::{DisbursementDirectory, DisbursementOrchestrator};
pub use policy::ApprovalPolicy;
pub use split::{compute_shares, MemberShare, RemainderPolicy};
