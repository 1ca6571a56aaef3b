pub mod events;
pub mod signature;

pub use events::{parse_event, InboundEvent};
pub use signature::WebhookVerifier;
