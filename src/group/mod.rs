pub mod models;
pub mod repository;

pub use models::{Group, MemberAccount};
pub use repository::GroupRepository;
