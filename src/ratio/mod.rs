pub mod models;
pub mod repository;
pub mod resolver;

pub use models::MemberRatio;
pub use repository::RatioRepository;
pub use resolver::RatioResolver;
