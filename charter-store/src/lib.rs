pub mod app_config;
pub mod database;
pub mod flight_repo;
pub mod location_repo;
pub mod mailer;
pub mod memory;
pub mod notification_repo;
pub mod relay;
pub mod ticket_repo;

pub use database::DbClient;
pub use location_repo::ConfiguredLocations;
pub use memory::MemoryStore;
