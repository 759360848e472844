pub mod config;
pub mod database;
pub mod repository;

pub use config::{DEFAULT_TABLE, DatabaseConfig};
pub use database::{Database, SCHEMA_VERSION};
pub use repository::ConversationRepository;
