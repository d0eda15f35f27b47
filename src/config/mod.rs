// Application configuration and startup helpers

pub mod app;
pub mod database;
pub mod seeding;

pub use app::AppConfig;
pub use database::{run_migrations, DatabaseConfig};
pub use seeding::DatabaseSeeder;
