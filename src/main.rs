use std::sync::Arc;

use mentortrack::api::routes::create_routes;
use mentortrack::config::{run_migrations, AppConfig, DatabaseConfig, DatabaseSeeder};
use mentortrack::services::{NotificationScheduler, NotificationService, SmtpConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;

    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;

    if config.seed_on_startup {
        DatabaseSeeder::new(pool.clone()).seed_all().await?;
    }

    // Background notification dispatch and session reminders
    let notification_service = Arc::new(NotificationService::new(
        pool.clone(),
        SmtpConfig::from_env(),
    ));
    NotificationScheduler::new(notification_service, pool.clone())
        .start()
        .await;

    let app = create_routes(pool, &config.jwt_secret);

    let listener = TcpListener::bind(config.server_address()).await?;
    info!("MentorTrack server starting on http://{}", config.server_address());
    info!("Health check available at http://{}/health", config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
