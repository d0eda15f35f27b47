// Business logic services

pub mod assessment_service;
pub mod email_notification_service;
pub mod geo_service;
pub mod kenya_heatmap_service;
pub mod notification_scheduler;
pub mod notification_service;
pub mod participant_service;
pub mod stock_request_service;
pub mod training_insights_service;
pub mod training_service;
pub mod user_service;

pub use assessment_service::AssessmentService;
pub use email_notification_service::{EmailNotificationService, SmtpConfig};
pub use geo_service::GeoService;
pub use kenya_heatmap_service::KenyaHeatmapService;
pub use notification_scheduler::NotificationScheduler;
pub use notification_service::NotificationService;
pub use participant_service::ParticipantService;
pub use stock_request_service::StockRequestService;
pub use training_insights_service::TrainingInsightsService;
pub use training_service::TrainingService;
pub use user_service::UserService;
