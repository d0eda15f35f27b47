use chrono::Utc;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::collections::HashMap;
use std::env;

use crate::models::{Notification, NotificationType};

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    /// When false, emails are rendered and logged but not sent.
    pub enabled: bool,
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .unwrap_or(587),
            username: env::var("SMTP_USERNAME").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@mentortrack.health".to_string()),
            from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "MentorTrack".to_string()),
            enabled: env::var("SMTP_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_email: "noreply@mentortrack.health".to_string(),
            from_name: "MentorTrack".to_string(),
            enabled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailTemplate {
    pub subject_template: String,
    pub text_template: String,
    pub html_template: String,
}

#[derive(Debug)]
struct EmailContext {
    recipient_name: String,
    subject: String,
    message: String,
    details: Option<serde_json::Value>,
    app_name: String,
    current_date: String,
}

#[derive(Debug)]
pub struct EmailNotificationService {
    templates: HashMap<NotificationType, EmailTemplate>,
    smtp_config: SmtpConfig,
}

impl EmailNotificationService {
    pub fn new(smtp_config: SmtpConfig) -> Self {
        let mut templates = HashMap::new();

        templates.insert(
            NotificationType::EnrollmentConfirmation,
            EmailTemplate {
                subject_template: "Enrollment confirmed: {{subject}}".to_string(),
                text_template: include_str!("../templates/email/enrollment_confirmation.txt")
                    .to_string(),
                html_template: include_str!("../templates/email/enrollment_confirmation.html")
                    .to_string(),
            },
        );

        templates.insert(
            NotificationType::SessionReminder,
            EmailTemplate {
                subject_template: "Session reminder: {{subject}}".to_string(),
                text_template: include_str!("../templates/email/session_reminder.txt").to_string(),
                html_template: include_str!("../templates/email/session_reminder.html")
                    .to_string(),
            },
        );

        templates.insert(
            NotificationType::StockRequestApproved,
            EmailTemplate {
                subject_template: "Stock request: {{subject}}".to_string(),
                text_template: include_str!("../templates/email/stock_request.txt").to_string(),
                html_template: include_str!("../templates/email/stock_request.html").to_string(),
            },
        );

        templates.insert(
            NotificationType::TrainingCompletion,
            EmailTemplate {
                subject_template: "Congratulations: {{subject}}".to_string(),
                text_template: include_str!("../templates/email/training_completion.txt")
                    .to_string(),
                html_template: include_str!("../templates/email/training_completion.html")
                    .to_string(),
            },
        );

        Self {
            templates,
            smtp_config,
        }
    }

    pub async fn send_notification_email(
        &self,
        notification: &Notification,
        recipient_name: &str,
    ) -> Result<(), EmailError> {
        let template = self
            .templates
            .get(&notification.notification_type)
            .ok_or(EmailError::TemplateNotFound)?;

        let context = EmailContext {
            recipient_name: recipient_name.to_string(),
            subject: notification.subject.clone(),
            message: notification.message.clone(),
            details: notification.data.clone(),
            app_name: "MentorTrack".to_string(),
            current_date: Utc::now().format("%B %d, %Y").to_string(),
        };

        let subject = render_template(&template.subject_template, &context);
        let text_body = render_template(&template.text_template, &context);
        let html_body = render_template(&template.html_template, &context);

        self.send_email(&notification.recipient_email, &subject, text_body, html_body)
            .await?;

        tracing::info!(
            "Sent {:?} email for notification {} to {}",
            notification.notification_type,
            notification.id,
            notification.recipient_email
        );
        Ok(())
    }

    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let from: Mailbox = format!(
            "{} <{}>",
            self.smtp_config.from_name, self.smtp_config.from_email
        )
        .parse()
        .map_err(|_| EmailError::InvalidEmailAddress(self.smtp_config.from_email.clone()))?;
        let to: Mailbox = to_email
            .parse()
            .map_err(|_| EmailError::InvalidEmailAddress(to_email.to_string()))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text_body, html_body))
            .map_err(|e| EmailError::EmailSendingFailed(e.to_string()))?;

        if !self.smtp_config.enabled {
            tracing::info!(
                "SMTP disabled; skipping delivery to {} (subject: {})",
                to_email,
                subject
            );
            return Ok(());
        }

        let transport = SmtpTransport::relay(&self.smtp_config.host)
            .map_err(|e| EmailError::SmtpConnectionFailed(e.to_string()))?
            .port(self.smtp_config.port)
            .credentials(Credentials::new(
                self.smtp_config.username.clone(),
                self.smtp_config.password.clone(),
            ))
            .build();

        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| EmailError::EmailSendingFailed(e.to_string()))?
            .map_err(|e| EmailError::EmailSendingFailed(e.to_string()))?;

        Ok(())
    }
}

fn render_template(template: &str, context: &EmailContext) -> String {
    let mut rendered = template.to_string();

    rendered = rendered.replace("{{recipient_name}}", &context.recipient_name);
    rendered = rendered.replace("{{subject}}", &context.subject);
    rendered = rendered.replace("{{message}}", &context.message);
    rendered = rendered.replace("{{app_name}}", &context.app_name);
    rendered = rendered.replace("{{current_date}}", &context.current_date);

    if let Some(details) = &context.details {
        if let Ok(details_str) = serde_json::to_string_pretty(details) {
            rendered = rendered.replace("{{details}}", &details_str);
        }
    } else {
        rendered = rendered.replace("{{details}}", "");
    }

    rendered
}

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Email template not found for notification type")]
    TemplateNotFound,
    #[error("SMTP connection failed: {0}")]
    SmtpConnectionFailed(String),
    #[error("Email sending failed: {0}")]
    EmailSendingFailed(String),
    #[error("Invalid email address: {0}")]
    InvalidEmailAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> EmailContext {
        EmailContext {
            recipient_name: "Amina".to_string(),
            subject: "HIV Testing Services Mentorship".to_string(),
            message: "You are enrolled.".to_string(),
            details: Some(serde_json::json!({"item": "Test kits"})),
            app_name: "MentorTrack".to_string(),
            current_date: "March 1, 2025".to_string(),
        }
    }

    #[test]
    fn test_render_replaces_placeholders() {
        let rendered = render_template(
            "Hello {{recipient_name}}, {{message}} ({{app_name}}, {{current_date}})",
            &context(),
        );
        assert_eq!(
            rendered,
            "Hello Amina, You are enrolled. (MentorTrack, March 1, 2025)"
        );
    }

    #[test]
    fn test_render_details_json() {
        let rendered = render_template("Details: {{details}}", &context());
        assert!(rendered.contains("Test kits"));
    }

    #[test]
    fn test_render_missing_details_is_blank() {
        let mut ctx = context();
        ctx.details = None;
        assert_eq!(render_template("D:{{details}}", &ctx), "D:");
    }

    #[test]
    fn test_every_notification_type_has_a_template() {
        let service = EmailNotificationService::new(SmtpConfig::default());
        for notification_type in [
            NotificationType::EnrollmentConfirmation,
            NotificationType::SessionReminder,
            NotificationType::StockRequestApproved,
            NotificationType::TrainingCompletion,
        ] {
            assert!(service.templates.contains_key(&notification_type));
        }
    }

    #[test]
    fn test_send_renders_but_skips_delivery_when_smtp_disabled() {
        use crate::models::DeliveryStatus;
        use chrono::Utc;
        use uuid::Uuid;

        let service = EmailNotificationService::new(SmtpConfig::default());
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_email: "amina@moh.go.ke".to_string(),
            user_id: None,
            notification_type: NotificationType::EnrollmentConfirmation,
            subject: "HIV Testing Services Mentorship".to_string(),
            message: "You are enrolled.".to_string(),
            data: None,
            delivery_status: DeliveryStatus::Pending,
            sent_at: None,
            created_at: Utc::now(),
        };

        tokio_test::block_on(service.send_notification_email(&notification, "Amina")).unwrap();
    }

    #[test]
    fn test_send_rejects_invalid_recipient() {
        use crate::models::DeliveryStatus;
        use chrono::Utc;
        use uuid::Uuid;

        let service = EmailNotificationService::new(SmtpConfig::default());
        let notification = Notification {
            id: Uuid::new_v4(),
            recipient_email: "not an address".to_string(),
            user_id: None,
            notification_type: NotificationType::SessionReminder,
            subject: "Session".to_string(),
            message: "Reminder.".to_string(),
            data: None,
            delivery_status: DeliveryStatus::Pending,
            sent_at: None,
            created_at: Utc::now(),
        };

        let result = tokio_test::block_on(service.send_notification_email(&notification, "Amina"));
        assert!(matches!(result, Err(EmailError::InvalidEmailAddress(_))));
    }
}
