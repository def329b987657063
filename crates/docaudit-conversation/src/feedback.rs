//! User feedback relayed by email

use docaudit_core::{FeedbackRequest, FeedbackResponse, MailConfig, Mailer, OutgoingMail};
use std::sync::Arc;
use tracing::{error, info};

pub struct FeedbackService {
    mailer: Arc<dyn Mailer>,
    from_address: String,
    to_address: String,
}

impl FeedbackService {
    pub fn new(mailer: Arc<dyn Mailer>, config: &MailConfig) -> Self {
        Self {
            mailer,
            from_address: config.from_address.clone(),
            to_address: config.to_address.clone(),
        }
    }

    /// Compose the notification email for a feedback request
    pub fn compose(&self, request: &FeedbackRequest) -> OutgoingMail {
        OutgoingMail {
            subject: format!("New Feedback: {}", request.category),
            body: format!("Category: {}\n\nFeedback:\n{}", request.category, request.feedback),
            from: self.from_address.clone(),
            to: self.to_address.clone(),
        }
    }

    pub async fn submit(&self, request: &FeedbackRequest) -> FeedbackResponse {
        let mail = self.compose(request);

        match self.mailer.send(&mail).await {
            Ok(()) => {
                info!(category = %request.category, "Feedback sent");
                FeedbackResponse::new("200", "Feedback sent successfully")
            }
            Err(e) => {
                error!(category = %request.category, error = %e, "Failed to send feedback");
                FeedbackResponse::new("500", format!("Error sending email: {}", e))
            }
        }
    }
}
