use async_trait::async_trait;

use crate::models::Booking;

use super::Notifier;

/// Sends mail through an HTTP relay API (JSON body, bearer key). When no
/// relay is configured the mailer degrades to a logged no-op so local
/// development works without credentials.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
    admin_email: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String, admin_email: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
            admin_email,
        }
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            tracing::debug!(to, subject, "mail relay not configured, skipping email");
            return Ok(());
        }

        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "html": html,
            }))
            .send()
            .await?;

        anyhow::ensure!(
            res.status().is_success(),
            "mail relay returned {}",
            res.status()
        );
        Ok(())
    }
}

fn booking_summary_html(booking: &Booking) -> String {
    format!(
        "<ul>\
         <li>Name: {}</li>\
         <li>Date: {}</li>\
         <li>Time: {}</li>\
         <li>Vehicle: {} ({})</li>\
         <li>Class: {}</li>\
         <li>Price: {}</li>\
         <li>Payment: {} ({})</li>\
         </ul>",
        booking.customer_name(),
        booking.test_date.format("%A, %d %B %Y"),
        booking.time_slot,
        booking.make_and_model,
        booking.registration_no,
        booking.class_selection.as_str(),
        booking.total_price,
        booking.payment_method.as_str(),
        booking.payment_status.as_str(),
    )
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send_customer_confirmation(&self, booking: &Booking) -> anyhow::Result<()> {
        let Some(email) = booking.email.as_deref() else {
            tracing::debug!(booking_id = %booking.id, "no customer email on booking, skipping confirmation");
            return Ok(());
        };

        let html = format!(
            "<p>Hi {},</p><p>Your vehicle test is booked.</p>{}",
            booking.first_name,
            booking_summary_html(booking)
        );
        self.send(email, "Your Booking Confirmation", &html).await
    }

    async fn send_admin_notification(&self, booking: &Booking) -> anyhow::Result<()> {
        if self.admin_email.is_empty() {
            return Ok(());
        }

        let html = format!("<p>New booking received.</p>{}", booking_summary_html(booking));
        self.send(&self.admin_email, "New Booking Notification", &html)
            .await
    }
}
