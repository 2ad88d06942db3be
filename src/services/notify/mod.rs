pub mod mailer;

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::Booking;
use crate::state::AppState;

/// Outbound notification collaborator. Failures are logged and never roll
/// back the booking that triggered them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_customer_confirmation(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn send_admin_notification(&self, booking: &Booking) -> anyhow::Result<()>;
}

/// Fires confirmation and admin emails for a completed booking without
/// blocking the request that confirmed it.
pub fn notify_booking_confirmed(state: Arc<AppState>, booking: Booking) {
    tokio::spawn(async move {
        if let Err(e) = state.notifier.send_customer_confirmation(&booking).await {
            tracing::warn!(booking_id = %booking.id, "failed to send customer confirmation: {e:#}");
        }
        if let Err(e) = state.notifier.send_admin_notification(&booking).await {
            tracing::warn!(booking_id = %booking.id, "failed to send admin notification: {e:#}");
        }
    });
}
