use async_trait::async_trait;
use chrono::NaiveTime;
use tracing::info;

use crate::error::CycleError;
use crate::models::{CycleNotification, UserProfile};

/// Delivers notifications produced by the sweep. Rendering and transport
/// belong to the implementation.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send_cycle_notification(&self, notification: &CycleNotification) -> Result<(), CycleError>;

    async fn send_pill_reminder(&self, user: &UserProfile, current_time: NaiveTime) -> Result<(), CycleError>;
}

/// Writes each notification as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn send_cycle_notification(&self, notification: &CycleNotification) -> Result<(), CycleError> {
        let decision = &notification.decision;
        info!(
            user_id = %notification.user.user_id,
            email = %notification.user.email,
            notification_type = %decision.notification_type,
            days_to_ovulation = decision.days_to_ovulation,
            ovulation = %decision.predicted_ovulation,
            fertile_window_start = %decision.fertile_window_start,
            fertile_window_end = %decision.fertile_window_end,
            "Cycle notification for {}",
            notification.user.full_name()
        );
        Ok(())
    }

    async fn send_pill_reminder(&self, user: &UserProfile, current_time: NaiveTime) -> Result<(), CycleError> {
        info!(
            user_id = %user.user_id,
            email = %user.email,
            "Pill reminder sent at {}",
            current_time.format("%H:%M")
        );
        Ok(())
    }
}
