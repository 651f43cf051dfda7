use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info};

use crate::error::CycleError;
use crate::models::{CycleNotification, UserProfile};
use crate::services::prediction::CyclePredictionEngine;
use crate::services::repository::{CycleRepository, UserDirectory};

/// Finds who should hear from us right now. Does not send anything itself.
pub struct NotificationService {
    cycles: Arc<dyn CycleRepository>,
    users: Arc<dyn UserDirectory>,
    engine: CyclePredictionEngine,
}

impl NotificationService {
    pub fn new(cycles: Arc<dyn CycleRepository>, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            cycles,
            users,
            engine: CyclePredictionEngine::new(),
        }
    }

    /// Users whose open cycle sits near ovulation on `as_of`.
    pub async fn users_needing_notifications(&self, as_of: NaiveDate) -> Result<Vec<CycleNotification>, CycleError> {
        let users = self.users.users_with_cycle_notifications().await?;
        let mut notifications = Vec::new();

        for user in users {
            let Some(active) = self.cycles.active_cycle_by_user(user.user_id).await? else {
                continue;
            };

            let decision = self.engine.evaluate_notification(&active, as_of);
            debug!(
                "User {} is {} days from ovulation ({})",
                user.user_id, decision.days_to_ovulation, decision.notification_type
            );

            if !decision.notification_type.is_actionable() {
                continue;
            }

            notifications.push(CycleNotification {
                cycle: self.engine.describe_cycle(&active),
                user,
                decision,
            });
        }

        info!("{} users need cycle notifications on {}", notifications.len(), as_of);
        Ok(notifications)
    }

    /// Users whose pill reminder time falls within `window_minutes` of `current_time`.
    pub async fn pill_reminders_due(
        &self,
        current_time: NaiveTime,
        window_minutes: i64,
    ) -> Result<Vec<UserProfile>, CycleError> {
        let users = self.users.users_with_pill_reminders().await?;

        let due: Vec<UserProfile> = users
            .into_iter()
            .filter(|user| {
                user.pill_reminder_time.is_some_and(|reminder| {
                    self.engine
                        .eligible_for_pill_reminder(reminder, current_time, window_minutes)
                })
            })
            .collect();

        debug!("{} pill reminders due at {}", due.len(), current_time.format("%H:%M"));
        Ok(due)
    }
}
