use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use shared_config::AppConfig;

use crate::error::CycleError;
use crate::models::SweepSummary;
use crate::services::clock::Clock;
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::notification::NotificationService;

#[derive(Debug, Clone)]
pub struct NotificationWorkerConfig {
    pub check_interval: Duration,
    pub retry_delay: Duration,
    pub pill_window_minutes: i64,
}

impl Default for NotificationWorkerConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

impl NotificationWorkerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            check_interval: Duration::from_secs(config.notification_check_interval_seconds),
            retry_delay: Duration::from_secs(config.notification_retry_delay_seconds),
            pill_window_minutes: config.pill_reminder_window_minutes,
        }
    }
}

/// Periodically sweeps for cycle notifications and pill reminders and hands
/// them to the dispatcher.
pub struct HealthNotificationWorker {
    config: NotificationWorkerConfig,
    notifications: Arc<NotificationService>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    shutdown_tx: watch::Sender<bool>,
}

impl HealthNotificationWorker {
    pub fn new(
        config: NotificationWorkerConfig,
        notifications: Arc<NotificationService>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            notifications,
            dispatcher,
            clock,
            shutdown_tx,
        }
    }

    /// Run sweeps until [`shutdown`](Self::shutdown) is called.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), CycleError> {
        info!("Health notification worker started");
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let wait = match self.run_once().await {
                Ok(summary) => {
                    debug!("Sweep finished: {:?}", summary);
                    self.config.check_interval
                }
                Err(e) => {
                    error!("Error occurred in health notification worker: {}", e);
                    self.config.retry_delay
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown_rx.changed() => {}
            }
        }

        info!("Health notification worker is stopping");
        Ok(())
    }

    pub fn shutdown(&self) {
        info!("Initiating shutdown for health notification worker");
        self.shutdown_tx.send_replace(true);
    }

    /// One pass over cycle notifications and pill reminders.
    ///
    /// A failed lookup or delivery is logged and counted, and the sweep moves
    /// on. Only when both lookups fail is the error returned, so the loop
    /// waits for the retry delay.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<SweepSummary, CycleError> {
        let now = self.clock.now();
        info!("Processing health notifications at {}", now);

        let mut summary = SweepSummary::default();

        let cycle_lookup = self.notifications.users_needing_notifications(now.date()).await;
        let cycle_lookup_failed = match cycle_lookup {
            Ok(notifications) => {
                if notifications.is_empty() {
                    info!("No users need cycle notifications at this time");
                }
                for notification in &notifications {
                    match self.dispatcher.send_cycle_notification(notification).await {
                        Ok(()) => summary.cycle_notifications_sent += 1,
                        Err(e) => {
                            summary.failures += 1;
                            error!(
                                "Failed to send cycle notification to {}: {}",
                                notification.user.email, e
                            );
                        }
                    }
                }
                false
            }
            Err(e) => {
                summary.failures += 1;
                error!("Failed to look up users needing cycle notifications: {}", e);
                true
            }
        };

        let current_time = now.time();
        match self
            .notifications
            .pill_reminders_due(current_time, self.config.pill_window_minutes)
            .await
        {
            Ok(due) => {
                if due.is_empty() {
                    info!("No users need pill reminders at this time ({})", current_time.format("%H:%M"));
                }
                for user in &due {
                    match self.dispatcher.send_pill_reminder(user, current_time).await {
                        Ok(()) => summary.pill_reminders_sent += 1,
                        Err(e) => {
                            summary.failures += 1;
                            error!("Failed to send pill reminder to {}: {}", user.email, e);
                        }
                    }
                }
            }
            Err(e) => {
                summary.failures += 1;
                error!("Failed to look up pill reminders due: {}", e);
                if cycle_lookup_failed {
                    return Err(e);
                }
            }
        }

        if summary.failures > 0 {
            warn!("{} notifications failed during sweep", summary.failures);
        }

        Ok(summary)
    }
}
