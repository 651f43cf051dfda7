#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use cycle_tracking_cell::*;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid test time")
}

pub fn at(day: &str, h: u32, m: u32) -> NaiveDateTime {
    date(day).and_time(time(h, m))
}

pub fn user(email: &str, wants_cycle_notifications: bool, pill_reminder_time: Option<NaiveTime>) -> UserProfile {
    UserProfile {
        user_id: Uuid::new_v4(),
        first_name: "Test".to_string(),
        last_name: email.split('@').next().unwrap_or_default().to_string(),
        email: email.to_string(),
        wants_cycle_notifications,
        pill_reminder_time,
    }
}

pub fn cycle(user_id: Uuid, start: &str, end: Option<&str>, expected_cycle_length: i32) -> CycleRecord {
    CycleRecord {
        id: Uuid::new_v4(),
        user_id,
        start_date: date(start),
        end_date: end.map(date),
        expected_cycle_length,
    }
}

/// Store plus the service wiring used by most tests.
pub struct TestContext {
    pub store: Arc<InMemoryCycleStore>,
    pub clock: Arc<FixedClock>,
}

impl TestContext {
    pub fn new(snapshot: StoreSnapshot, now: NaiveDateTime) -> Self {
        Self {
            store: Arc::new(InMemoryCycleStore::from_snapshot(snapshot)),
            clock: Arc::new(FixedClock(now)),
        }
    }

    pub fn cycle_service(&self) -> CycleService {
        CycleService::new(self.store.clone(), self.store.clone(), self.clock.clone())
    }

    pub fn notification_service(&self) -> NotificationService {
        NotificationService::new(self.store.clone(), self.store.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Cycle { email: String, notification_type: NotificationType, days_to_ovulation: i64 },
    Pill { email: String, at: NaiveTime },
}

/// Captures everything handed to it; can be told to reject one address.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub sent: Mutex<Vec<Sent>>,
    pub reject_email: Option<String>,
}

impl RecordingDispatcher {
    pub fn rejecting(email: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject_email: Some(email.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn check(&self, email: &str) -> Result<(), CycleError> {
        if self.reject_email.as_deref() == Some(email) {
            return Err(CycleError::Dispatch(format!("mailbox {} unavailable", email)));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send_cycle_notification(&self, notification: &CycleNotification) -> Result<(), CycleError> {
        self.check(&notification.user.email)?;
        self.sent.lock().unwrap().push(Sent::Cycle {
            email: notification.user.email.clone(),
            notification_type: notification.decision.notification_type,
            days_to_ovulation: notification.decision.days_to_ovulation,
        });
        Ok(())
    }

    async fn send_pill_reminder(&self, user: &UserProfile, current_time: NaiveTime) -> Result<(), CycleError> {
        self.check(&user.email)?;
        self.sent.lock().unwrap().push(Sent::Pill {
            email: user.email.clone(),
            at: current_time,
        });
        Ok(())
    }
}

/// Storage that is always down.
pub struct UnavailableStore;

fn down<T>() -> Result<T, CycleError> {
    Err(CycleError::Storage("down".to_string()))
}

#[async_trait]
impl CycleRepository for UnavailableStore {
    async fn create(&self, _record: CycleRecord) -> Result<CycleRecord, CycleError> {
        down()
    }

    async fn get_by_id(&self, _cycle_id: Uuid) -> Result<Option<CycleRecord>, CycleError> {
        down()
    }

    async fn update(&self, _record: &CycleRecord) -> Result<(), CycleError> {
        down()
    }

    async fn remove(&self, _cycle_id: Uuid) -> Result<(), CycleError> {
        down()
    }

    async fn cycles_by_user(&self, _user_id: Uuid) -> Result<Vec<CycleRecord>, CycleError> {
        down()
    }

    async fn latest_cycle_by_user(&self, _user_id: Uuid) -> Result<Option<CycleRecord>, CycleError> {
        down()
    }

    async fn active_cycle_by_user(&self, _user_id: Uuid) -> Result<Option<CycleRecord>, CycleError> {
        down()
    }

    async fn active_cycles(&self) -> Result<Vec<CycleRecord>, CycleError> {
        down()
    }

    async fn cycles_by_date_range(
        &self,
        _user_id: Uuid,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<CycleRecord>, CycleError> {
        down()
    }
}

#[async_trait]
impl UserDirectory for UnavailableStore {
    async fn find_user(&self, _user_id: Uuid) -> Result<Option<UserProfile>, CycleError> {
        down()
    }

    async fn users_with_cycle_notifications(&self) -> Result<Vec<UserProfile>, CycleError> {
        down()
    }

    async fn users_with_pill_reminders(&self) -> Result<Vec<UserProfile>, CycleError> {
        down()
    }
}
