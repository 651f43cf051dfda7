use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days between ovulation and the next period onset.
pub const LUTEAL_PHASE_DAYS: i64 = 14;
/// The fertile window opens this many days before ovulation.
pub const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;
/// The fertile window closes this many days after ovulation.
pub const FERTILE_DAYS_AFTER_OVULATION: i64 = 1;
/// An ovulation at most this many days away triggers an upcoming-ovulation notice.
pub const UPCOMING_OVULATION_THRESHOLD_DAYS: i64 = 2;
pub const MIN_COMPLETED_CYCLES_FOR_PREDICTION: usize = 2;

pub const DEFAULT_CYCLE_LENGTH: i32 = 28;
pub const MIN_CYCLE_LENGTH: i32 = 21;
pub const MAX_CYCLE_LENGTH: i32 = 35;

pub const INSUFFICIENT_DATA_MESSAGE: &str = "Need at least 2 completed cycles for predictions";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_cycle_length")]
    pub expected_cycle_length: i32,
}

impl CycleRecord {
    pub fn new(user_id: Uuid, start_date: NaiveDate, expected_cycle_length: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            start_date,
            end_date: None,
            expected_cycle_length,
        }
    }

    /// A cycle with no end date yet is still ongoing.
    pub fn is_active(&self) -> bool {
        self.end_date.is_none()
    }

    /// Length in whole days of a completed cycle.
    pub fn length_days(&self) -> Option<i64> {
        self.end_date.map(|end| (end - self.start_date).num_days())
    }
}

fn default_cycle_length() -> i32 {
    DEFAULT_CYCLE_LENGTH
}

/// Forward-looking predictions derived from a user's completed cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CyclePrediction {
    pub next_period_date: Option<NaiveDate>,
    pub ovulation_date: Option<NaiveDate>,
    pub fertile_window_start: Option<NaiveDate>,
    pub fertile_window_end: Option<NaiveDate>,
    pub average_cycle_length_days: f64,
    pub has_sufficient_data: bool,
    pub message: String,
}

impl CyclePrediction {
    pub fn insufficient_data() -> Self {
        Self {
            next_period_date: None,
            ovulation_date: None,
            fertile_window_start: None,
            fertile_window_end: None,
            average_cycle_length_days: 0.0,
            has_sufficient_data: false,
            message: INSUFFICIENT_DATA_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NotificationType {
    Ovulation,
    FertileWindow,
    UpcomingOvulation,
    None,
}

impl NotificationType {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, NotificationType::None)
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationType::Ovulation => write!(f, "Ovulation"),
            NotificationType::FertileWindow => write!(f, "FertileWindow"),
            NotificationType::UpcomingOvulation => write!(f, "UpcomingOvulation"),
            NotificationType::None => write!(f, "None"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationDecision {
    pub notification_type: NotificationType,
    pub days_to_ovulation: i64,
    pub predicted_ovulation: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
}

/// A cycle record together with the figures shown alongside it.
///
/// Predictions are only filled in for active cycles; completed ones carry
/// their actual length instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub expected_cycle_length: i32,
    pub actual_cycle_length: Option<i64>,
    pub predicted_next_period: Option<NaiveDate>,
    pub predicted_ovulation: Option<NaiveDate>,
    pub fertile_window_start: Option<NaiveDate>,
    pub fertile_window_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub wants_cycle_notifications: bool,
    #[serde(default)]
    pub pill_reminder_time: Option<NaiveTime>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// One user whose active cycle warrants a notification right now.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleNotification {
    pub user: UserProfile,
    pub cycle: CycleView,
    pub decision: NotificationDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCycleRequest {
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_cycle_length")]
    pub expected_cycle_length: i32,
}

impl CreateCycleRequest {
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date: None,
            expected_cycle_length: DEFAULT_CYCLE_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCycleRequest {
    pub end_date: Option<NaiveDate>,
    pub expected_cycle_length: Option<i32>,
}

/// Checks an expected cycle length against the supported range.
pub fn validate_cycle_length(length: i32) -> Result<(), String> {
    if !(MIN_CYCLE_LENGTH..=MAX_CYCLE_LENGTH).contains(&length) {
        return Err(format!(
            "Expected cycle length must be between {} and {} days, got {}",
            MIN_CYCLE_LENGTH, MAX_CYCLE_LENGTH, length
        ));
    }
    Ok(())
}

/// Initial contents for an in-memory cycle store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub users: Vec<UserProfile>,
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub cycle_notifications_sent: usize,
    pub pill_reminders_sent: usize,
    pub failures: usize,
}
