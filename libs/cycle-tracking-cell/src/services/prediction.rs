// libs/cycle-tracking-cell/src/services/prediction.rs
use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::error::CycleError;
use crate::models::{
    CyclePrediction, CycleRecord, CycleView, NotificationDecision, NotificationType,
    FERTILE_DAYS_AFTER_OVULATION, FERTILE_DAYS_BEFORE_OVULATION, LUTEAL_PHASE_DAYS,
    MIN_COMPLETED_CYCLES_FOR_PREDICTION, UPCOMING_OVULATION_THRESHOLD_DAYS,
};

/// Stateless cycle arithmetic shared by the cycle views, the predictions
/// endpoint and the notification sweep. Never touches storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct CyclePredictionEngine;

impl CyclePredictionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Predict the next period, ovulation and fertile window from a user's
    /// cycle history. Records may arrive in any order.
    pub fn predict(&self, records: &[CycleRecord]) -> Result<CyclePrediction, CycleError> {
        let completed: Vec<&CycleRecord> = records.iter().filter(|c| c.end_date.is_some()).collect();

        if completed.len() < MIN_COMPLETED_CYCLES_FOR_PREDICTION {
            debug!(
                "Only {} completed cycles available, skipping prediction",
                completed.len()
            );
            return Ok(CyclePrediction::insufficient_data());
        }

        let mut cycle_lengths = Vec::with_capacity(completed.len());
        for cycle in &completed {
            let length = cycle.length_days().unwrap_or_default();
            if length < 0 {
                warn!("Cycle {} ends before it starts", cycle.id);
                return Err(CycleError::ValidationError(format!(
                    "Cycle {} has end date {} before start date {}",
                    cycle.id,
                    cycle.end_date.unwrap_or(cycle.start_date),
                    cycle.start_date
                )));
            }
            cycle_lengths.push(length as f64);
        }

        let average_cycle_length = mean(&cycle_lengths);

        // The reference cycle may still be active.
        let last_start = records
            .iter()
            .map(|c| c.start_date)
            .max()
            .ok_or_else(|| CycleError::ValidationError("No cycles to predict from".to_string()))?;

        let next_period_date = last_start + Duration::days(average_cycle_length.round() as i64);
        let ovulation_date = next_period_date - Duration::days(LUTEAL_PHASE_DAYS);
        let (fertile_window_start, fertile_window_end) = fertile_window(ovulation_date);

        debug!(
            "Predicted next period {} from {} completed cycles (avg {:.1} days)",
            next_period_date,
            completed.len(),
            average_cycle_length
        );

        Ok(CyclePrediction {
            next_period_date: Some(next_period_date),
            ovulation_date: Some(ovulation_date),
            fertile_window_start: Some(fertile_window_start),
            fertile_window_end: Some(fertile_window_end),
            average_cycle_length_days: average_cycle_length,
            has_sufficient_data: true,
            message: format!("Predictions based on {} completed cycles", completed.len()),
        })
    }

    /// Decide whether an active cycle warrants a notification on `as_of`.
    ///
    /// Uses the record's own expected length rather than the multi-cycle
    /// average that [`predict`](Self::predict) uses.
    pub fn evaluate_notification(&self, record: &CycleRecord, as_of: NaiveDate) -> NotificationDecision {
        debug_assert!(
            record.is_active(),
            "notification evaluation requires an active cycle, got completed cycle {}",
            record.id
        );

        let predicted_ovulation = record.start_date
            + Duration::days(record.expected_cycle_length as i64 - LUTEAL_PHASE_DAYS);
        let (fertile_window_start, fertile_window_end) = fertile_window(predicted_ovulation);
        let days_to_ovulation = (predicted_ovulation - as_of).num_days();

        let notification_type = classify(
            as_of == predicted_ovulation,
            as_of >= fertile_window_start && as_of <= fertile_window_end,
            days_to_ovulation,
        );

        NotificationDecision {
            notification_type,
            days_to_ovulation,
            predicted_ovulation,
            fertile_window_start,
            fertile_window_end,
        }
    }

    /// Whether `current` lies within `window_minutes` of the reminder time.
    ///
    /// Times are compared on a plain 24-hour clock: 23:58 and 00:02 are
    /// 23h56m apart, not four minutes.
    pub fn eligible_for_pill_reminder(
        &self,
        reminder_time: NaiveTime,
        current_time: NaiveTime,
        window_minutes: i64,
    ) -> bool {
        let difference_ms = current_time
            .signed_duration_since(reminder_time)
            .num_milliseconds()
            .abs();
        difference_ms <= window_minutes * 60_000
    }

    /// Build the display view of a single record, with per-record predictions
    /// for active cycles.
    pub fn describe_cycle(&self, record: &CycleRecord) -> CycleView {
        let predicted_next_period = record.start_date + Duration::days(record.expected_cycle_length as i64);
        let predicted_ovulation = predicted_next_period - Duration::days(LUTEAL_PHASE_DAYS);
        let (fertile_window_start, fertile_window_end) = fertile_window(predicted_ovulation);
        let active = record.is_active();

        CycleView {
            id: record.id,
            user_id: record.user_id,
            start_date: record.start_date,
            end_date: record.end_date,
            expected_cycle_length: record.expected_cycle_length,
            actual_cycle_length: record.length_days(),
            predicted_next_period: active.then_some(predicted_next_period),
            predicted_ovulation: active.then_some(predicted_ovulation),
            fertile_window_start: active.then_some(fertile_window_start),
            fertile_window_end: active.then_some(fertile_window_end),
        }
    }
}

fn fertile_window(ovulation: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        ovulation - Duration::days(FERTILE_DAYS_BEFORE_OVULATION),
        ovulation + Duration::days(FERTILE_DAYS_AFTER_OVULATION),
    )
}

// First match wins.
fn classify(is_ovulation_day: bool, in_fertile_window: bool, days_to_ovulation: i64) -> NotificationType {
    if is_ovulation_day {
        NotificationType::Ovulation
    } else if in_fertile_window {
        NotificationType::FertileWindow
    } else if days_to_ovulation <= UPCOMING_OVULATION_THRESHOLD_DAYS {
        NotificationType::UpcomingOvulation
    } else {
        NotificationType::None
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
