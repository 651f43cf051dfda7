// libs/cycle-tracking-cell/src/services/cycle.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CycleError;
use crate::models::{
    validate_cycle_length, CreateCycleRequest, CyclePrediction, CycleRecord, CycleView,
    UpdateCycleRequest,
};
use crate::services::clock::Clock;
use crate::services::prediction::CyclePredictionEngine;
use crate::services::repository::{CycleRepository, UserDirectory};

/// Owns the lifecycle of a user's cycle records and the invariants the
/// prediction engine relies on.
pub struct CycleService {
    cycles: Arc<dyn CycleRepository>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    engine: CyclePredictionEngine,
}

impl CycleService {
    pub fn new(
        cycles: Arc<dyn CycleRepository>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cycles,
            users,
            clock,
            engine: CyclePredictionEngine::new(),
        }
    }

    /// Start tracking a new cycle. Only one cycle per user may be open.
    pub async fn create_cycle(
        &self,
        user_id: Uuid,
        request: CreateCycleRequest,
    ) -> Result<CycleView, CycleError> {
        debug!("Creating cycle for user {} starting {}", user_id, request.start_date);

        if self.users.find_user(user_id).await?.is_none() {
            return Err(CycleError::NotFound("User not found".to_string()));
        }

        if let Some(active) = self.cycles.active_cycle_by_user(user_id).await? {
            warn!("User {} already has active cycle {}", user_id, active.id);
            return Err(CycleError::Conflict(
                "Please end the current cycle before starting a new one".to_string(),
            ));
        }

        let today = self.clock.now().date();
        if request.start_date > today {
            return Err(CycleError::ValidationError(
                "Start date cannot be in the future".to_string(),
            ));
        }

        validate_cycle_length(request.expected_cycle_length).map_err(CycleError::ValidationError)?;

        if let Some(end_date) = request.end_date {
            ensure_end_after_start(request.start_date, end_date)?;
        }

        let mut record = CycleRecord::new(user_id, request.start_date, request.expected_cycle_length);
        record.end_date = request.end_date;

        let created = self.cycles.create(record).await?;
        info!("Cycle {} created for user {}", created.id, user_id);

        Ok(self.engine.describe_cycle(&created))
    }

    pub async fn get_cycles_by_user(&self, user_id: Uuid) -> Result<Vec<CycleView>, CycleError> {
        let cycles = self.cycles.cycles_by_user(user_id).await?;
        Ok(self.describe_all(&cycles))
    }

    pub async fn get_cycle(&self, cycle_id: Uuid) -> Result<CycleView, CycleError> {
        let cycle = self.find_cycle(cycle_id).await?;
        Ok(self.engine.describe_cycle(&cycle))
    }

    pub async fn update_cycle(
        &self,
        cycle_id: Uuid,
        user_id: Uuid,
        request: UpdateCycleRequest,
    ) -> Result<CycleView, CycleError> {
        let mut cycle = self.find_owned_cycle(cycle_id, user_id, "update").await?;

        if let Some(end_date) = request.end_date {
            ensure_end_after_start(cycle.start_date, end_date)?;
            cycle.end_date = Some(end_date);
        }

        if let Some(length) = request.expected_cycle_length {
            validate_cycle_length(length).map_err(CycleError::ValidationError)?;
            cycle.expected_cycle_length = length;
        }

        self.cycles.update(&cycle).await?;
        info!("Cycle {} updated", cycle_id);

        Ok(self.engine.describe_cycle(&cycle))
    }

    pub async fn delete_cycle(&self, cycle_id: Uuid, user_id: Uuid) -> Result<(), CycleError> {
        self.find_owned_cycle(cycle_id, user_id, "delete").await?;
        self.cycles.remove(cycle_id).await?;
        info!("Cycle {} deleted", cycle_id);
        Ok(())
    }

    pub async fn get_latest_cycle(&self, user_id: Uuid) -> Result<CycleView, CycleError> {
        let cycle = self
            .cycles
            .latest_cycle_by_user(user_id)
            .await?
            .ok_or_else(|| CycleError::NotFound("No cycles found for user".to_string()))?;
        Ok(self.engine.describe_cycle(&cycle))
    }

    /// Close the user's open cycle.
    pub async fn end_current_cycle(&self, user_id: Uuid, end_date: NaiveDate) -> Result<CycleView, CycleError> {
        let mut cycle = self
            .cycles
            .active_cycle_by_user(user_id)
            .await?
            .ok_or_else(|| CycleError::NotFound("No active cycle found".to_string()))?;

        ensure_end_after_start(cycle.start_date, end_date)?;
        cycle.end_date = Some(end_date);
        self.cycles.update(&cycle).await?;

        info!("Cycle {} ended on {}", cycle.id, end_date);
        Ok(self.engine.describe_cycle(&cycle))
    }

    pub async fn get_predictions(&self, user_id: Uuid) -> Result<CyclePrediction, CycleError> {
        let cycles = self.cycles.cycles_by_user(user_id).await?;
        self.engine.predict(&cycles)
    }

    pub async fn get_active_cycles(&self) -> Result<Vec<CycleView>, CycleError> {
        let cycles = self.cycles.active_cycles().await?;
        Ok(self.describe_all(&cycles))
    }

    pub async fn get_cycles_by_date_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CycleView>, CycleError> {
        if from > to {
            return Err(CycleError::ValidationError(format!(
                "Range start {} is after range end {}",
                from, to
            )));
        }
        let cycles = self.cycles.cycles_by_date_range(user_id, from, to).await?;
        Ok(self.describe_all(&cycles))
    }

    // ==============================================================================
    // PRIVATE HELPER METHODS
    // ==============================================================================

    async fn find_cycle(&self, cycle_id: Uuid) -> Result<CycleRecord, CycleError> {
        self.cycles
            .get_by_id(cycle_id)
            .await?
            .ok_or_else(|| CycleError::NotFound("Cycle not found".to_string()))
    }

    async fn find_owned_cycle(&self, cycle_id: Uuid, user_id: Uuid, action: &str) -> Result<CycleRecord, CycleError> {
        let cycle = self.find_cycle(cycle_id).await?;
        if cycle.user_id != user_id {
            warn!("User {} tried to {} cycle {} they do not own", user_id, action, cycle_id);
            return Err(CycleError::Forbidden(format!("You can only {} your own cycles", action)));
        }
        Ok(cycle)
    }

    fn describe_all(&self, cycles: &[CycleRecord]) -> Vec<CycleView> {
        cycles.iter().map(|c| self.engine.describe_cycle(c)).collect()
    }
}

fn ensure_end_after_start(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), CycleError> {
    if end_date <= start_date {
        return Err(CycleError::ValidationError(
            "End date must be after start date".to_string(),
        ));
    }
    Ok(())
}
