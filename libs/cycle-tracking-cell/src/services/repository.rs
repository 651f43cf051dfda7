//! Storage ports for cycle records and user notification preferences,
//! plus an in-memory implementation backed by a JSON snapshot.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::CycleError;
use crate::models::{CycleRecord, StoreSnapshot, UserProfile};

/// Port for cycle record persistence.
#[async_trait]
pub trait CycleRepository: Send + Sync {
    async fn create(&self, record: CycleRecord) -> Result<CycleRecord, CycleError>;

    async fn get_by_id(&self, cycle_id: Uuid) -> Result<Option<CycleRecord>, CycleError>;

    /// Replace a stored record. Fails with `NotFound` if it was never created.
    async fn update(&self, record: &CycleRecord) -> Result<(), CycleError>;

    async fn remove(&self, cycle_id: Uuid) -> Result<(), CycleError>;

    /// All cycles of a user, newest start date first.
    async fn cycles_by_user(&self, user_id: Uuid) -> Result<Vec<CycleRecord>, CycleError>;

    /// The cycle with the latest start date, completed or not.
    async fn latest_cycle_by_user(&self, user_id: Uuid) -> Result<Option<CycleRecord>, CycleError>;

    /// The user's open cycle, wherever it sits in their history.
    async fn active_cycle_by_user(&self, user_id: Uuid) -> Result<Option<CycleRecord>, CycleError>;

    async fn active_cycles(&self) -> Result<Vec<CycleRecord>, CycleError>;

    /// Cycles starting within `[from, to]`, newest first.
    async fn cycles_by_date_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CycleRecord>, CycleError>;
}

/// Port for looking up users and their notification preferences.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>, CycleError>;

    async fn users_with_cycle_notifications(&self) -> Result<Vec<UserProfile>, CycleError>;

    /// Users opted into cycle notifications who also set a reminder time.
    async fn users_with_pill_reminders(&self) -> Result<Vec<UserProfile>, CycleError>;
}

#[derive(Debug, Default)]
pub struct InMemoryCycleStore {
    cycles: RwLock<HashMap<Uuid, CycleRecord>>,
    users: RwLock<HashMap<Uuid, UserProfile>>,
}

impl InMemoryCycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let users = snapshot.users.into_iter().map(|u| (u.user_id, u)).collect();
        let cycles = snapshot.cycles.into_iter().map(|c| (c.id, c)).collect();

        Self {
            cycles: RwLock::new(cycles),
            users: RwLock::new(users),
        }
    }

    /// Load a store from a JSON snapshot file.
    pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Self, CycleError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let snapshot: StoreSnapshot = serde_json::from_str(&raw)?;

        info!(
            "Loaded {} users and {} cycles from {}",
            snapshot.users.len(),
            snapshot.cycles.len(),
            path.display()
        );

        Ok(Self::from_snapshot(snapshot))
    }

    pub async fn upsert_user(&self, user: UserProfile) {
        self.users.write().await.insert(user.user_id, user);
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let mut users: Vec<UserProfile> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.user_id);
        let mut cycles: Vec<CycleRecord> = self.cycles.read().await.values().cloned().collect();
        cycles.sort_by_key(|c| (c.user_id, c.start_date));

        StoreSnapshot { users, cycles }
    }

    async fn collect_sorted<F>(&self, predicate: F) -> Vec<CycleRecord>
    where
        F: Fn(&CycleRecord) -> bool,
    {
        let mut cycles: Vec<CycleRecord> = self
            .cycles
            .read()
            .await
            .values()
            .filter(|c| predicate(c))
            .cloned()
            .collect();
        cycles.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        cycles
    }
}

#[async_trait]
impl CycleRepository for InMemoryCycleStore {
    async fn create(&self, record: CycleRecord) -> Result<CycleRecord, CycleError> {
        let mut cycles = self.cycles.write().await;
        if cycles.contains_key(&record.id) {
            return Err(CycleError::Conflict(format!("Cycle {} already exists", record.id)));
        }
        debug!("Storing cycle {} for user {}", record.id, record.user_id);
        cycles.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, cycle_id: Uuid) -> Result<Option<CycleRecord>, CycleError> {
        Ok(self.cycles.read().await.get(&cycle_id).cloned())
    }

    async fn update(&self, record: &CycleRecord) -> Result<(), CycleError> {
        let mut cycles = self.cycles.write().await;
        match cycles.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(CycleError::NotFound(format!("Cycle {} not found", record.id))),
        }
    }

    async fn remove(&self, cycle_id: Uuid) -> Result<(), CycleError> {
        self.cycles
            .write()
            .await
            .remove(&cycle_id)
            .map(|_| ())
            .ok_or_else(|| CycleError::NotFound(format!("Cycle {} not found", cycle_id)))
    }

    async fn cycles_by_user(&self, user_id: Uuid) -> Result<Vec<CycleRecord>, CycleError> {
        Ok(self.collect_sorted(|c| c.user_id == user_id).await)
    }

    async fn latest_cycle_by_user(&self, user_id: Uuid) -> Result<Option<CycleRecord>, CycleError> {
        Ok(self
            .cycles
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id)
            .max_by_key(|c| c.start_date)
            .cloned())
    }

    async fn active_cycle_by_user(&self, user_id: Uuid) -> Result<Option<CycleRecord>, CycleError> {
        Ok(self
            .cycles
            .read()
            .await
            .values()
            .filter(|c| c.user_id == user_id && c.is_active())
            .max_by_key(|c| c.start_date)
            .cloned())
    }

    async fn active_cycles(&self) -> Result<Vec<CycleRecord>, CycleError> {
        Ok(self.collect_sorted(|c| c.is_active()).await)
    }

    async fn cycles_by_date_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CycleRecord>, CycleError> {
        Ok(self
            .collect_sorted(|c| c.user_id == user_id && c.start_date >= from && c.start_date <= to)
            .await)
    }
}

#[async_trait]
impl UserDirectory for InMemoryCycleStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserProfile>, CycleError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn users_with_cycle_notifications(&self) -> Result<Vec<UserProfile>, CycleError> {
        let mut users: Vec<UserProfile> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.wants_cycle_notifications)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn users_with_pill_reminders(&self) -> Result<Vec<UserProfile>, CycleError> {
        let mut users: Vec<UserProfile> = self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.wants_cycle_notifications && u.pill_reminder_time.is_some())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }
}
