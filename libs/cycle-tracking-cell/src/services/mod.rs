pub mod prediction;
pub mod clock;
pub mod repository;
pub mod dispatcher;
pub mod cycle;
pub mod notification;
pub mod worker;

pub use prediction::CyclePredictionEngine;
pub use clock::{Clock, FixedClock, SystemClock};
pub use repository::{CycleRepository, InMemoryCycleStore, UserDirectory};
pub use dispatcher::{LoggingDispatcher, NotificationDispatcher};
pub use cycle::CycleService;
pub use notification::NotificationService;
pub use worker::{HealthNotificationWorker, NotificationWorkerConfig};
