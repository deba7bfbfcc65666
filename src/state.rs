use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::extraction::ScheduleExtractor;
use crate::services::{ScheduleService, TeacherLocks};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub extractor: Arc<dyn ScheduleExtractor>,
    pub schedules: Arc<ScheduleService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: SqlitePool, extractor: Arc<dyn ScheduleExtractor>, config: AppConfig) -> Self {
        let locks = Arc::new(TeacherLocks::new());
        let schedules = Arc::new(ScheduleService::new(db.clone(), locks));
        Self {
            db,
            extractor,
            schedules,
            config: Arc::new(config),
        }
    }
}
