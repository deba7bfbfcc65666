#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use schedule_finder::config::AppConfig;
use schedule_finder::db::{self, repository};
use schedule_finder::error::AppError;
use schedule_finder::extraction::{ImageInput, ScheduleExtractor, ValidationReport};
use schedule_finder::models::{Advisory, CourseDescriptor, DaySlot, ExtractedSchedule, NewUserRequest, PeriodSlots, User};
use schedule_finder::services::{ScheduleService, TeacherLocks};
use schedule_finder::state::AppState;
use sqlx::SqlitePool;

/// Answers every call with a fixed validation report and schedule.
pub struct ScriptedExtractor {
    pub report: ValidationReport,
    pub schedule: ExtractedSchedule,
}

#[async_trait]
impl ScheduleExtractor for ScriptedExtractor {
    async fn validate(&self, _image: &ImageInput) -> Result<ValidationReport, AppError> {
        Ok(self.report.clone())
    }

    async fn extract(&self, _image: &ImageInput) -> Result<ExtractedSchedule, AppError> {
        Ok(self.schedule.clone())
    }
}

pub fn valid_report() -> ValidationReport {
    ValidationReport {
        is_valid: true,
        confidence: 0.95,
        issues: Vec::new(),
    }
}

pub async fn setup_test_db() -> SqlitePool {
    db::connect_in_memory().await.expect("Failed to create test db")
}

/// Database file in the temp dir behind a multi-connection pool; removed on drop.
pub struct FileDb {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let _ = std::fs::remove_file(format!("{}{}", self.path.display(), suffix));
        }
    }
}

pub async fn setup_file_db() -> FileDb {
    let path = std::env::temp_dir().join(format!("schedule-finder-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let pool = db::connect(&url, 5).await.expect("Failed to create file db");
    FileDb { pool, path }
}

pub async fn add_user(pool: &SqlitePool, id: &str, name: &str) -> User {
    repository::upsert_user(
        pool,
        NewUserRequest {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@school.example", id),
        },
    )
    .await
    .expect("Failed to insert user")
}

pub fn schedule_service(pool: &SqlitePool) -> ScheduleService {
    ScheduleService::new(pool.clone(), Arc::new(TeacherLocks::new()))
}

pub fn test_state(pool: SqlitePool, extractor: ScriptedExtractor) -> AppState {
    let config = AppConfig {
        enable_debug_routes: true,
        ..AppConfig::default()
    };
    AppState::new(pool, Arc::new(extractor), config)
}

pub fn course(code: &str, name: &str, teacher: &str, room: Option<&str>) -> DaySlot {
    DaySlot::Course(CourseDescriptor {
        course_code: Some(code.to_string()),
        course_name: name.to_string(),
        teacher_name: teacher.to_string(),
        room_number: room.map(str::to_string),
    })
}

/// Every period free on both days, no advisory.
pub fn free_schedule() -> ExtractedSchedule {
    let free = PeriodSlots {
        red_day: DaySlot::Free,
        blue_day: DaySlot::Free,
    };
    ExtractedSchedule {
        first_period: free.clone(),
        second_period: free.clone(),
        third_period: free.clone(),
        fourth_period: free,
        advisory: None,
    }
}

pub fn with_advisory(mut schedule: ExtractedSchedule, teacher: &str, room: Option<&str>) -> ExtractedSchedule {
    schedule.advisory = Some(Advisory {
        teacher_name: teacher.to_string(),
        room_number: room.map(str::to_string),
    });
    schedule
}
