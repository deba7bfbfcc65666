use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::matching::normalize_teacher;
use crate::models::{
    ADVISORY_PERIOD, Advisory, CourseDescriptor, DaySlot, DayType, EnrollmentDetail, ExtractedSchedule, Schedule,
};
use crate::services::course_resolver::resolve_course;
use crate::services::locks::TeacherLocks;

/// One enrollment row the persister is about to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEnrollment {
    pub period: i64,
    pub day_type: DayType,
    pub course: CourseDescriptor,
}

/// A student's schedule rebuilt from persisted rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSchedule {
    pub schedule_id: String,
    pub schedule: ExtractedSchedule,
}

pub struct ScheduleService {
    db: SqlitePool,
    locks: Arc<TeacherLocks>,
}

impl ScheduleService {
    pub fn new(db: SqlitePool, locks: Arc<TeacherLocks>) -> Self {
        Self { db, locks }
    }

    /// Replaces the student's schedule with `extracted`.
    ///
    /// Runs in one transaction: on any error the previous schedule is left untouched.
    pub async fn save_schedule(&self, user_id: &str, extracted: &ExtractedSchedule) -> Result<Schedule, AppError> {
        let plan = enrollment_plan(extracted)?;
        let teachers = plan.iter().map(|entry| normalize_teacher(&entry.course.teacher_name));
        let _guards = self.locks.lock_all(teachers).await;

        // Take the write lock up front; a deferred transaction that reads first
        // cannot upgrade while another writer holds it.
        let mut tx = self.db.begin_with("BEGIN IMMEDIATE").await?;

        if repository::find_user_by_id(&mut tx, user_id).await?.is_none() {
            warn!("refusing to save schedule for unknown user {}", user_id);
            return Err(AppError::NotFound);
        }

        let removed = repository::delete_schedules_for_user(&mut tx, user_id).await?;
        let schedule = repository::insert_schedule(&mut tx, user_id).await?;

        for entry in &plan {
            let course = resolve_course(&mut tx, &entry.course).await?;
            repository::insert_enrollment(&mut tx, &schedule.id, &course.id, entry.period, entry.day_type).await?;
        }

        tx.commit().await?;

        info!(
            "saved schedule {} for user {} ({} enrollments, replaced {} schedule(s))",
            schedule.id,
            user_id,
            plan.len(),
            removed
        );
        Ok(schedule)
    }
}

/// Enrollments to write for `extracted`: red then blue for periods 1 to 4,
/// free slots as the FREE sentinel, then advisory when present.
///
/// Fails when any cell has not been extracted yet.
pub fn enrollment_plan(extracted: &ExtractedSchedule) -> Result<Vec<PlannedEnrollment>, AppError> {
    let mut plan = Vec::with_capacity(9);
    let mut incomplete = false;
    for (period, slots) in extracted.periods() {
        for (day_type, slot) in [(DayType::Red, &slots.red_day), (DayType::Blue, &slots.blue_day)] {
            let course = match slot {
                DaySlot::Course(course) => course.clone(),
                DaySlot::Free => CourseDescriptor::free_period(),
                DaySlot::Pending => {
                    incomplete = true;
                    continue;
                }
            };
            plan.push(PlannedEnrollment { period, day_type, course });
        }
    }

    if incomplete {
        return Err(AppError::Validation(format!(
            "schedule is incomplete, missing {}",
            extracted.pending_slots().join(", ")
        )));
    }

    if let Some(advisory) = &extracted.advisory {
        plan.push(PlannedEnrollment {
            period: ADVISORY_PERIOD,
            day_type: DayType::Both,
            course: CourseDescriptor::advisory(&advisory.teacher_name, advisory.room_number.as_deref()),
        });
    }

    Ok(plan)
}

/// Rebuilds the weekly schedule; FREE enrollments read back as free slots.
pub fn stored_schedule(details: &[EnrollmentDetail]) -> Option<StoredSchedule> {
    let first = details.first()?;

    let mut schedule = ExtractedSchedule::default();
    for period in 1..=4 {
        if let Some(slots) = schedule.period_mut(period) {
            slots.red_day = DaySlot::Free;
            slots.blue_day = DaySlot::Free;
        }
    }

    for detail in details {
        if detail.is_free_period() {
            continue;
        }

        if detail.period == ADVISORY_PERIOD {
            schedule.advisory = Some(Advisory {
                teacher_name: detail.teacher_name.clone(),
                room_number: detail.room_number.clone(),
            });
            continue;
        }

        let Some(slots) = schedule.period_mut(detail.period) else {
            warn!("ignoring enrollment with unexpected period {}", detail.period);
            continue;
        };
        let course = DaySlot::Course(CourseDescriptor {
            course_code: detail.course_code.clone(),
            course_name: detail.course_name.clone(),
            teacher_name: detail.teacher_name.clone(),
            room_number: detail.room_number.clone(),
        });
        match detail.day_type {
            DayType::Red => slots.red_day = course,
            DayType::Blue => slots.blue_day = course,
            DayType::Both => {
                slots.red_day = course.clone();
                slots.blue_day = course;
            }
        }
    }

    Some(StoredSchedule {
        schedule_id: first.schedule_id.clone(),
        schedule,
    })
}
