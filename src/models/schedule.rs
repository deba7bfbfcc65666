use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ADVISORY_PERIOD: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DayType {
    Red,
    Blue,
    Both,
}

impl DayType {
    pub fn as_str(self) -> &'static str {
        match self {
            DayType::Red => "red",
            DayType::Blue => "blue",
            DayType::Both => "both",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: String,
    pub schedule_id: String,
    pub course_id: String,
    pub period: i64,
    pub day_type: DayType,
}

/// An enrollment of one student joined with its course.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDetail {
    pub schedule_id: String,
    pub schedule_created_at: String,
    pub period: i64,
    pub day_type: DayType,
    pub course_code: Option<String>,
    pub course_name: String,
    pub teacher_name: String,
    pub room_number: Option<String>,
}

impl EnrollmentDetail {
    pub fn is_free_period(&self) -> bool {
        self.course_code.as_deref() == Some(super::course::FREE_COURSE_CODE)
            && self.teacher_name == super::course::FREE_TEACHER_NAME
    }
}
