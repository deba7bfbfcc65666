use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRequest {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Another student sharing a class, as presented to the requesting student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classmate {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub period: i64,
    pub day_type: crate::models::DayType,
}

/// Pre-filtered enrollment row considered for the classmate list.
#[derive(Debug, Clone, FromRow)]
pub struct ClassmateRow {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub period: i64,
    pub day_type: crate::models::DayType,
    pub course_code: Option<String>,
    pub room_number: Option<String>,
    pub teacher_name: String,
}

impl From<ClassmateRow> for Classmate {
    fn from(row: ClassmateRow) -> Self {
        Self {
            user_id: row.user_id,
            user_name: row.user_name,
            user_email: row.user_email,
            period: row.period,
            day_type: row.day_type,
        }
    }
}
