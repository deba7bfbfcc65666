use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const FREE_COURSE_CODE: &str = "FREE";
pub const FREE_COURSE_NAME: &str = "Free Period";
pub const FREE_TEACHER_NAME: &str = "FREE PERIOD";

pub const ADVISORY_COURSE_CODE: &str = "ADV";
pub const ADVISORY_COURSE_NAME: &str = "Advisory";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub course_code: Option<String>,
    pub course_name: String,
    pub teacher_name: String,
    pub room_number: Option<String>,
    pub created_at: String,
}

impl Course {
    pub fn is_free_period(&self) -> bool {
        self.course_code.as_deref() == Some(FREE_COURSE_CODE) && self.teacher_name == FREE_TEACHER_NAME
    }
}

/// One class slot as read off the schedule image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDescriptor {
    #[serde(default)]
    pub course_code: Option<String>,
    pub course_name: String,
    pub teacher_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
}

impl CourseDescriptor {
    /// The shared placeholder every empty slot resolves to.
    pub fn free_period() -> Self {
        Self {
            course_code: Some(FREE_COURSE_CODE.to_string()),
            course_name: FREE_COURSE_NAME.to_string(),
            teacher_name: FREE_TEACHER_NAME.to_string(),
            room_number: None,
        }
    }

    pub fn advisory(teacher_name: &str, room_number: Option<&str>) -> Self {
        Self {
            course_code: Some(ADVISORY_COURSE_CODE.to_string()),
            course_name: ADVISORY_COURSE_NAME.to_string(),
            teacher_name: teacher_name.to_string(),
            room_number: room_number.map(str::to_string),
        }
    }
}
