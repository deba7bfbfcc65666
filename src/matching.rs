//! Course identity matching.
//!
//! Extracted schedules spell the same class in many ways ("MATH 101",
//! "math-101", room "B-12" vs "b12"). Two course records are considered the
//! same class when they share a teacher and at least one of course code or
//! room number positively agrees, with no conflict on the other.

use crate::models::{ClassmateRow, Course, EnrollmentDetail};

/// The fields that decide whether two records denote the same class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseIdentity<'a> {
    pub teacher_name: &'a str,
    pub course_code: Option<&'a str>,
    pub room_number: Option<&'a str>,
}

impl<'a> CourseIdentity<'a> {
    pub fn new(teacher_name: &'a str, course_code: Option<&'a str>, room_number: Option<&'a str>) -> Self {
        Self {
            teacher_name,
            course_code,
            room_number,
        }
    }
}

pub trait Identify {
    fn identity(&self) -> CourseIdentity<'_>;
}

impl Identify for Course {
    fn identity(&self) -> CourseIdentity<'_> {
        CourseIdentity::new(&self.teacher_name, self.course_code.as_deref(), self.room_number.as_deref())
    }
}

impl Identify for EnrollmentDetail {
    fn identity(&self) -> CourseIdentity<'_> {
        CourseIdentity::new(&self.teacher_name, self.course_code.as_deref(), self.room_number.as_deref())
    }
}

impl Identify for ClassmateRow {
    fn identity(&self) -> CourseIdentity<'_> {
        CourseIdentity::new(&self.teacher_name, self.course_code.as_deref(), self.room_number.as_deref())
    }
}

/// Strips everything but ASCII letters and digits and upper-cases the rest.
///
/// Returns `None` for a missing value or one that is empty after stripping.
pub fn normalize(value: Option<&str>) -> Option<String> {
    let normalized: String = value?
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() { None } else { Some(normalized) }
}

/// Teacher names are only upper-cased, never stripped.
pub fn normalize_teacher(name: &str) -> String {
    name.to_uppercase()
}

/// Symmetric, not transitive.
pub fn matches(a: CourseIdentity<'_>, b: CourseIdentity<'_>) -> bool {
    if a.teacher_name != b.teacher_name {
        return false;
    }

    let codes = (normalize(a.course_code), normalize(b.course_code));
    let rooms = (normalize(a.room_number), normalize(b.room_number));

    let code_agrees = match codes {
        (Some(x), Some(y)) if x != y => return false,
        (Some(_), Some(_)) => true,
        _ => false,
    };
    let room_agrees = match rooms {
        (Some(x), Some(y)) if x != y => return false,
        (Some(_), Some(_)) => true,
        _ => false,
    };

    code_agrees || room_agrees
}

/// First entry of `existing`, in slice order, that matches `candidate`.
pub fn find_match<'c, T: Identify>(candidate: CourseIdentity<'_>, existing: &'c [T]) -> Option<&'c T> {
    existing.iter().find(|course| matches(candidate, course.identity()))
}
