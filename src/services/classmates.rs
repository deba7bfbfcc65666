use std::collections::BTreeMap;

use sqlx::SqlitePool;
use tracing::debug;

use crate::db::repository;
use crate::error::AppError;
use crate::matching::{Identify, matches};
use crate::models::{Classmate, EnrollmentDetail};

pub const NO_CODE: &str = "NO_CODE";

/// Classmates per composite key. A key that is absent means nobody else.
pub type ClassmateGroups = BTreeMap<String, Vec<Classmate>>;

/// `"{code or NO_CODE}-{teacher}-{period}-{day type}"`
pub fn composite_key(detail: &EnrollmentDetail) -> String {
    let code = detail
        .course_code
        .as_deref()
        .filter(|code| !code.is_empty())
        .unwrap_or(NO_CODE);
    format!("{}-{}-{}-{}", code, detail.teacher_name, detail.period, detail.day_type)
}

pub async fn find_classmates(db: &SqlitePool, user_id: &str) -> Result<ClassmateGroups, AppError> {
    let own = repository::fetch_enrollment_details(db, user_id).await?;
    group_classmates(db, user_id, &own).await
}

/// Groups other students sharing each of `own` enrollments.
///
/// The SQL pre-filter is wider than the matcher; the matcher decides.
pub async fn group_classmates(
    db: &SqlitePool,
    user_id: &str,
    own: &[EnrollmentDetail],
) -> Result<ClassmateGroups, AppError> {
    let mut groups = ClassmateGroups::new();

    for seed in own {
        let key = composite_key(seed);
        if groups.contains_key(&key) {
            continue;
        }

        let candidates = repository::fetch_classmate_candidates(db, seed).await?;
        let prefiltered = candidates.len();
        let classmates: Vec<Classmate> = candidates
            .into_iter()
            .filter(|row| row.user_id != user_id)
            .filter(|row| matches(seed.identity(), row.identity()))
            .map(Classmate::from)
            .collect();

        debug!("{}: {} candidate(s), {} classmate(s)", key, prefiltered, classmates.len());
        groups.insert(key, classmates);
    }

    Ok(groups)
}
