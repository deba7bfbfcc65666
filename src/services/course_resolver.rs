use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::db::repository;
use crate::error::AppError;
use crate::matching::{CourseIdentity, find_match, normalize_teacher};
use crate::models::{Course, CourseDescriptor};

/// Returns the existing course `descriptor` refers to, creating it on first sighting.
///
/// Only courses of the same (upper-cased) teacher are considered, oldest
/// first; the first one the matcher accepts wins. Callers that may race on
/// the same teacher must hold that teacher's lock from
/// [`TeacherLocks`](crate::services::TeacherLocks) until their transaction commits.
pub async fn resolve_course(conn: &mut SqliteConnection, descriptor: &CourseDescriptor) -> Result<Course, AppError> {
    let teacher_name = normalize_teacher(&descriptor.teacher_name);
    let candidates = repository::fetch_courses_by_teacher(&mut *conn, &teacher_name).await?;

    let identity = CourseIdentity::new(
        &teacher_name,
        descriptor.course_code.as_deref(),
        descriptor.room_number.as_deref(),
    );
    if let Some(existing) = find_match(identity, &candidates) {
        debug!(
            "matched {:?} ({}) to existing course {}",
            descriptor.course_code, teacher_name, existing.id
        );
        return Ok(existing.clone());
    }

    let created = repository::insert_course(conn, descriptor, &teacher_name)
        .await?
        .ok_or_else(|| {
            AppError::Resolver(format!(
                "insert returned no row for {} / {}",
                teacher_name, descriptor.course_name
            ))
        })?;

    info!(
        "created course {} ({:?}, {}, room {:?})",
        created.id, created.course_code, created.teacher_name, created.room_number
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn descriptor(code: Option<&str>, name: &str, teacher: &str, room: Option<&str>) -> CourseDescriptor {
        CourseDescriptor {
            course_code: code.map(str::to_string),
            course_name: name.to_string(),
            teacher_name: teacher.to_string(),
            room_number: room.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_resolving_twice_returns_same_course() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let algebra = descriptor(Some("ALG2"), "Algebra II", "Smith", Some("B12"));

        let first = resolve_course(&mut conn, &algebra).await.expect("Failed to resolve");
        let second = resolve_course(&mut conn, &algebra).await.expect("Failed to resolve");

        assert_eq!(first.id, second.id);
        assert_eq!(first.teacher_name, "SMITH");
        assert_eq!(repository::fetch_courses_by_teacher(&mut conn, "SMITH").await.expect("query").len(), 1);
    }

    #[tokio::test]
    async fn test_noisy_spelling_resolves_to_existing_course() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let original = resolve_course(&mut conn, &descriptor(Some("MATH 101"), "Math", "smith", None))
            .await
            .expect("Failed to resolve");
        let noisy = resolve_course(&mut conn, &descriptor(Some("math-101"), "Mathematics", "SMITH", Some("B12")))
            .await
            .expect("Failed to resolve");

        assert_eq!(original.id, noisy.id);
        assert_eq!(noisy.course_code.as_deref(), Some("MATH 101"));
        assert_eq!(noisy.course_name, "Math");
    }

    #[tokio::test]
    async fn test_conflicting_code_creates_new_course() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let math = resolve_course(&mut conn, &descriptor(Some("MATH101"), "Math", "Smith", Some("B12")))
            .await
            .expect("Failed to resolve");
        let eng = resolve_course(&mut conn, &descriptor(Some("ENG201"), "English", "Smith", Some("B12")))
            .await
            .expect("Failed to resolve");

        assert_ne!(math.id, eng.id);
    }

    #[tokio::test]
    async fn test_teacher_only_descriptor_always_creates() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let bare = descriptor(None, "Study Hall", "Smith", None);

        let first = resolve_course(&mut conn, &bare).await.expect("Failed to resolve");
        let second = resolve_course(&mut conn, &bare).await.expect("Failed to resolve");

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_first_created_candidate_wins() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let by_room = resolve_course(&mut conn, &descriptor(None, "Chem", "Diaz", Some("LAB1")))
            .await
            .expect("Failed to resolve");
        let by_code = resolve_course(&mut conn, &descriptor(Some("CHEM1"), "Chem", "Diaz", None))
            .await
            .expect("Failed to resolve");
        assert_ne!(by_room.id, by_code.id);

        let both = resolve_course(&mut conn, &descriptor(Some("CHEM1"), "Chem", "Diaz", Some("LAB1")))
            .await
            .expect("Failed to resolve");
        assert_eq!(both.id, by_room.id);
    }

    #[tokio::test]
    async fn test_free_period_sentinel_is_shared() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let a = resolve_course(&mut conn, &CourseDescriptor::free_period()).await.expect("Failed to resolve");
        let b = resolve_course(&mut conn, &CourseDescriptor::free_period()).await.expect("Failed to resolve");

        assert_eq!(a.id, b.id);
        assert!(a.is_free_period());
    }
}
