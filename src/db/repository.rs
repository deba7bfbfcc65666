use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::{
    ClassmateRow, Course, CourseDescriptor, DayType, Enrollment, EnrollmentDetail, NewUserRequest, Schedule, User,
};

pub async fn upsert_user(db: &SqlitePool, req: NewUserRequest) -> Result<User, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            email = excluded.email
        RETURNING id, name, email, created_at
        "#,
    )
    .bind(req.id)
    .bind(req.name)
    .bind(req.email)
    .bind(now)
    .fetch_one(db)
    .await
}

pub async fn find_user_by_id(conn: &mut SqliteConnection, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, name, email, created_at FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Students that currently own a schedule, ordered by name.
pub async fn fetch_users_with_schedule(
    db: &SqlitePool,
    exclude_user_id: Option<&str>,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.name, u.email, u.created_at
        FROM users u
        WHERE EXISTS (SELECT 1 FROM schedules s WHERE s.user_id = u.id)
          AND (?1 IS NULL OR u.id != ?1)
        ORDER BY u.name
        "#,
    )
    .bind(exclude_user_id)
    .fetch_all(db)
    .await
}

/// Courses taught by `teacher_name`, oldest first.
pub async fn fetch_courses_by_teacher(
    conn: &mut SqliteConnection,
    teacher_name: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT id, course_code, course_name, teacher_name, room_number, created_at
        FROM courses
        WHERE teacher_name = ?1
        ORDER BY rowid
        "#,
    )
    .bind(teacher_name)
    .fetch_all(conn)
    .await
}

/// Stores code and room as given; empty strings become NULL.
pub async fn insert_course(
    conn: &mut SqliteConnection,
    descriptor: &CourseDescriptor,
    teacher_name: &str,
) -> Result<Option<Course>, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query_as::<_, Course>(
        r#"
        INSERT INTO courses (id, course_code, course_name, teacher_name, room_number, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        RETURNING id, course_code, course_name, teacher_name, room_number, created_at
        "#,
    )
    .bind(id)
    .bind(non_empty(descriptor.course_code.as_deref()))
    .bind(&descriptor.course_name)
    .bind(teacher_name)
    .bind(non_empty(descriptor.room_number.as_deref()))
    .bind(now)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_all_courses(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(
        "SELECT id, course_code, course_name, teacher_name, room_number, created_at FROM courses ORDER BY rowid",
    )
    .fetch_all(db)
    .await
}

/// Removes every schedule of the student together with its enrollments.
pub async fn delete_schedules_for_user(conn: &mut SqliteConnection, user_id: &str) -> Result<u64, sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM enrollments
        WHERE schedule_id IN (SELECT id FROM schedules WHERE user_id = ?1)
        "#,
    )
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    let deleted = sqlx::query("DELETE FROM schedules WHERE user_id = ?1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(deleted)
}

pub async fn insert_schedule(conn: &mut SqliteConnection, user_id: &str) -> Result<Schedule, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO schedules (id, user_id, created_at) VALUES (?1, ?2, ?3)")
        .bind(&id)
        .bind(user_id)
        .bind(&now)
        .execute(conn)
        .await?;

    Ok(Schedule {
        id,
        user_id: user_id.to_string(),
        created_at: now,
    })
}

pub async fn insert_enrollment(
    conn: &mut SqliteConnection,
    schedule_id: &str,
    course_id: &str,
    period: i64,
    day_type: DayType,
) -> Result<Enrollment, sqlx::Error> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO enrollments (id, schedule_id, course_id, period, day_type)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&id)
    .bind(schedule_id)
    .bind(course_id)
    .bind(period)
    .bind(day_type)
    .execute(conn)
    .await?;

    Ok(Enrollment {
        id,
        schedule_id: schedule_id.to_string(),
        course_id: course_id.to_string(),
        period,
        day_type,
    })
}

pub async fn fetch_enrollments_for_schedule(db: &SqlitePool, schedule_id: &str) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(
        r#"
        SELECT id, schedule_id, course_id, period, day_type
        FROM enrollments
        WHERE schedule_id = ?1
        ORDER BY period, rowid
        "#,
    )
    .bind(schedule_id)
    .fetch_all(db)
    .await
}

/// The student's enrollments joined with their courses.
pub async fn fetch_enrollment_details(db: &SqlitePool, user_id: &str) -> Result<Vec<EnrollmentDetail>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentDetail>(
        r#"
        SELECT
            s.id AS schedule_id,
            s.created_at AS schedule_created_at,
            e.period AS period,
            e.day_type AS day_type,
            c.course_code AS course_code,
            c.course_name AS course_name,
            c.teacher_name AS teacher_name,
            c.room_number AS room_number
        FROM schedules s
        INNER JOIN enrollments e ON e.schedule_id = s.id
        INNER JOIN courses c ON c.id = e.course_id
        WHERE s.user_id = ?1
        ORDER BY s.created_at, e.period, e.rowid
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// Enrollments in the seed's teacher/period/day that share its code or room,
/// or its course name when the seed has neither. Wider than the matcher.
pub async fn fetch_classmate_candidates(db: &SqlitePool, seed: &EnrollmentDetail) -> Result<Vec<ClassmateRow>, sqlx::Error> {
    sqlx::query_as::<_, ClassmateRow>(
        r#"
        SELECT
            s.user_id AS user_id,
            u.name AS user_name,
            u.email AS user_email,
            e.period AS period,
            e.day_type AS day_type,
            c.course_code AS course_code,
            c.room_number AS room_number,
            c.teacher_name AS teacher_name
        FROM enrollments e
        INNER JOIN courses c ON c.id = e.course_id
        INNER JOIN schedules s ON s.id = e.schedule_id
        INNER JOIN users u ON u.id = s.user_id
        WHERE c.teacher_name = ?1
          AND e.period = ?2
          AND e.day_type = ?3
          AND (
              (?4 IS NOT NULL AND c.course_code = ?4)
              OR (?5 IS NOT NULL AND c.room_number = ?5)
              OR (?4 IS NULL AND ?5 IS NULL AND c.course_name = ?6)
          )
        ORDER BY e.rowid
        "#,
    )
    .bind(&seed.teacher_name)
    .bind(seed.period)
    .bind(seed.day_type)
    .bind(non_empty(seed.course_code.as_deref()))
    .bind(non_empty(seed.room_number.as_deref()))
    .bind(&seed.course_name)
    .fetch_all(db)
    .await
}

pub async fn fetch_all_users(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, name, email, created_at FROM users ORDER BY created_at")
        .fetch_all(db)
        .await
}

pub async fn fetch_all_schedules(db: &SqlitePool) -> Result<Vec<Schedule>, sqlx::Error> {
    sqlx::query_as::<_, Schedule>("SELECT id, user_id, created_at FROM schedules ORDER BY created_at")
        .fetch_all(db)
        .await
}

pub async fn fetch_all_enrollments(db: &SqlitePool) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(
        "SELECT id, schedule_id, course_id, period, day_type FROM enrollments ORDER BY schedule_id, period, day_type",
    )
    .fetch_all(db)
    .await
}

/// Wipes every table, children first.
pub async fn clear_all(db: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    for table in ["enrollments", "schedules", "courses", "users"] {
        sqlx::query(&format!("DELETE FROM {table}")).execute(&mut *tx).await?;
    }
    tx.commit().await
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
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

    async fn add_user(db: &SqlitePool, id: &str, name: &str) -> User {
        upsert_user(
            db,
            NewUserRequest {
                id: id.to_string(),
                name: name.to_string(),
                email: format!("{id}@example.com"),
            },
        )
        .await
        .expect("Failed to insert user")
    }

    #[tokio::test]
    async fn test_upsert_user_updates_existing_row() {
        let pool = connect_in_memory().await.expect("Failed to create test db");

        let first = add_user(&pool, "u1", "Alice").await;
        let second = add_user(&pool, "u1", "Alicia").await;

        assert_eq!(second.name, "Alicia");
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(fetch_all_users(&pool).await.expect("Failed to fetch users").len(), 1);
    }

    #[tokio::test]
    async fn test_insert_course_stores_fields_as_given() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        let course = insert_course(&mut conn, &descriptor(Some("math-101"), "Math", "Smith", Some("")), "SMITH")
            .await
            .expect("Failed to insert course")
            .expect("insert returned no row");

        assert_eq!(course.course_code.as_deref(), Some("math-101"));
        assert_eq!(course.teacher_name, "SMITH");
        assert_eq!(course.room_number, None);
    }

    #[tokio::test]
    async fn test_courses_by_teacher_keep_creation_order() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");

        for code in ["C", "A", "B"] {
            insert_course(&mut conn, &descriptor(Some(code), "X", "Smith", None), "SMITH")
                .await
                .expect("Failed to insert course");
        }
        insert_course(&mut conn, &descriptor(Some("Z"), "X", "Jones", None), "JONES")
            .await
            .expect("Failed to insert course");

        let codes: Vec<String> = fetch_courses_by_teacher(&mut conn, "SMITH")
            .await
            .expect("Failed to fetch courses")
            .into_iter()
            .filter_map(|c| c.course_code)
            .collect();
        assert_eq!(codes, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_delete_schedules_for_user_only_touches_that_user() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        add_user(&pool, "u1", "Alice").await;
        add_user(&pool, "u2", "Bob").await;

        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let course = insert_course(&mut conn, &descriptor(Some("A1"), "Art", "Lee", None), "LEE")
            .await
            .expect("Failed to insert course")
            .expect("insert returned no row");
        let s1 = insert_schedule(&mut conn, "u1").await.expect("Failed to insert schedule");
        let s2 = insert_schedule(&mut conn, "u2").await.expect("Failed to insert schedule");
        insert_enrollment(&mut conn, &s1.id, &course.id, 1, DayType::Red)
            .await
            .expect("Failed to insert enrollment");
        insert_enrollment(&mut conn, &s2.id, &course.id, 1, DayType::Red)
            .await
            .expect("Failed to insert enrollment");

        let deleted = delete_schedules_for_user(&mut conn, "u1").await.expect("Failed to delete");
        drop(conn);

        assert_eq!(deleted, 1);
        assert!(fetch_enrollments_for_schedule(&pool, &s1.id).await.expect("query").is_empty());
        assert_eq!(fetch_enrollments_for_schedule(&pool, &s2.id).await.expect("query").len(), 1);
        let remaining = fetch_users_with_schedule(&pool, None).await.expect("query");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "u2");
    }

    #[tokio::test]
    async fn test_clear_all_empties_every_table() {
        let pool = connect_in_memory().await.expect("Failed to create test db");
        add_user(&pool, "u1", "Alice").await;
        {
            let mut conn = pool.acquire().await.expect("Failed to acquire connection");
            let schedule = insert_schedule(&mut conn, "u1").await.expect("Failed to insert schedule");
            let course = insert_course(&mut conn, &CourseDescriptor::free_period(), "FREE PERIOD")
                .await
                .expect("Failed to insert course")
                .expect("insert returned no row");
            insert_enrollment(&mut conn, &schedule.id, &course.id, 2, DayType::Blue)
                .await
                .expect("Failed to insert enrollment");
        }

        clear_all(&pool).await.expect("Failed to clear");

        assert!(fetch_all_users(&pool).await.expect("query").is_empty());
        assert!(fetch_all_courses(&pool).await.expect("query").is_empty());
        assert!(fetch_all_schedules(&pool).await.expect("query").is_empty());
        assert!(fetch_all_enrollments(&pool).await.expect("query").is_empty());
    }
}
