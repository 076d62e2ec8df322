use college_lms::{auth, config::AppConfig, models::Role};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Development seeding tool.
///
/// Wipes the application tables and repopulates them with a deterministic
/// demo dataset: one admin, two teachers, three students (all with the
/// password "password123"), three courses, and a handful of enrollments.
/// Intended for local environments only; it truncates data without asking.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.db_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    let mut tx = pool.begin().await?;

    // Children first, then parents.
    sqlx::query("TRUNCATE submissions, assignments, enrollments, courses, users")
        .execute(&mut *tx)
        .await?;

    let password_hash = auth::hash_password("password123").await?;

    let admin = insert_user(
        &mut tx,
        "Admin User",
        "admin@college.edu",
        &password_hash,
        Role::Admin,
        None,
    )
    .await?;
    let smith = insert_user(
        &mut tx,
        "Dr. Sarah Smith",
        "sarah.smith@college.edu",
        &password_hash,
        Role::Teacher,
        None,
    )
    .await?;
    let jones = insert_user(
        &mut tx,
        "Prof. David Jones",
        "david.jones@college.edu",
        &password_hash,
        Role::Teacher,
        None,
    )
    .await?;

    let alice = insert_user(
        &mut tx,
        "Alice Carter",
        "alice.carter@college.edu",
        &password_hash,
        Role::Student,
        Some("STU001"),
    )
    .await?;
    let bob = insert_user(
        &mut tx,
        "Bob Nguyen",
        "bob.nguyen@college.edu",
        &password_hash,
        Role::Student,
        Some("STU002"),
    )
    .await?;
    let carol = insert_user(
        &mut tx,
        "Carol Okafor",
        "carol.okafor@college.edu",
        &password_hash,
        Role::Student,
        Some("STU003"),
    )
    .await?;

    let cs101 = insert_course(
        &mut tx,
        "Introduction to Computer Science",
        "CS101",
        4,
        "Fall",
        2024,
        smith,
    )
    .await?;
    let cs201 = insert_course(
        &mut tx,
        "Data Structures and Algorithms",
        "CS201",
        3,
        "Spring",
        2025,
        smith,
    )
    .await?;
    let cs301 = insert_course(
        &mut tx,
        "Database Systems",
        "CS301",
        3,
        "Fall",
        2024,
        jones,
    )
    .await?;

    for (student, course) in [
        (alice, cs101),
        (alice, cs201),
        (bob, cs101),
        (carol, cs101),
        (carol, cs301),
    ] {
        sqlx::query("INSERT INTO enrollments (id, student_id, course_id) VALUES ($1, $2, $3)")
            .bind(Uuid::new_v4())
            .bind(student)
            .bind(course)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    println!("Seed complete.");
    println!("  admin:    admin@college.edu / password123");
    println!("  teachers: sarah.smith@college.edu, david.jones@college.edu");
    println!("  students: alice.carter@college.edu (STU001), bob.nguyen@college.edu (STU002), carol.okafor@college.edu (STU003)");
    report_counts(&pool).await?;

    Ok(())
}

async fn insert_user(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    student_id: Option<&str>,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO users (id, name, email, password_hash, role, student_id) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(student_id)
    .fetch_one(&mut **tx)
    .await
}

async fn insert_course(
    tx: &mut Transaction<'_, Postgres>,
    title: &str,
    code: &str,
    credits: i32,
    semester: &str,
    year: i32,
    teacher_id: Uuid,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO courses (id, title, course_code, credits, semester, year, teacher_id) \
         VALUES ($1, $2, $3, $4, $5::semester, $6, $7) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(code)
    .bind(credits)
    .bind(semester)
    .bind(year)
    .bind(teacher_id)
    .fetch_one(&mut **tx)
    .await
}

async fn report_counts(pool: &PgPool) -> Result<(), sqlx::Error> {
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    let courses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(pool)
        .await?;
    let enrollments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
        .fetch_one(pool)
        .await?;
    println!("  rows: {users} users, {courses} courses, {enrollments} enrollments");
    Ok(())
}
