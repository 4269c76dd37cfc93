use sqlx::Row;

fn database_url() -> String {
    dotenvy::dotenv().ok();

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return url;
        }
    }

    let server = std::env::var("POSTGRES_SERVER").unwrap_or_else(|_| "localhost".into());
    let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".into());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "kodeto".into());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
    let db = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "kodeto_lms".into());

    format!("postgresql://{user}:{password}@{server}:{port}/{db}")
}

#[tokio::test]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url()).await?;

    let migrations_dir =
        std::env::var("KODETO_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir)).await?;
    migrator.run(&pool).await?;

    let tables = [
        "users",
        "user_profiles",
        "categories",
        "courses",
        "course_sections",
        "lessons",
        "course_resources",
        "enrollments",
        "course_reviews",
        "course_bundles",
        "course_bundle_items",
        "recorded_videos",
        "assessments",
        "questions",
        "question_options",
        "student_assessments",
        "student_answers",
        "course_notes",
        "live_classes",
        "live_class_attendance",
        "coupons",
        "payments",
        "payment_receipts",
        "subscriptions",
        "lesson_progress",
        "course_progress",
        "bundle_progress",
        "study_streaks",
        "learning_goals",
        "certificate_templates",
        "certificates",
        "certificate_verifications",
        "notifications",
        "notification_templates",
        "bulk_notifications",
    ];

    for table in tables {
        let row = sqlx::query("SELECT to_regclass($1)::text").bind(table).fetch_one(&pool).await?;
        let regclass: Option<String> = row.try_get(0)?;
        assert!(regclass.is_some(), "expected table {table} to exist after migrations");
    }

    let enums: Vec<String> =
        sqlx::query_scalar("SELECT typname::text FROM pg_type WHERE typtype = 'e'")
            .fetch_all(&pool)
            .await?;
    for expected in ["usertype", "attemptstatus", "liveclassstatus", "paymentstatus"] {
        assert!(enums.iter().any(|name| name == expected), "missing enum {expected}");
    }

    Ok(())
}
