//! Checks against live PostgreSQL and Redis instances
//!
//! Run with `--ignored` once both services from the default settings are up.

use common::{
    cache::RedisPool,
    database::{health_check, init_pool, run_migrations},
    settings::{DatabaseConfig, RedisConfig},
};

#[tokio::test]
#[ignore = "requires running PostgreSQL"]
async fn test_migrations_create_schema() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::default()).await?;
    assert!(health_check(&pool).await?);

    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../services/api/migrations");
    run_migrations(&pool, dir).await?;

    for table in ["users", "otps", "videos", "pdfs", "chats", "pdf_chats"] {
        let present: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(table)
            .fetch_one(&pool)
            .await?;
        assert!(present, "missing table {}", table);
    }

    Ok(())
}

#[tokio::test]
#[ignore = "requires running Redis"]
async fn test_revocation_marker_expires() -> Result<(), Box<dyn std::error::Error>> {
    let redis = RedisPool::new(&RedisConfig::default())?;
    assert!(redis.health_check().await?);

    let key = "tubemind:test:expiring";
    redis.set_expiring(key, "1", 1).await?;
    assert!(redis.exists(key).await?);

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    assert!(!redis.exists(key).await?);

    Ok(())
}
