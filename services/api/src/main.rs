use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use api::{AppState, NoteServices, create_router};
use auth::email::{EmailSender, LogEmailSender, SmtpEmailSender};
use auth::repositories::{PgOtpRepository, PgUserRepository};
use auth::{AuthService, AuthStores};
use common::AppConfig;
use common::cache::RedisPool;
use common::database::{health_check, init_pool, run_migrations};
use notes::{GeminiNoteGenerator, LopdfExtractor, YoutubeTranscriptSource};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting TubeMind API");

    let pool = init_pool(&config.database).await?;
    if !health_check(&pool).await? {
        anyhow::bail!("Failed to connect to database");
    }
    run_migrations(&pool, &config.database.migrations_dir).await?;

    let redis = RedisPool::new(&config.redis)?;
    if !redis.health_check().await.unwrap_or(false) {
        warn!("Redis is not reachable; token revocation checks will fail until it is");
    }

    let email: Arc<dyn EmailSender> = if config.smtp_enabled() {
        Arc::new(SmtpEmailSender::new(&config.smtp)?)
    } else {
        warn!("SMTP is not configured; OTP codes will only be logged");
        Arc::new(LogEmailSender)
    };

    let auth = AuthService::new(
        &config.auth,
        AuthStores {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            otps: Arc::new(PgOtpRepository::new(pool.clone())),
            blacklist: Arc::new(redis),
            email,
        },
    );

    if let (Some(email), Some(password)) = (&config.admin.email, &config.admin.password) {
        let name = config.admin.name.as_deref().unwrap_or("Admin");
        match auth.ensure_admin_account(email, password, name).await {
            Ok(true) => info!("Created admin account {}", email),
            Ok(false) => info!("Admin account {} already exists", email),
            Err(e) => warn!("Failed to create admin account {}: {}", email, e),
        }
    }

    let notes = NoteServices {
        transcripts: Arc::new(YoutubeTranscriptSource::new()?),
        pdf_extractor: Arc::new(LopdfExtractor::new()),
        generator: Arc::new(GeminiNoteGenerator::from_settings(&config.ai)?),
    };

    tokio::fs::create_dir_all(&config.uploads.dir).await?;

    let bind_address = config.bind_address();
    let app = create_router(AppState::new(config, pool, auth, notes));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("TubeMind API listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
