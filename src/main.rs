//! Reviva - A multi-tenant business review platform

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reviva::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAttachmentRepository, SqlxBusinessRepository, SqlxCategoryRepository,
            SqlxReviewRepository, SqlxSessionRepository, SqlxUserRepository,
        },
    },
    services::{
        AuthService, BusinessService, CategoryService, PolicyEnforcer, ReviewService,
        SessionService, SmtpMailer, TokenService, UserService, VerificationService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reviva=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Reviva review platform...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!("Schema ready ({} migration(s) applied)", applied);

    // Backs the verification code store
    let cache = create_cache(&config.cache).await?;
    tracing::info!("Cache initialized: {:?}", config.cache.driver);

    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());
    let business_repo = SqlxBusinessRepository::boxed(pool.clone());
    let review_repo = SqlxReviewRepository::boxed(pool.clone());
    let attachment_repo = SqlxAttachmentRepository::boxed(pool.clone());

    let token_service = Arc::new(TokenService::new(&config.jwt));
    let mailer = Arc::new(SmtpMailer::new(&config.email));
    let verification = VerificationService::new(cache.clone(), mailer);
    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        session_repo.clone(),
        token_service.clone(),
        verification,
        config.auth.single_session,
    ));
    let user_service = Arc::new(UserService::new(user_repo));
    let session_service = Arc::new(SessionService::new(session_repo));
    let category_service = Arc::new(CategoryService::new(category_repo));
    let business_service = Arc::new(BusinessService::new(
        business_repo,
        attachment_repo.clone(),
    ));
    let review_service = Arc::new(ReviewService::new(review_repo, attachment_repo));

    let policy = Arc::new(PolicyEnforcer::new(&config.policy));
    tracing::info!("Authorization policy loaded: {} rules", config.policy.rules.len());

    let state = AppState {
        pool: pool.clone(),
        auth_service,
        user_service,
        session_service,
        business_service,
        category_service,
        review_service,
        token_service,
        policy,
    };

    let app = api::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
