use blog_api::{app, auth::services::ensure_admin, db, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "blog_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;
    db::migrate(&state.db).await?;

    if let Some(admin) = &state.config.admin {
        ensure_admin(&state.db, admin).await?;
    }

    let config = state.config.clone();
    let pool = state.db.clone();
    app::serve(app::build_app(state), &config).await?;

    pool.close().await;
    tracing::info!("database pool closed");
    Ok(())
}
