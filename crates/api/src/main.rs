use anyhow::{Context, Result};
use snowtrip_api::build_app;
use snowtrip_core::Settings;
use snowtrip_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("snowtrip_api");

    let settings = Settings::from_env();
    let bind = settings.bind.clone();
    let app = build_app(settings).await;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed binding {bind}"))?;
    tracing::info!(bind = %bind, "snowtrip dialogue api started");

    axum::serve(listener, app).await?;
    Ok(())
}
