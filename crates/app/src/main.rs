use std::{net::SocketAddr, sync::Arc, time::Duration};

use identity::{
    HttpProviderConfig, HttpVerificationProvider, IdentityService, Unconfigured,
    VerificationProvider,
};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "swisscoin={level},server={level},identity={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let Some(server) = settings.server else {
        tracing::warn!("no [server] section configured, nothing to run");
        return Ok(());
    };
    tracing::info!("Found server settings...");

    let db = parse_database(&server.database).await?;
    let (provider, max_retries) = verification_provider(settings.verification.as_ref())?;
    let identity = IdentityService::builder()
        .database(db)
        .provider(provider)
        .max_retries(max_retries)
        .build()?;

    let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let addr: SocketAddr = format!("{}:{}", bind, server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    server::run_with_listener(identity, listener).await?;

    Ok(())
}

fn verification_provider(
    config: Option<&settings::Verification>,
) -> Result<(Arc<dyn VerificationProvider>, u32), BoxError> {
    let Some(config) = config else {
        tracing::warn!("no [verification] section configured, phone verification is disabled");
        return Ok((Arc::new(Unconfigured), 0));
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    let provider = HttpVerificationProvider::new(
        client,
        HttpProviderConfig {
            base_url: config.base_url.clone(),
            service_sid: config.service_sid.clone(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
        },
    );
    Ok((Arc::new(provider), config.max_retries))
}

async fn parse_database(config: &settings::Database) -> Result<sea_orm::DatabaseConnection, BoxError> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
