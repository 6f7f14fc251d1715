use ledger::{Store, UserAccount};
use migration::MigratorTrait;
use shell::{CloudClient, Extractor, Shell};

mod repl;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "mizan={level},server={level},shell={level},ledger={level}",
            level = settings.level
        ))
        .init();

    if let Some(server_settings) = settings.server.clone() {
        tokio::spawn(async move {
            tracing::info!("Found server settings...");
            let db = match connect_database(&server_settings).await {
                Ok(db) => db,
                Err(err) => {
                    tracing::error!("failed to initialize database: {err}");
                    return;
                }
            };
            let bind = server_settings.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server_settings.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(db, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    let store = Store::new(&settings.data_dir);
    let cloud = CloudClient::new(&settings.cloud_url);
    let extractor = Extractor::new(
        settings.extractor_api_key.clone(),
        &settings.extractor_model,
    );
    let default_admin =
        UserAccount::default_admin(&settings.admin_username, &settings.admin_password);

    let app_shell = Shell::new(store, cloud, extractor, default_admin)?;
    repl::run(app_shell).await?;

    Ok(())
}

async fn connect_database(
    config: &settings::ServerConfig,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = if config.database == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite:{}?mode=rwc", config.database)
    };

    let database = sea_orm::Database::connect(url).await?;
    migration::Migrator::up(&database, None).await?;
    Ok(database)
}
