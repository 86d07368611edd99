use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_api::{
    config::Env,
    server::{self, ServerState},
};
use yatube_db::{DbClient, DbError, MemoryStore, Store};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("DATABASE_URL must be set unless IN_MEMORY is enabled")]
    MissingDatabaseUrl,
    #[error("Error connecting to the database: {0}")]
    Connect(sqlx::Error),
    #[error("Error preparing the database: {0}")]
    Database(#[from] DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "yatube_api=debug,yatube_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn open_store(env: &Env) -> Result<Arc<dyn Store>, InitError> {
    if env.in_memory {
        info!("Serving from an in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let database_url = env
        .database_url
        .as_deref()
        .ok_or(InitError::MissingDatabaseUrl)?;
    let pool = PgPoolOptions::new()
        .max_connections(env.database_max_connections)
        .connect(database_url)
        .await
        .map_err(InitError::Connect)?;

    let client = DbClient::new(pool);
    client.migrate().await?;

    Ok(Arc::new(client))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        debug!(error = %err, "Could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let store = open_store(&env).await?;
    let app = server::app(ServerState { store });

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
