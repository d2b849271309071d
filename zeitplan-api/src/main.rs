use serde::Deserialize;
use server::ServerState;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};
use thiserror::Error;
use time::{UtcOffset, error::ComponentRange};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeitplan_common::snowflake::{NODE_ID_LENGTH, NodeId};
use zeitplan_store::{
    FileStorage, MemoryStorage, PostStore, ScheduledCounter, StoreConfig,
    store::DEFAULT_STORAGE_KEY,
};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("UTC_OFFSET_MINUTES is not a valid offset: {0}")]
    UtcOffset(#[from] ComponentRange),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_owned()
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    /// In-memory storage if unset.
    storage_dir: Option<PathBuf>,
    #[serde(default = "default_storage_key")]
    storage_key: String,
    #[serde(default)]
    utc_offset_minutes: i16,
    #[serde(default)]
    scheduled_counter: ScheduledCounter,
    node_id: Option<NodeId>,
}

impl Env {
    fn store_config(&self) -> Result<StoreConfig, InitError> {
        let zone = UtcOffset::from_whole_seconds(i32::from(self.utc_offset_minutes) * 60)?;
        let node_id = self.node_id.unwrap_or_else(|| {
            NodeId::new(rand::random_range(0..1_u16 << NODE_ID_LENGTH)).unwrap_or_default()
        });

        Ok(StoreConfig {
            key: self.storage_key.clone(),
            zone,
            scheduled_counter: self.scheduled_counter,
            node_id,
        })
    }
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "zeitplan_api=debug,\
                zeitplan_store=debug,\
                tower_http=debug,axum::rejection=trace"
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

fn open_store(env: &Env) -> Result<PostStore, InitError> {
    let config = env.store_config()?;
    info!(
        key = %config.key,
        zone = %config.zone,
        node_id = config.node_id.get(),
        scheduled_counter = ?config.scheduled_counter,
        "Opening post store"
    );

    let store = match &env.storage_dir {
        Some(dir) => PostStore::open(FileStorage::new(dir), config),
        None => {
            debug!("No STORAGE_DIR set, keeping posts in memory");
            PostStore::open(MemoryStorage::new(), config)
        }
    };
    Ok(store)
}

async fn wait_for_shutdown(shutdown: CancellationToken) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "Could not listen for shutdown signal");
    }
    info!("Shutting down");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let state = ServerState {
        store: Arc::new(Mutex::new(open_store(&env)?)),
    };

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes().layer(tracing_layer).with_state(state);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown(shutdown.clone()));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
