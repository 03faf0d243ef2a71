use monsterhub_common::password::{HashCost, InvalidHashCostError, PasswordHasher};
use monsterhub_db::{
    DbError,
    auth::AuthService,
    posts::PostStore,
    store::{KeyValueStore, MemoryStore, SqliteStore},
};
use serde::Deserialize;
use server::ServerState;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Error configuring password hashing: {0}")]
    HashCost(#[from] InvalidHashCostError),
    #[error("Error opening store: {0}")]
    Store(DbError),
    #[error("Error restoring session: {0}")]
    Restore(DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    database_url: Option<String>,
    argon2_memory_kib: Option<u32>,
    argon2_iterations: Option<u32>,
    argon2_parallelism: Option<u32>,
}

impl Env {
    fn hash_cost(&self) -> HashCost {
        let default = HashCost::default();

        HashCost {
            memory_kib: self.argon2_memory_kib.unwrap_or(default.memory_kib),
            iterations: self.argon2_iterations.unwrap_or(default.iterations),
            parallelism: self.argon2_parallelism.unwrap_or(default.parallelism),
        }
    }
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "monsterhub_api=debug,\
                monsterhub_db=debug,\
                monsterhub_common=debug,\
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

async fn open_store(env: &Env) -> Result<Arc<dyn KeyValueStore>, InitError> {
    match &env.database_url {
        Some(url) => {
            let store = SqliteStore::connect(url).await.map_err(InitError::Store)?;
            info!(%url, "Using SQLite store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL is not set, nothing will survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();

    let cancel = token.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Could not listen for ctrl-c");
            return;
        }
        info!("Shutting down");
        cancel.cancel();
    });

    token
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let store = open_store(&env).await?;
    let hasher = PasswordHasher::new(env.hash_cost())?;

    let auth = Arc::new(AuthService::new(Arc::clone(&store), hasher));
    auth.initialize().await.map_err(InitError::Restore)?;

    let state = ServerState {
        auth,
        posts: Arc::new(PostStore::new(store)),
    };

    let tracing_layer = TraceLayer::new_for_http();
    let app = server::routes().with_state(state).layer(tracing_layer);

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on_ctrl_c().cancelled_owned())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
