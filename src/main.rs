//! docgate server binary.
//!
//! Connects to the document store before accepting any traffic and exits
//! with status 1 if that fails.

use clap::Parser;
use docgate::{collections, Config, Connection, InMemoryStore, MongoStore, Server};
use tracing_subscriber::{fmt, EnvFilter};

/// HTTP gateway over named MongoDB collections
#[derive(Parser, Debug)]
#[command(name = "docgate")]
#[command(version)]
struct Args {
    /// dotenv-style file with connection settings
    #[arg(short, long, default_value = "conf/db.env")]
    config: String,

    /// Listen address (host:port), overrides `server.listen`
    #[arg(short, long)]
    listen: Option<String>,

    /// Serve from an in-memory store instead of MongoDB
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,docgate=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    tracing::info!("docgate v{}", docgate::VERSION);

    let connection = Connection::absent();
    let listen_addr;
    let policy;

    if args.memory {
        tracing::warn!("serving from an in-memory store; data is lost on exit");
        let config = Config::default();
        listen_addr = args.listen.unwrap_or(config.listen_addr);
        policy = config.not_found;
        establish(&connection, InMemoryStore::new());
    } else {
        let config = match Config::from_env_file(&args.config) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("failed to load configuration: {e}");
                std::process::exit(1);
            }
        };
        tracing::debug!(config = ?config, "configuration loaded");

        match MongoStore::connect(&config.db).await {
            Ok(store) => establish(&connection, store),
            Err(e) => {
                tracing::error!("failed to connect to the document store: {e}");
                std::process::exit(1);
            }
        }
        listen_addr = args.listen.unwrap_or(config.listen_addr);
        policy = config.not_found;
    }

    let app = collections::routes(connection, policy);
    if let Err(e) = Server::bind(listen_addr).serve(app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}

fn establish(connection: &Connection, store: impl docgate::DocumentStore) {
    if let Err(e) = connection.establish(store) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
