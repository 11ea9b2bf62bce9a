use std::{env, fs, net::SocketAddr, path::PathBuf, process::exit};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tally_rs::{
    AppState, StorageLayout, build_router, cleanup_sessions_periodically, graceful_shutdown,
};

/// The REST API server for tally_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the master database and the per-user databases.
    #[arg(long)]
    data_dir: PathBuf,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The canonical name of the time zone that daily, weekly and monthly
    /// statistics are computed in, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// How many hours a session lasts after log in.
    #[arg(long, default_value_t = 24)]
    session_hours: i64,

    /// How often, in minutes, expired sessions are removed.
    #[arg(long, default_value_t = 60)]
    cleanup_interval_minutes: u64,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let secret = env::var("SECRET").expect("The environment variable 'SECRET' must be set");

    let layout = StorageLayout::new(&args.data_dir);
    fs::create_dir_all(layout.partition_dir()).expect("Could not create the data directory");

    let connection =
        Connection::open(layout.master_db_path()).expect("Could not open the master database");

    let state = match AppState::new(connection, &secret, &args.timezone, layout.partitions()) {
        Ok(state) => state.with_session_duration(Duration::hours(args.session_hours)),
        Err(error) => {
            tracing::error!("Could not start the server: {error}");
            exit(1);
        }
    };

    tokio::spawn(cleanup_sessions_periodically(
        state.db_connection.clone(),
        std::time::Duration::from_secs(args.cleanup_interval_minutes.max(1) * 60),
    ));

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    tracing::info!(
        "HTTP server listening on {} with data in {}",
        addr,
        layout.data_dir().display()
    );
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .expect("The server stopped unexpectedly");
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but errors are
        // already logged where they are turned into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
