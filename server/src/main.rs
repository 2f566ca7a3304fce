// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use hotel_server::config::Config;
use hotel_server::state::AppState;
use hotel_server::{database, rollover, routes};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:?}", e);
            std::process::exit(1);
        }
    };

    let db_pool = match database::establish_connection_pool(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("Database connection was made successfully.");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect with the database: {:?}", e);
            std::process::exit(1);
        }
    };

    if let (Some(username), Some(password)) = (&config.bootstrap_username, &config.bootstrap_password) {
        if let Err(e) = database::bootstrap_director(&db_pool, username, password).await {
            tracing::error!("Failed to create the bootstrap account: {:?}", e);
            std::process::exit(1);
        }
    }

    rollover::spawn_rollover_loop(db_pool.clone(), config.rollover_interval_secs);

    let addr = config.bind_addr;
    let app = routes::create_router(AppState::new(db_pool, config));

    tracing::info!("The server listens on http://{}", addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {:?}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {:?}", e);
    }
}
