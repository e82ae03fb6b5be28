//! # Engagement Gate Service
//!
//! Thin HTTP shell over the `gating` crate: one controller pair per acting
//! user, the matching backend behind a reqwest client, session and durable
//! key-value state in redis.
//!
//!
//!
//! # Routes
//!
//! - `POST /engage/chat/open`: run the chat gate; answers "not gated" or
//!   "wait N seconds, show this item"
//! - `POST /engage/chat/finish`: wait elapsed (or premium skip), returns the
//!   chat route to proceed to
//! - `POST /engage/chat/see`: user tapped the insert; returns where it leads
//!   and arms the one-shot suppression when that is the upsell page
//! - `POST /engage/like`: submit a like, maybe get an insert back
//! - `GET /engage/unread/{uid}`: unread badge total for a user
//! - `POST /engage/session/reset`: logout hook, drops the user's controllers
//!
//!
//!
//! # Notes
//!
//! - Navigation decisions come back in the response body as `navigate`
//!   directives; this service never routes anything itself
//! - `RUST_LOG` drives the log filter, see `config.rs` for the rest of the
//!   environment

use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod client;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod storage;

use routes::{
    finish_gate_handler, like_handler, open_gate_handler, reset_session_handler, see_ad_handler,
    unread_handler,
};
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/engage/chat/open", post(open_gate_handler))
        .route("/engage/chat/finish", post(finish_gate_handler))
        .route("/engage/chat/see", post(see_ad_handler))
        .route("/engage/like", post(like_handler))
        .route("/engage/unread/{uid}", get(unread_handler))
        .route("/engage/session/reset", post(reset_session_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
