//! HTTP interface: read the chain, submit data, list and add peers.

pub mod handlers;

use crate::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// Largest request body accepted by the write endpoints
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chain", get(handlers::handle_chain))
        .route("/addBlock", post(handlers::handle_add_block))
        .route("/peers", get(handlers::handle_peers))
        .route("/addPeer", get(handlers::handle_add_peer))
        .route("/connectPeer", post(handlers::handle_connect_peer))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: ApiState, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_listener(state, listener).await
}

/// Serve on an already bound listener
pub async fn serve_listener(state: ApiState, listener: TcpListener) -> Result<()> {
    info!("HTTP and peer endpoints listening on {}", listener.local_addr()?);
    let app = router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
