use crate::core::{Block, Chain};
use crate::error::BlockchainError;
use crate::network::{connect_peer, into_frames, serve_peer, HubHandle, PeerSettings};
use axum::body::Bytes;
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Clone)]
pub struct ApiState {
    pub hub: HubHandle,
    pub peer_settings: PeerSettings,
}

/// Error body `{"error": "..."}` with a matching status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unprocessable(message: impl Into<String>) -> ApiError {
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }
}

impl From<BlockchainError> for ApiError {
    fn from(err: BlockchainError) -> Self {
        let status = match err {
            BlockchainError::HubClosed => StatusCode::SERVICE_UNAVAILABLE,
            BlockchainError::Network(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// `{"data": "..."}`, or the payload as a bare JSON string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AddBlockRequest {
    Wrapped {
        #[serde(alias = "Data")]
        data: String,
    },
    Bare(String),
}

impl AddBlockRequest {
    fn into_data(self) -> String {
        match self {
            AddBlockRequest::Wrapped { data } | AddBlockRequest::Bare(data) => data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConnectPeerRequest {
    peer: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectPeerResponse {
    peer: String,
}

pub async fn handle_chain(State(state): State<ApiState>) -> Result<Json<Chain>, ApiError> {
    Ok(Json(state.hub.chain().await?))
}

pub async fn handle_add_block(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<Block>, ApiError> {
    let request: AddBlockRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::unprocessable(format!("Malformed block data: {e}")))?;
    let block = state.hub.submit(request.into_data()).await?;
    Ok(Json(block))
}

pub async fn handle_peers(State(state): State<ApiState>) -> Result<Json<Vec<String>>, ApiError> {
    let peers = state.hub.peers().await?;
    Ok(Json(peers.iter().map(SocketAddr::to_string).collect()))
}

pub async fn handle_add_peer(
    State(state): State<ApiState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    info!("Peer connection request from {addr}");
    let settings = state.peer_settings.clone();
    ws.max_message_size(settings.max_message_size)
        .on_upgrade(move |socket: WebSocket| async move {
            let (sink, stream) = into_frames(socket);
            if let Err(e) = serve_peer(sink, stream, addr, state.hub, settings).await {
                warn!("Peer link from {addr} ended with error: {e}");
            }
        })
}

pub async fn handle_connect_peer(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<Json<ConnectPeerResponse>, ApiError> {
    let request: ConnectPeerRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::unprocessable(format!("Malformed peer request: {e}")))?;
    let addr = connect_peer(&request.peer, state.hub.clone(), state.peer_settings.clone()).await?;
    Ok(Json(ConnectPeerResponse {
        peer: addr.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::{router, ApiState};
    use crate::core::{validate_chain, Block, GENESIS_BLOCK};
    use crate::network::{Hub, PeerSettings};
    use crate::testnet::{build_chain, FixedClock, TestPeer};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(chain: crate::core::Chain) -> (Router, crate::network::HubHandle) {
        let (hub, _task) = Hub::spawn(chain, Arc::new(FixedClock::new(1_700_000_000)));
        let state = ApiState {
            hub: hub.clone(),
            peer_settings: PeerSettings::default(),
        };
        (router(state), hub)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_chain() {
        let (app, _hub) = app_with(build_chain(3));
        let response = app
            .oneshot(Request::builder().uri("/chain").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let blocks: Vec<Block> = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(validate_chain(&blocks));
    }

    #[tokio::test]
    async fn test_add_block_mints_on_tip() {
        let (app, hub) = app_with(crate::core::Chain::new());
        let response = app
            .oneshot(post("/addBlock", r#"{"data":"hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let block: Block = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(block.get_index(), 1);
        assert_eq!(block.get_data(), "hello");
        assert_eq!(block.get_previous_hash(), GENESIS_BLOCK.get_hash());
        assert_eq!(hub.chain().await.unwrap().latest().unwrap(), &block);
    }

    #[tokio::test]
    async fn test_add_block_accepts_bare_string() {
        let (app, _hub) = app_with(crate::core::Chain::new());
        let response = app.oneshot(post("/addBlock", r#""bare""#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"], "bare");
    }

    #[tokio::test]
    async fn test_malformed_body_is_unprocessable() {
        let (app, hub) = app_with(crate::core::Chain::new());
        let response = app
            .oneshot(post("/addBlock", r#"{"data": 12"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_json(response).await["error"].is_string());
        assert_eq!(hub.chain().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_peers() {
        let (app, hub) = app_with(crate::core::Chain::new());
        let peer = TestPeer::register(&hub, 8, 9100).await;
        let response = app
            .oneshot(Request::builder().uri("/peers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!([peer.addr.to_string()])
        );
    }

    #[tokio::test]
    async fn test_connect_peer_returns_remote_address() {
        let (remote_hub, _remote_task) = Hub::spawn(
            crate::core::Chain::new(),
            Arc::new(FixedClock::new(1_700_000_000)),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let remote_addr = listener.local_addr().unwrap();
        tokio::spawn(crate::api::serve_listener(
            ApiState {
                hub: remote_hub,
                peer_settings: PeerSettings::default(),
            },
            listener,
        ));

        let (app, hub) = app_with(crate::core::Chain::new());
        let body = format!(r#"{{"peer":"ws://{remote_addr}/addPeer"}}"#);
        let response = app.oneshot(post("/connectPeer", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "peer": remote_addr.to_string() })
        );

        // the dialed link registers from its own task
        let mut peers = Vec::new();
        for _ in 0..50 {
            peers = hub.peers().await.unwrap();
            if !peers.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(peers, vec![remote_addr]);
    }

    #[tokio::test]
    async fn test_connect_peer_rejects_malformed_body() {
        let (app, _hub) = app_with(crate::core::Chain::new());
        let response = app.oneshot(post("/connectPeer", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_connect_peer_unreachable_is_bad_gateway() {
        let (app, _hub) = app_with(crate::core::Chain::new());
        // nothing listens on port 1
        let response = app
            .oneshot(post("/connectPeer", r#"{"peer":"ws://127.0.0.1:1/addPeer"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let (app, _hub) = app_with(crate::core::Chain::new());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/chain")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_stopped_hub_is_unavailable() {
        let (hub, handle) = Hub::new(crate::core::Chain::new(), Arc::new(FixedClock::new(1)));
        drop(hub);
        let app = router(ApiState {
            hub: handle,
            peer_settings: PeerSettings::default(),
        });
        let response = app
            .oneshot(Request::builder().uri("/chain").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
