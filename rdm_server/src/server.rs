//! Server — C8. Accepts connections; one [`crate::session`] per connection.
//! A single `/ws` route, matching spec.md §6's "one endpoint path".

use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use rdm_core::job::deps::Deps;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    pub deps: Deps,
    pub allow_client_reconnect: bool,
    pub shutdown: CancellationToken,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| async move {
        let should_shut_down = crate::session::run(socket, state.deps.clone(), state.allow_client_reconnect).await;
        if should_shut_down {
            log::info!("client disconnected and reconnection is disabled, shutting down");
            state.shutdown.cancel();
        }
    })
}
