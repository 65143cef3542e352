//! HTTP surface: routing and middleware wiring.

pub mod handlers;
pub mod middleware;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use self::state::AppState;

/// Builds the application router.
///
/// The login group is open; every other route requires a valid bearer token.
pub fn router(state: Arc<AppState>) -> Router {
    let login_group = Router::new()
        .route("/api/user/register", post(handlers::register))
        .route("/api/user/login", post(handlers::login));

    let main_group = Router::new()
        .route(
            "/api/user/orders",
            post(handlers::upload_order).get(handlers::list_orders),
        )
        .route("/api/user/balance", get(handlers::balance))
        .route("/api/user/balance/withdraw", post(handlers::withdraw))
        .route(
            "/api/user/balance/withdrawals",
            get(handlers::list_withdrawals),
        )
        .route_layer(from_fn_with_state(
            Arc::clone(&state),
            middleware::require_token,
        ));

    Router::new()
        .merge(login_group)
        .merge(main_group)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
