//! API endpoint handlers.
//!
//! Body decoding is explicit so the error mapping matches the contract:
//! wrong content type, malformed JSON and empty credential fields are all
//! 400, while domain failures map through the error taxonomy.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::{error, info};

use crate::ledger::StoreError;
use crate::processor::{Credentials, ProcessError};

use super::middleware::AuthUser;
use super::state::AppState;
use super::types::{OrderView, WithdrawRequest, WithdrawalView};

pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Some(credentials) = decode_credentials(&headers, &body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    info!("new user register request detected");

    match state.processor.register(&credentials).await {
        Ok(token) => authorized(token),
        Err(err) => {
            error!(error = %err, "register failed");
            match err {
                ProcessError::Store(StoreError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
                ProcessError::Store(StoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
            .into_response()
        }
    }
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Some(credentials) = decode_credentials(&headers, &body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    info!("new login request detected");

    match state.processor.login(&credentials).await {
        Ok(token) => authorized(token),
        Err(err) => {
            error!(error = %err, "login failed");
            match err {
                ProcessError::Store(StoreError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
                ProcessError::Unauthorized => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
            .into_response()
        }
    }
}

pub async fn upload_order(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !content_type_is(&headers, "text/plain") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let order_number = body.trim();
    info!(order = order_number, "new order request detected");

    match state.processor.add_new_order(&user_id, order_number).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(err) => {
            error!(error = %err, "order upload failed");
            match err {
                ProcessError::IllegalOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ProcessError::Store(StoreError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
                // the same user re-uploading is not an error
                ProcessError::Store(StoreError::AlreadyExists(_)) => StatusCode::OK,
                ProcessError::Store(StoreError::AlreadyExistsForOtherUser(_)) => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
            .into_response()
        }
    }
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Response {
    match state.processor.get_orders(&user_id).await {
        Ok(orders) if orders.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(orders) => Json(orders.iter().map(OrderView::from).collect::<Vec<_>>()).into_response(),
        Err(err) => {
            error!(error = %err, "listing orders failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn balance(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Response {
    match state.processor.get_balance(&user_id).await {
        Ok(balance) => Json(balance).into_response(),
        Err(err) => {
            error!(error = %err, "balance query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if !content_type_is(&headers, "application/json") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let Ok(request) = serde_json::from_str::<WithdrawRequest>(&body) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    info!(order = %request.order, "new withdrawal request detected");

    match state
        .processor
        .add_new_withdrawal(&user_id, &request.order, request.sum)
        .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            error!(error = %err, "withdrawal failed");
            match err {
                ProcessError::Store(StoreError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
                ProcessError::IllegalOrderNumber(_)
                | ProcessError::Store(StoreError::AlreadyExists(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                ProcessError::Store(StoreError::InsufficientFunds) => {
                    StatusCode::PAYMENT_REQUIRED
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
            .into_response()
        }
    }
}

pub async fn list_withdrawals(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Response {
    match state.processor.get_withdrawals(&user_id).await {
        Ok(withdrawals) if withdrawals.is_empty() => StatusCode::NO_CONTENT.into_response(),
        Ok(withdrawals) => Json(
            withdrawals
                .iter()
                .map(WithdrawalView::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(err) => {
            error!(error = %err, "listing withdrawals failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn content_type_is(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with(expected))
        .unwrap_or(false)
}

fn decode_credentials(headers: &HeaderMap, body: &str) -> Option<Credentials> {
    if !content_type_is(headers, "application/json") {
        return None;
    }
    let credentials: Credentials = serde_json::from_str(body).ok()?;
    if credentials.login.is_empty() || credentials.password.is_empty() {
        return None;
    }
    Some(credentials)
}

fn authorized(token: String) -> Response {
    (
        StatusCode::OK,
        [(header::AUTHORIZATION, format!("Bearer {token}"))],
        (),
    )
        .into_response()
}
