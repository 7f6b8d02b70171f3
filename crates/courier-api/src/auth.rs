use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use courier_auth::{AuthConfig, CredentialStore, PasswordHasher, SessionIssuer};
use courier_db::Database;
use courier_types::api::{LoginRequest, RegisterRequest, TokenResponse};
use tracing::info;

use crate::blocking;
use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub credentials: CredentialStore,
    pub sessions: SessionIssuer,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, config: &AuthConfig) -> anyhow::Result<AppState> {
        let hasher = PasswordHasher::new(config)
            .map_err(|e| anyhow::anyhow!("invalid password cost: {}", e))?;

        Ok(Arc::new(Self {
            credentials: CredentialStore::new(db.clone(), hasher),
            sessions: SessionIssuer::new(config),
            db,
        }))
    }
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    let username_len = req.username.chars().count();
    if !(3..=32).contains(&username_len) {
        return Err(ApiError::BadRequest(
            "username must be 3 to 32 characters".into(),
        ));
    }
    if req.password.chars().count() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    let token = blocking(move || {
        let user = state.credentials.register(&req)?;
        let token = state.sessions.issue(&user.username)?;
        state.credentials.touch_login(&user.username)?;
        Ok(token)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let token = blocking(move || {
        if !state.credentials.authenticate(&req.username, &req.password)? {
            return Ok(None);
        }
        let token = state.sessions.issue(&req.username)?;
        state.credentials.touch_login(&req.username)?;
        info!("User {} logged in", req.username);
        Ok(Some(token))
    })
    .await?
    .ok_or(ApiError::BadCredentials)?;

    Ok(Json(TokenResponse { token }))
}
