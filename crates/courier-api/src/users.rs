use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use courier_auth::policy::{Action, authorize};
use courier_types::api::{
    ReceivedMessagesResponse, SentMessagesResponse, UserListResponse, UserResponse,
};

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&me, Action::ListUsers)?;

    let users = blocking(move || state.credentials.list()).await?;
    Ok(Json(UserListResponse { users }))
}

/// Profile detail. Users may only look at themselves.
pub async fn get_user(
    State(state): State<AppState>,
    WithRejection(Path(username), _): WithRejection<Path<String>, ApiError>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&me, Action::ActAs(&username))?;

    let user = blocking(move || state.credentials.get(&username)).await?;
    Ok(Json(UserResponse { user }))
}

pub async fn messages_to(
    State(state): State<AppState>,
    WithRejection(Path(username), _): WithRejection<Path<String>, ApiError>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&me, Action::ActAs(&username))?;

    let messages = blocking(move || state.db.messages_to(&username)).await?;
    Ok(Json(ReceivedMessagesResponse { messages }))
}

pub async fn messages_from(
    State(state): State<AppState>,
    WithRejection(Path(username), _): WithRejection<Path<String>, ApiError>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&me, Action::ActAs(&username))?;

    let messages = blocking(move || state.db.messages_from(&username)).await?;
    Ok(Json(SentMessagesResponse { messages }))
}
