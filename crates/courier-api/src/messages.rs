use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use courier_auth::policy::{Action, authorize};
use courier_db::models::NewMessage;
use courier_types::api::{
    CreatedMessageResponse, MessageDetailResponse, ReadReceiptResponse, SendMessageRequest,
};
use tracing::info;

use crate::auth::AppState;
use crate::blocking;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

/// Any signed-in user may message any existing user.
pub async fn send_message(
    State(state): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&me, Action::SendMessage)?;

    let message = blocking(move || {
        state.db.insert_message(&NewMessage {
            from_username: &me,
            to_username: &req.to_username,
            body: &req.body,
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(CreatedMessageResponse { message })))
}

pub async fn get_message(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let message = blocking(move || {
        let message = state.db.get_message(id)?;
        authorize(&me, Action::ViewMessage(&message))?;
        Ok(message)
    })
    .await?;

    Ok(Json(MessageDetailResponse { message }))
}

/// Only the recipient may mark a message read. The check runs before the
/// update, so a refused request leaves the message untouched.
pub async fn mark_read(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = blocking(move || {
        let message = state.db.get_message(id)?;
        authorize(&me, Action::MarkRead(&message))?;
        let receipt = state.db.mark_read(id)?;
        info!("Message {} read by {}", id, me);
        Ok(receipt)
    })
    .await?;

    Ok(Json(ReadReceiptResponse { message: receipt }))
}
