use axum::{
    RequestExt,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use courier_types::error::Error;

use crate::auth::AppState;
use crate::error::ApiError;

/// The username a request was authenticated as.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Extract and verify the bearer token from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = req
        .extract_parts::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| Error::Unauthenticated)?;

    let username = state.sessions.verify(bearer.token())?;

    req.extensions_mut().insert(CurrentUser(username));
    Ok(next.run(req).await)
}
