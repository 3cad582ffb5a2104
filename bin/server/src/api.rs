//! Protected JSON API handlers.

use axum::Json;
use serde::Serialize;

use crate::auth::CurrentUser;

#[derive(Debug, Serialize)]
pub struct Me {
    user_id: String,
}

/// Returns the authenticated caller's identity.
pub async fn me(CurrentUser(user_id): CurrentUser) -> Json<Me> {
    Json(Me {
        user_id: user_id.to_string(),
    })
}
