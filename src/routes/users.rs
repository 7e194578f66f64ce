//! Current-user route read by the presentation layer.

use axum::response::Json;

use super::auth::AuthUser;
use crate::services::users::User;

/// `GET /api/user` — return the session's user, or 401 via [`AuthUser`].
pub async fn current_user(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}
