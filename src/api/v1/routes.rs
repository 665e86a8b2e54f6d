/*
 * Responsibility
 * - v1 URL layout
 * - /me (the form session) and /notifications
 */
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
};

use crate::middleware::http::BODY_LIMIT_BYTES;
use crate::state::AppState;

use crate::api::v1::handlers::me::{
    change_field, get_me, notifications, put_image, reload, select_city, select_district,
    select_ward, submit,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/reload", post(reload))
        .route("/me/fields", patch(change_field))
        .route("/me/region/city", put(select_city))
        .route("/me/region/district", put(select_district))
        .route("/me/region/ward", put(select_ward))
        .route(
            "/me/image",
            put(put_image).layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES)),
        )
        .route("/me/submit", post(submit))
        .route("/notifications", get(notifications))
}
