use axum::response::IntoResponse;
use serde_json::json;

use crate::response::ok;

pub async fn health() -> impl IntoResponse {
    ok(json!({
        "service": "blivalley",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
