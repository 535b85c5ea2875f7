use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Success envelope: `{"ok": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    ok: bool,
    data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope { ok: true, data })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// `{"ok": true, "data": null}` for deletes.
pub fn done() -> Json<Envelope<Option<()>>> {
    ok(None)
}
