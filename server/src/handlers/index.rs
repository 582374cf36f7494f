use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;

use crate::utils::hal::{links, Links};
use crate::utils::response::hal;

#[derive(Serialize)]
struct IndexResource {
    #[serde(rename = "_links")]
    links: Links,
}

/// Entry point of the API; lists the top-level collections.
pub async fn index() -> Response {
    let body = IndexResource {
        links: Links::new().with("events", links::events()),
    };
    hal(StatusCode::OK, &body)
}
