//! File server hit counting

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::{atomic::Ordering, Arc};

use crate::AppState;

/// Count every request that reaches the static file server
pub async fn count_file_server_hits(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    state.file_server_hits.fetch_add(1, Ordering::Relaxed);
    next.run(request).await
}
