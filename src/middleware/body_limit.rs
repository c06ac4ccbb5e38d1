// Request body size limit
//
// axum's built-in 2 MB default is far too small for base64 documents, so
// the limit comes from configuration instead.

use axum::{extract::DefaultBodyLimit, Router};

pub fn apply_body_limit(router: Router, max_bytes: usize) -> Router {
    router.layer(DefaultBodyLimit::max(max_bytes))
}
