// CORS configuration: any origin, method and header may call the service

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn apply_cors(router: Router) -> Router {
    router.layer(cors_layer())
}
