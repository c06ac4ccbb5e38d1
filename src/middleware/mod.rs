// Middleware for CORS, body limits and request tracing

pub mod body_limit;
pub mod cors;
pub mod trace;

pub use body_limit::*;
pub use cors::*;
pub use trace::*;
