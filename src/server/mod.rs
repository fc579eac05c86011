//! HTTP server for the order desk
//!
//! `ServerBuilder` wires the stores, the optional extractor and the CORS
//! policy into an axum `Router`.

pub mod builder;
pub mod handlers;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use host::AppState;
pub use router::build_routes;
