//! HTTP API: axum router over the store, assembler, reconciler, and
//! generation pipeline. All presentation shaping for the visualization
//! front-end lives here and nowhere else.

mod http;
pub mod types;

pub use http::HttpServer;
