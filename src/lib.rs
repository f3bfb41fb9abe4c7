pub mod assistant;
pub mod auth;
pub mod catalog;
pub mod database;
pub mod engine;
pub mod error;
pub mod http_server;
pub mod infer;
pub mod ingest;
pub mod models;
pub mod schema;
pub mod storage;
pub mod tabulate;

pub use engine::NovaEngine;
pub use error::NovaError;
pub use http_server::HttpServer;
pub use ingest::IngestionCoordinator;
