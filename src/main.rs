use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod assistant;
mod auth;
mod catalog;
mod database;
mod engine;
mod error;
mod http_server;
mod infer;
mod ingest;
mod models;
mod schema;
mod storage;
mod tabulate;

use assistant::HttpCompletionGateway;
use auth::AuthServiceResolver;
use database::PgMetadataStore;
use engine::NovaEngine;
use http_server::HttpServer;
use storage::ObjectStoreContent;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nova_data_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting NOVA Data Service v0.1.0");

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .expect("Invalid PORT");

    let storage_url =
        std::env::var("STORAGE_URL").expect("STORAGE_URL environment variable is required");

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL environment variable is required");

    let auth_url = std::env::var("AUTH_URL").expect("AUTH_URL environment variable is required");
    let auth_anon_key =
        std::env::var("AUTH_ANON_KEY").expect("AUTH_ANON_KEY environment variable is required");

    let gateway_url = std::env::var("AI_GATEWAY_URL")
        .unwrap_or_else(|_| "https://ai.gateway.lovable.dev/v1/chat/completions".to_string());
    let gateway_api_key = std::env::var("AI_GATEWAY_API_KEY")
        .expect("AI_GATEWAY_API_KEY environment variable is required");
    let model =
        std::env::var("AI_MODEL").unwrap_or_else(|_| "google/gemini-2.5-flash".to_string());

    info!("Configuration loaded:");
    info!("  Port: {}", port);
    info!("  Storage URL: {}", storage_url);
    info!("  Database URL: {}", mask_credentials(&database_url));
    info!("  Auth URL: {}", auth_url);
    info!("  AI Gateway: {} ({})", gateway_url, model);

    let content = Arc::new(ObjectStoreContent::from_url(&storage_url)?);
    let metadata = Arc::new(PgMetadataStore::new(&database_url).await?);
    let resolver = Arc::new(AuthServiceResolver::new(auth_url, auth_anon_key));
    let gateway = Arc::new(HttpCompletionGateway::new(
        gateway_url,
        gateway_api_key,
        model,
    ));

    let engine = Arc::new(NovaEngine::new(content, metadata, resolver, gateway));
    info!("NOVA engine initialized successfully");

    let server = HttpServer::new(engine);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.start(addr).await {
            error!("HTTP server error: {}", e);
        }
    });

    info!("NOVA Data Service started successfully");
    info!("HTTP server listening on {}", addr);

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal, gracefully shutting down...");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    server_handle.abort();

    info!("NOVA Data Service shutdown complete");
    Ok(())
}

fn mask_credentials(database_url: &str) -> String {
    match (database_url.find("://"), database_url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end + 3 => {
            format!(
                "{}***{}",
                &database_url[..scheme_end + 3],
                &database_url[at..]
            )
        }
        _ => database_url.to_string(),
    }
}
