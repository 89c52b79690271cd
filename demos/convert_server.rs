//! REST API server example
//!
//! Runs the conversion service as a standalone HTTP server.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:5000/swagger-ui
//! - Convert an image: curl -F file=@photo.jpg http://localhost:5000/api/v1/convert
//! - Download the result: curl -OJ http://localhost:5000/api/v1/download/1
//! - List recent conversions: curl http://localhost:5000/api/v1/recent

use avif_batch::api::spawn_api_server;
use avif_batch::{ApiConfig, Config, FileRegistry, LocalConversionService, run_with_shutdown};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configure the API
    let api_config = ApiConfig {
        bind_address: "127.0.0.1:5000".parse()?,
        cors_enabled: true,
        cors_origins: vec!["*".to_string()],
        swagger_ui: true,
    };

    let config = Arc::new(Config {
        api: api_config,
        ..Default::default()
    });

    // The registry is constructed once here and injected; artifacts live in
    // memory for the lifetime of the process.
    let registry = FileRegistry::new();
    let service = Arc::new(LocalConversionService::new(&config, registry));

    println!("avif-batch server listening on http://{}", config.api.bind_address);
    println!("Swagger UI: http://{}/swagger-ui", config.api.bind_address);

    let server = spawn_api_server(service, config);
    run_with_shutdown(server).await?;

    Ok(())
}
