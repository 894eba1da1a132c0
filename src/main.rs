// src/main.rs
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use log::info;

use zimage_api::config::AppConfig;
use zimage_api::{AppState, build_cors, configure_routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting Z-Image API server...");

    let config = AppConfig::from_env()?;
    info!("Environment: {}", config.environment);
    info!("CORS Origins: {}", config.cors_origins.join(", "));

    let app_state = AppState::from_config(&config)?;
    info!("Providers: {}", app_state.registry.ids().join(", "));

    let (host, port) = config.bind_address();
    info!("Starting HTTP server on {}:{}", host, port);
    info!("  GET  /api/         - Health check");
    info!("  POST /api/generate - Image generation");
    info!("  POST /api/upscale  - Image upscaling");

    HttpServer::new(move || {
        let static_dir = config.static_dir.clone();
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .wrap(build_cors(&config))
            .configure(configure_routes)
            .configure(move |cfg| {
                if let Some(dir) = static_dir {
                    cfg.service(Files::new("/", dir).index_file("index.html"));
                }
            })
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
