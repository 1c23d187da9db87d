use std::sync::Arc;

use actix_easy_multipart::MultipartFormConfig;
use colored::Colorize;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::api;
use crate::infrastructure::config::{build_config, UploadServerConfig};
use crate::infrastructure::telemetry::initialize_telemetry;
use crate::infrastructure::ServiceProvider;

pub fn run() {
    match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(async_run()),
        Err(e) => eprintln!("{}: {}", "Cannot build tokio runtime".red(), e),
    }
}

pub async fn async_run() {
    let config: UploadServerConfig = match build_config().and_then(|x| Ok(x.try_deserialize()?)) {
        Ok(x) => x,
        Err(e) => {
            return eprintln!("{}: {}", "Cannot build config".red(), e);
        }
    };
    if let Err(e) = initialize_telemetry(config.telemetry()) {
        return eprintln!("{}: {}", "Cannot build logger".red(), e);
    };
    let service_provider = match ServiceProvider::build(config).await {
        Ok(x) => Arc::new(x),
        Err(e) => {
            return eprintln!("{}: {}", "Cannot build Service Provider".red(), e);
        }
    };
    let handles = service_provider
        .background_services()
        .into_iter()
        .map(|x| tokio::spawn(async move { x.run().await }))
        .collect::<Vec<JoinHandle<()>>>();
    tokio::select! {
        _ = initialize_web_host(service_provider) => {
            for handle in handles {
                handle.abort()
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Stopping services (ctrl-c handling).");
            for handle in handles {
                handle.abort()
            }
        }
    }
}

pub async fn initialize_web_host(sp: Arc<ServiceProvider>) {
    let host = sp.config.host().clone();
    let upload_service = sp.upload_service.clone();
    let server = actix_web::HttpServer::new(move || {
        let cors = actix_cors::Cors::default()
            .allow_any_origin()
            .allow_any_header()
            .allow_any_method()
            .max_age(86400);

        actix_web::App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(cors)
            .app_data(MultipartFormConfig::default().total_limit(*host.max_chunk_bytes()))
            .app_data(actix_web::web::Data::from(upload_service.clone()))
            .configure(api::configure)
    })
    .bind((sp.config.host().bind_address().to_owned(), *sp.config.host().bind_port()));
    let server = match server {
        Ok(x) => x,
        Err(e) => {
            return error!("Cannot bind web server: {}", e);
        }
    };
    info!(
        "Listening on {}:{}, storing uploads under {}.",
        sp.config.host().bind_address(),
        sp.config.host().bind_port(),
        sp.config.storage().root()
    );
    match server.disable_signals().run().await {
        Ok(_) => info!("Web server stopped successfully."),
        Err(e) => error!("Web server into error: {}", e),
    }
}
