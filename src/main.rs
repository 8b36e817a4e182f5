mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use crate::db::db::DBClient;
use crate::service::{
    analysis_worker::{AnalysisWorker, ANALYSIS_QUEUE_KEY},
    gemini_service::GeminiClient,
    solar_api_service::AerialViewClient,
    storage_service::CloudinaryClient,
};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub storage: Arc<CloudinaryClient>,
    pub analysis_worker: Arc<AnalysisWorker>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client = Arc::new(db_client);

        // Gemini calls on large images can be slow; give upstreams a
        // generous but bounded window.
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        let gemini = Arc::new(GeminiClient::new(
            http_client.clone(),
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        ));
        let aerial = Arc::new(AerialViewClient::new(
            http_client.clone(),
            config.google_maps_api_key.clone(),
        ));
        let storage = Arc::new(CloudinaryClient::new(
            http_client,
            config.cloudinary_cloud_name.clone(),
            config.cloudinary_upload_preset.clone(),
        ));

        let analysis_worker = Arc::new(AnalysisWorker::new(
            db_client.clone(),
            gemini,
            aerial,
            ANALYSIS_QUEUE_KEY,
        ));

        Self {
            env: config,
            db_client,
            storage,
            analysis_worker,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let pool = match PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            println!("✅ Connection to the database is successful!");
            pool
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let db_client = if let Some(ref redis_url) = config.redis_url {
        match DBClient::with_redis(pool.clone(), redis_url).await {
            Ok(client) => {
                if client.is_redis_available() {
                    println!("✅ Redis queue is ACTIVE - analysis jobs run in the background");
                } else {
                    println!("⚠️  Redis connection failed - analysis jobs run in-process");
                }
                client
            }
            Err(e) => {
                println!("⚠️  Redis initialization error: {} - analysis jobs run in-process", e);
                DBClient::new(pool)
            }
        }
    } else {
        println!("ℹ️  Redis not configured - analysis jobs run in-process (set REDIS_URL to enable the queue)");
        DBClient::new(pool)
    };

    let allowed_origins: Vec<HeaderValue> = [
        config.app_url.as_str(),
        "http://localhost:5173",
        "http://localhost:8000",
    ]
    .iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    let app = create_router(app_state.clone()).layer(cors);

    println!("🚀 Server is running on http://localhost:{}", config.port);
    println!("📊 Queue status: {}", app_state.db_client.queue_status());

    // Queue consumer; only drains jobs when Redis is configured
    let worker = app_state.analysis_worker.clone();
    tokio::spawn(async move {
        worker
            .run_forever(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await;
    });

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            println!("🔥 Failed to bind to port {}: {:?}", config.port, err);
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        println!("🔥 Server error: {:?}", err);
        std::process::exit(1);
    }
}
