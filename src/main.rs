mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, Method,
};
use config::Config;
use db::db::DBClient;
use db::store::LedgerStore;
use dotenv::dotenv;
use routes::create_router;
use service::{
    background_jobs::{start_membership_sweep_job, start_tweet_sweep_job},
    connection_service::ConnectionService,
    points_engine::PointsEngine,
    reconciliation::ReconciliationService,
    referral_service::ReferralService,
    task_service::TaskService,
    verify::{DiscordApi, TwitterOembed},
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

pub struct AppState {
    pub env: Config,
    pub store: Arc<dyn LedgerStore>,
    pub points_engine: Arc<PointsEngine>,
    pub connections: Arc<ConnectionService>,
    pub tasks: Arc<TaskService>,
    pub referrals: Arc<ReferralService>,
    pub reconciliation: Arc<ReconciliationService>,
}

impl AppState {
    pub fn new(store: Arc<dyn LedgerStore>, env: Config) -> Self {
        let membership: Arc<dyn service::verify::MembershipVerifier> =
            Arc::new(DiscordApi::new(env.discord.bot_token.clone()));
        let tweets: Arc<dyn service::verify::TweetVerifier> = Arc::new(TwitterOembed::new());

        let points_engine = Arc::new(PointsEngine::new(store.clone()));
        let referrals = Arc::new(ReferralService::new(
            store.clone(),
            points_engine.clone(),
            env.points,
        ));
        let connections = Arc::new(ConnectionService::new(
            store.clone(),
            points_engine.clone(),
            referrals.clone(),
            membership.clone(),
            env.points,
            env.discord.clone(),
        ));
        let tasks = Arc::new(TaskService::new(
            store.clone(),
            points_engine.clone(),
            referrals.clone(),
            env.points,
        ));
        let reconciliation = Arc::new(ReconciliationService::new(
            store.clone(),
            points_engine.clone(),
            tasks.clone(),
            membership,
            tweets,
            env.points,
            env.reconcile,
            env.discord.clone(),
        ));

        AppState {
            env,
            store,
            points_engine,
            connections,
            tasks,
            referrals,
            reconciliation,
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
            println!("✅Connection to the database is successful!");
            pool
        }
        Err(err) => {
            println!("🔥 Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_headers([
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static("x-wallet-address"),
            HeaderName::from_static("x-admin-key"),
        ])
        .allow_methods([Method::GET, Method::POST]);

    let store: Arc<dyn LedgerStore> = Arc::new(DBClient::new(pool));
    let app_state = Arc::new(AppState::new(store, config.clone()));

    tokio::spawn(start_membership_sweep_job(app_state.clone()));
    tokio::spawn(start_tweet_sweep_job(app_state.clone()));

    let app = create_router(app_state).layer(cors);

    println!(
        "{}",
        format!("🚀 Server is running on http://localhost:{}", config.port)
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port))
        .await
        .unwrap();

    axum::serve(listener, app).await.unwrap();
}
