use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gymrats_api::{config::Config, db, middleware::auth::JwtSecret, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let state = AppState {
        db: pool,
        config: config.clone(),
    };

    // CORS: the configured app origin plus localhost for development.
    let base_url = config.app_base_url.clone();
    let cors_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        let o = match origin.to_str() {
            Ok(s) => s,
            Err(_) => return false,
        };
        o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1") || o == base_url
    });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(config.jwt_secret.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/me", get(routes::auth::me))
        // Members
        .route("/users/me/goals", put(routes::users::update_goals))
        .route("/users/clients", get(routes::users::list_clients))
        .route("/users/{id}/assign-trainer", post(routes::users::assign_trainer))
        // Workouts
        .route("/workouts/plan", post(routes::workouts::save_plan))
        .route("/workouts/week/{client_id}", get(routes::workouts::get_week))
        .route("/workouts/today", get(routes::workouts::get_today))
        .route("/workouts/complete", post(routes::workouts::mark_completed))
        // Nutrition
        .route("/nutrition/plan", post(routes::nutrition::save_day_plan))
        .route("/nutrition/today", get(routes::nutrition::get_today))
        .route("/nutrition/consume", post(routes::nutrition::mark_consumed))
        // Memberships
        .route("/memberships/plans", get(routes::memberships::list_plans))
        .route("/memberships/purchase", post(routes::memberships::purchase))
        // Trainer verification
        .route("/trainers/apply", post(routes::trainers::apply))
        .route("/trainers/applications", get(routes::trainers::list_applications))
        .route(
            "/trainers/applications/{id}/review",
            post(routes::trainers::review_application),
        )
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("gymrats API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
